//! Query Tools
//!
//! Tools that submit SQL statements and page out their results.

use serde::Deserialize;
use serde_json::Value;

use super::respond;
use crate::mcp::context::ToolContext;
use crate::mcp::protocol::McpError;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolCategory, ToolResult};

/// Register query tools with the registry
pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(run_query_collect_and_stop_tool());
    registry.register_tool(run_query_stream_start_tool());
}

// ============================================================================
// run_query_collect_and_stop
// ============================================================================

#[derive(Debug, Deserialize)]
struct CollectParams {
    query: String,
    #[serde(default = "default_max_rows")]
    max_rows: usize,
    #[serde(default = "default_max_seconds")]
    max_seconds: f64,
}

fn default_max_rows() -> usize {
    5
}

fn default_max_seconds() -> f64 {
    15.0
}

fn run_query_collect_and_stop_tool() -> RegisteredTool {
    ToolBuilder::new("run_query_collect_and_stop")
        .description(
            "Run a short-lived query, fetch up to max_rows within max_seconds, then stop the \
             backing job if one is present",
        )
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The SQL query to execute"
                },
                "max_rows": {
                    "type": "integer",
                    "description": "Stop collecting once this many rows were fetched",
                    "default": 5
                },
                "max_seconds": {
                    "type": "number",
                    "description": "Overall wall-clock limit for polling and paging",
                    "default": 15.0
                }
            },
            "required": ["query"]
        }))
        .category(ToolCategory::Execute)
        .build(collect_handler)
}

async fn collect_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: CollectParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    respond(
        ctx.orchestrator
            .run_query_collect_and_stop(&params.query, params.max_rows, params.max_seconds)
            .await,
    )
}

// ============================================================================
// run_query_stream_start
// ============================================================================

#[derive(Debug, Deserialize)]
struct StreamStartParams {
    query: String,
}

fn run_query_stream_start_tool() -> RegisteredTool {
    ToolBuilder::new("run_query_stream_start")
        .description(
            "Start a streaming query and return its cluster jobID; leaves the job running and \
             tracked for later fetches",
        )
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The streaming SQL query to start"
                }
            },
            "required": ["query"]
        }))
        .category(ToolCategory::Execute)
        .build(stream_start_handler)
}

async fn stream_start_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: StreamStartParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    respond(ctx.orchestrator.run_query_stream_start(&params.query).await)
}
