//! Job Tools
//!
//! Tools operating on tracked streaming jobs.

use serde::Deserialize;
use serde_json::Value;

use super::respond;
use crate::mcp::context::ToolContext;
use crate::mcp::protocol::McpError;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolCategory, ToolResult};

/// Register job tools with the registry
pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(fetch_result_by_jobid_tool());
    registry.register_tool(cancel_job_tool());
}

// ============================================================================
// fetch_result_by_jobid
// ============================================================================

#[derive(Debug, Deserialize)]
struct FetchResultParams {
    job_id: String,
}

fn fetch_result_by_jobid_tool() -> RegisteredTool {
    ToolBuilder::new("fetch_result_by_jobid")
        .description("Fetch a single result page for a tracked job using its shared cursor")
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "job_id": {
                    "type": "string",
                    "description": "Cluster job identifier returned by run_query_stream_start"
                }
            },
            "required": ["job_id"]
        }))
        .category(ToolCategory::Read)
        .build(fetch_result_handler)
}

async fn fetch_result_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: FetchResultParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    respond(ctx.orchestrator.fetch_result_by_jobid(&params.job_id).await)
}

// ============================================================================
// cancel_job
// ============================================================================

#[derive(Debug, Deserialize)]
struct CancelJobParams {
    job_id: String,
}

fn cancel_job_tool() -> RegisteredTool {
    ToolBuilder::new("cancel_job")
        .description(
            "Stop a tracked job, confirm it left the running state and remove its tracking state",
        )
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "job_id": {
                    "type": "string",
                    "description": "Cluster job identifier to cancel"
                }
            },
            "required": ["job_id"]
        }))
        .category(ToolCategory::Execute)
        .build(cancel_job_handler)
}

async fn cancel_job_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: CancelJobParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    respond(ctx.orchestrator.cancel_job(&params.job_id).await)
}
