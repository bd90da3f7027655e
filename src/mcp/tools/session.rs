//! Session Tools
//!
//! Tools for inspecting and configuring the managed gateway session.

use serde::Deserialize;
use serde_json::Value;

use super::respond;
use crate::mcp::context::ToolContext;
use crate::mcp::protocol::McpError;
use crate::mcp::registry::{McpRegistry, RegisteredTool, ToolBuilder, ToolCategory, ToolResult};

/// Register session tools with the registry
pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(get_config_tool());
    registry.register_tool(configure_session_tool());
}

// ============================================================================
// get_config
// ============================================================================

fn get_config_tool() -> RegisteredTool {
    ToolBuilder::new("get_config")
        .description("Return current session configuration (properties) for the managed session")
        .category(ToolCategory::Read)
        .build(get_config_handler)
}

async fn get_config_handler(ctx: ToolContext, _params: Value) -> ToolResult {
    respond(ctx.orchestrator.get_config().await)
}

// ============================================================================
// configure_session
// ============================================================================

#[derive(Debug, Deserialize)]
struct ConfigureSessionParams {
    statement: String,
}

fn configure_session_tool() -> RegisteredTool {
    ToolBuilder::new("configure_session")
        .description(
            "Apply a single session-scoped DDL/config statement (CREATE/USE/SET/RESET/etc.)",
        )
        .input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "statement": {
                    "type": "string",
                    "description": "The DDL or configuration statement to apply"
                }
            },
            "required": ["statement"]
        }))
        .category(ToolCategory::Execute)
        .build(configure_session_handler)
}

async fn configure_session_handler(ctx: ToolContext, params: Value) -> ToolResult {
    let params: ConfigureSessionParams =
        serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    respond(ctx.orchestrator.configure_session(&params.statement).await)
}
