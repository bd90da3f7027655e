//! Tool implementations.

pub mod jobs;
pub mod query;
pub mod session;

use serde::Serialize;

use super::protocol::{McpError, ToolsCallResult};
use super::registry::{McpRegistry, ToolResult};
use crate::orchestrator::WorkflowError;

/// Register all tools with the registry
pub fn register_all_tools(registry: &mut McpRegistry) {
    session::register_tools(registry);
    query::register_tools(registry);
    jobs::register_tools(registry);
}

/// Map a workflow result into a tool response.
///
/// Only fatal errors (session initialization) abort the request; every other
/// failure is rendered as its tagged error object, so a remote caller always
/// receives a well-formed response distinguishing success from failure.
pub(crate) fn respond<T: Serialize>(result: Result<T, WorkflowError>) -> ToolResult {
    match result {
        Ok(value) => {
            ToolsCallResult::json(&value).map_err(|e| McpError::InternalError(e.to_string()))
        }
        Err(e) if e.is_fatal() => Err(McpError::InternalError(e.to_string())),
        Err(e) => ToolsCallResult::json(&e.error_body())
            .map_err(|e| McpError::InternalError(e.to_string())),
    }
}
