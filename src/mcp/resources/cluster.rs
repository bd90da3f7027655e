//! Cluster Resources
//!
//! Read-only view of cluster information reported by the SQL Gateway.

use crate::mcp::context::ToolContext;
use crate::mcp::protocol::{McpError, ResourceContent};
use crate::mcp::registry::{McpRegistry, RegisteredResource, ResourceBuilder, ResourceResult};

/// Register cluster resources with the registry
pub fn register_resources(registry: &mut McpRegistry) {
    registry.register_resource(cluster_info_resource());
}

// ============================================================================
// info://cluster
// ============================================================================

fn cluster_info_resource() -> RegisteredResource {
    ResourceBuilder::new("info://cluster", "Cluster Information")
        .description("Cluster and product information reported by the SQL Gateway")
        .mime_type("application/json")
        .build(cluster_info_handler)
}

async fn cluster_info_handler(ctx: ToolContext, uri: String) -> ResourceResult {
    let info = ctx
        .orchestrator
        .cluster_info()
        .await
        .map_err(|e| McpError::InternalError(e.to_string()))?;

    Ok(vec![ResourceContent::Text {
        uri,
        mime_type: Some("application/json".to_string()),
        text: serde_json::to_string_pretty(&info).unwrap_or_default(),
    }])
}
