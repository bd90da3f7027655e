//! Resource implementations.

pub mod cluster;

use super::registry::McpRegistry;

/// Register all resources with the registry
pub fn register_all_resources(registry: &mut McpRegistry) {
    cluster::register_resources(registry);
}
