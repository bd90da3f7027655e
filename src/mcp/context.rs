//! Execution context handed to tool and resource handlers.

use std::sync::Arc;
use std::time::Instant;

use crate::orchestrator::QueryOrchestrator;

/// Context provided to tool and resource handlers during execution
#[derive(Clone)]
pub struct ToolContext {
    /// The session/operation orchestration layer over the SQL Gateway.
    pub orchestrator: Arc<QueryOrchestrator>,

    /// Server version info
    pub server_version: String,

    /// Server start time (for uptime calculation)
    pub start_time: Instant,
}
