//! Tool-exposure surface: the MCP protocol served over stdio.
//!
//! [`protocol`] holds the JSON-RPC message types, [`registry`] the tool and
//! resource registrations, [`server`] the stdio serve loop. Tool handlers are
//! thin: parameter parsing and result mapping only; all gateway behavior
//! lives in [`crate::orchestrator`].

pub mod context;
pub mod protocol;
pub mod registry;
pub mod resources;
pub mod server;
pub mod tools;

pub use context::ToolContext;
pub use registry::McpRegistry;
pub use resources::register_all_resources;
pub use server::McpServer;
pub use tools::register_all_tools;
