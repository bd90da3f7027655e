//! MCP server for the Flink SQL Gateway.
//!
//! Mediates between MCP tool invocations and the gateway's asynchronous,
//! poll-based REST API: statements are submitted under a lazily opened
//! session, polled to a terminal status, and paged out by token, with
//! long-running streaming jobs tracked in a process-wide registry.

pub mod config;
pub mod gateway;
pub mod mcp;
pub mod orchestrator;
