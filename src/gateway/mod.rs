//! Flink SQL Gateway REST API boundary.
//!
//! The gateway is an external collaborator with a stateful, poll-based API:
//! statements are submitted under a session, produce an operation handle, and
//! must be polled to a terminal status before results can be paged out by
//! token. This module owns the raw HTTP calls and the normalization of the
//! gateway's loosely-typed response payloads; all orchestration policy lives
//! in [`crate::orchestrator`].

mod client;
mod responses;

pub use client::{GatewayApi, GatewayError, SqlGatewayClient};
pub use responses::{
    operation_handle, operation_status, session_handle, ResultKind, ResultPage,
};

#[cfg(feature = "mock")]
pub use client::MockGatewayApi;
