//! Fixed-interval operation status polling.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::debug;

use crate::gateway::{operation_status, GatewayApi, GatewayError};

/// Terminal outcome of a status poll.
///
/// The four gateway terminal states plus the synthetic `Timeout` produced
/// when the deadline elapses before any of them is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    Finished,
    Error,
    Canceled,
    Closed,
    Timeout,
}

impl StatusOutcome {
    /// Parse a terminal status string (already uppercased by the
    /// normalization layer). Non-terminal statuses return `None`.
    fn from_terminal(status: &str) -> Option<Self> {
        match status {
            "FINISHED" => Some(StatusOutcome::Finished),
            "ERROR" => Some(StatusOutcome::Error),
            "CANCELED" => Some(StatusOutcome::Canceled),
            "CLOSED" => Some(StatusOutcome::Closed),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            StatusOutcome::Finished => "FINISHED",
            StatusOutcome::Error => "ERROR",
            StatusOutcome::Canceled => "CANCELED",
            StatusOutcome::Closed => "CLOSED",
            StatusOutcome::Timeout => "TIMEOUT",
        }
    }
}

/// Retry policy for a status poll: a fixed interval between checks and an
/// overall timeout. Shared by the operation poll, the stop-operation poll
/// and the job-termination confirmation loop.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Poll an operation's status until a terminal state or the policy deadline.
///
/// The deadline is absolute, computed once on entry, so retries do not drift
/// it. Returns the outcome together with the last raw status payload (or an
/// empty object if the deadline elapsed before any status was fetched).
pub async fn poll_operation(
    gateway: &dyn GatewayApi,
    session: &str,
    operation: &str,
    policy: PollPolicy,
) -> Result<(StatusOutcome, Value), GatewayError> {
    let deadline = Instant::now() + policy.timeout;
    let mut last_payload: Option<Value> = None;

    while Instant::now() < deadline {
        let payload = gateway.operation_status(session, operation).await?;
        if let Some(outcome) = operation_status(&payload)
            .as_deref()
            .and_then(StatusOutcome::from_terminal)
        {
            return Ok((outcome, payload));
        }
        last_payload = Some(payload);
        tokio::time::sleep(policy.interval).await;
    }

    debug!(
        operation = %operation,
        timeout_ms = policy.timeout.as_millis() as u64,
        "Operation status poll timed out"
    );
    Ok((
        StatusOutcome::Timeout,
        last_payload.unwrap_or_else(|| json!({})),
    ))
}
