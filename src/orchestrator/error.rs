//! Workflow error classification.

use serde_json::{json, Value};
use thiserror::Error;

use super::poll::StatusOutcome;
use crate::gateway::GatewayError;

/// Errors surfaced by the caller-facing workflows.
///
/// Only [`SessionInit`](WorkflowError::SessionInit) is fatal: without a
/// session no operation can proceed, so it aborts the request. Every other
/// variant is rendered into a tagged error object via
/// [`error_body`](WorkflowError::error_body) so remote callers always receive
/// a well-formed response.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Failed to open SQL Gateway session: {0}")]
    SessionInit(String),

    #[error("Statement submission failed: {0}")]
    Submit(#[source] GatewayError),

    #[error("Gateway call failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Statement submission returned no usable operation handle")]
    MissingOperationHandle,

    #[error("Operation did not finish successfully: {}", .outcome.tag())]
    OperationNotFinished {
        outcome: StatusOutcome,
        /// Last raw status payload observed by the poll.
        status_payload: Value,
        /// Result page 0, when it could be fetched for diagnostic context.
        first_page: Option<Value>,
    },

    #[error("Job identifier not present in results")]
    JobIdUnavailable,

    #[error("Job {0} is not tracked")]
    UnknownJob(String),
}

impl WorkflowError {
    /// Whether this error aborts the whole request instead of being
    /// reported as a structured error object.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WorkflowError::SessionInit(_))
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            WorkflowError::SessionInit(_) => "SESSION_INIT_FAILED",
            WorkflowError::Submit(_) => "SUBMIT_FAILED",
            WorkflowError::Gateway(_) => "GATEWAY_ERROR",
            WorkflowError::MissingOperationHandle => "NO_OPERATION_HANDLE",
            WorkflowError::OperationNotFinished { outcome, .. } => match outcome {
                StatusOutcome::Finished => "OPERATION_FINISHED",
                StatusOutcome::Error => "OPERATION_ERROR",
                StatusOutcome::Canceled => "OPERATION_CANCELED",
                StatusOutcome::Closed => "OPERATION_CLOSED",
                StatusOutcome::Timeout => "OPERATION_TIMEOUT",
            },
            WorkflowError::JobIdUnavailable => "JOB_ID_NOT_AVAILABLE",
            WorkflowError::UnknownJob(_) => "UNKNOWN_JOB",
        }
    }

    /// Render the structured error object returned through the tool surface.
    pub fn error_body(&self) -> Value {
        let mut body = json!({
            "errorType": self.error_type(),
            "message": self.to_string(),
        });
        if let WorkflowError::OperationNotFinished {
            status_payload,
            first_page,
            ..
        } = self
        {
            body["statusPayload"] = status_payload.clone();
            if let Some(page) = first_page {
                body["firstPage"] = page.clone();
            }
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_session_init_is_fatal() {
        assert!(WorkflowError::SessionInit("no handle".into()).is_fatal());
        assert!(!WorkflowError::MissingOperationHandle.is_fatal());
        assert!(!WorkflowError::UnknownJob("j".into()).is_fatal());
        assert!(!WorkflowError::Gateway(GatewayError::Timeout).is_fatal());
    }

    #[test]
    fn test_operation_error_tags() {
        let err = WorkflowError::OperationNotFinished {
            outcome: StatusOutcome::Timeout,
            status_payload: json!({"status": "RUNNING"}),
            first_page: None,
        };
        assert_eq!(err.error_type(), "OPERATION_TIMEOUT");

        let err = WorkflowError::OperationNotFinished {
            outcome: StatusOutcome::Canceled,
            status_payload: json!({}),
            first_page: None,
        };
        assert_eq!(err.error_type(), "OPERATION_CANCELED");
    }

    #[test]
    fn test_error_body_includes_diagnostics() {
        let err = WorkflowError::OperationNotFinished {
            outcome: StatusOutcome::Error,
            status_payload: json!({"status": "ERROR"}),
            first_page: Some(json!({"resultType": "PAYLOAD"})),
        };
        let body = err.error_body();
        assert_eq!(body["errorType"], "OPERATION_ERROR");
        assert_eq!(body["statusPayload"], json!({"status": "ERROR"}));
        assert_eq!(body["firstPage"], json!({"resultType": "PAYLOAD"}));
    }

    #[test]
    fn test_error_body_minimal() {
        let body = WorkflowError::UnknownJob("job-9".into()).error_body();
        assert_eq!(body["errorType"], "UNKNOWN_JOB");
        assert!(body.get("statusPayload").is_none());
    }
}
