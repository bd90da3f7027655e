//! Workflow result payloads.
//!
//! Field names match the wire shape callers already consume (`jobID`,
//! `rowsCollected`, ...), so these serialize directly into tool responses.

use serde::Serialize;
use serde_json::Value;

/// Result of a bounded run-and-collect query.
#[derive(Debug, Serialize)]
pub struct CollectOutcome {
    #[serde(rename = "jobID")]
    pub job_id: Option<String>,
    /// Raw result pages as fetched from the gateway, in token order.
    pub pages: Vec<Value>,
    #[serde(rename = "rowsCollected")]
    pub rows_collected: usize,
    #[serde(rename = "nextToken")]
    pub next_token: u64,
    #[serde(rename = "stopResult", skip_serializing_if = "Option::is_none")]
    pub stop_result: Option<Value>,
}

/// Result of starting a streaming query; the job keeps running.
#[derive(Debug, Serialize)]
pub struct StreamStartOutcome {
    #[serde(rename = "jobID")]
    pub job_id: String,
}

/// One page fetched through a tracked job's shared cursor.
#[derive(Debug, Serialize)]
pub struct JobFetchOutcome {
    pub page: Value,
    #[serde(rename = "nextToken")]
    pub next_token: u64,
    #[serde(rename = "isEnd")]
    pub is_end: bool,
}

/// Result of a job cancellation attempt.
#[derive(Debug, Serialize)]
pub struct CancelOutcome {
    #[serde(rename = "jobID")]
    pub job_id: String,
    pub status: String,
    /// Whether the job was positively observed to have left the running
    /// state before the confirmation deadline.
    #[serde(rename = "jobGone")]
    pub job_gone: bool,
    /// Last status string observed for the job, if any.
    #[serde(rename = "jobStatus")]
    pub job_status: Option<String>,
}
