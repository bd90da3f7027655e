//! Session/operation orchestration over the SQL Gateway.
//!
//! The gateway's API is stateful and eventually consistent: a submitted
//! statement produces an operation handle that must be polled to a terminal
//! status before results can be paged out by monotonically increasing tokens.
//! Streaming statements additionally expose a cluster job identifier that
//! outlives the originating operation. This module owns that state machine:
//! lazy single-flight session acquisition, status polling, the paging
//! policies of the caller-facing workflows, the job-stream registry and job
//! cancellation with termination confirmation.

mod error;
mod models;
mod poll;
mod registry;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::WorkflowError;
pub use models::{CancelOutcome, CollectOutcome, JobFetchOutcome, StreamStartOutcome};
pub use poll::{poll_operation, PollPolicy, StatusOutcome};
pub use registry::{JobCursor, JobStreamRegistry};

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::gateway::{operation_handle, session_handle, GatewayApi, ResultKind, ResultPage};

/// Interval between operation status checks.
const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Delay before re-fetching a NOT_READY result page.
const NOT_READY_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Status poll timeout for a freshly submitted streaming statement.
const STREAM_START_POLL_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum token-0 fetches while waiting for a streaming job identifier.
const STREAM_START_FETCH_ATTEMPTS: u32 = 20;

/// Status poll timeout for a STOP JOB operation.
const STOP_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Status poll timeout for a single job-status probe.
const PROBE_POLL_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between job-termination probes.
const CONFIRM_PROBE_INTERVAL: Duration = Duration::from_secs(1);

/// Overall deadline for confirming a job has left the running state.
const CONFIRM_DEADLINE: Duration = Duration::from_secs(30);

/// Orchestration context shared by all caller-facing operations.
///
/// Owns the single gateway session (opened lazily, never refreshed or
/// closed) and the process-wide job-stream registry. Constructed once at
/// startup and shared via `Arc`.
pub struct QueryOrchestrator {
    gateway: Arc<dyn GatewayApi>,
    session: OnceCell<String>,
    jobs: JobStreamRegistry,
}

impl QueryOrchestrator {
    pub fn new(gateway: Arc<dyn GatewayApi>) -> Self {
        Self {
            gateway,
            session: OnceCell::new(),
            jobs: JobStreamRegistry::new(),
        }
    }

    /// Return the managed session handle, opening the session on first use.
    ///
    /// Initialization is single-flight: concurrent first calls issue exactly
    /// one open-session request. Failure to open, or a response carrying no
    /// usable handle, is fatal; no invalidation or refresh path exists.
    pub async fn ensure_session(&self) -> Result<&str, WorkflowError> {
        let handle = self
            .session
            .get_or_try_init(|| async {
                let response = self
                    .gateway
                    .open_session()
                    .await
                    .map_err(|e| WorkflowError::SessionInit(e.to_string()))?;
                match session_handle(&response) {
                    Some(handle) => {
                        info!(session = %handle, "Opened SQL Gateway session");
                        Ok(handle)
                    }
                    None => Err(WorkflowError::SessionInit(
                        "open-session response carried no session handle".to_string(),
                    )),
                }
            })
            .await?;
        Ok(handle.as_str())
    }

    /// Cluster/product information from the gateway.
    pub async fn cluster_info(&self) -> Result<Value, WorkflowError> {
        Ok(self.gateway.get_info().await?)
    }

    /// Properties of the managed session.
    pub async fn get_config(&self) -> Result<Value, WorkflowError> {
        let session = self.ensure_session().await?;
        Ok(self.gateway.get_session(session).await?)
    }

    /// Apply a session-scoped DDL/config statement (CREATE/USE/SET/...).
    pub async fn configure_session(&self, statement: &str) -> Result<Value, WorkflowError> {
        let session = self.ensure_session().await?;
        Ok(self.gateway.configure_session(session, statement).await?)
    }

    /// Run a short-lived query, collect up to `max_rows` rows within
    /// `max_seconds`, then stop the backing job (if one was observed) and
    /// close the operation.
    ///
    /// The row cap is permissive at the boundary: a fetch that lands exactly
    /// on the cap still proceeds to the next page so a trailing EOS marker is
    /// observed and reported through `next_token`.
    pub async fn run_query_collect_and_stop(
        &self,
        query: &str,
        max_rows: usize,
        max_seconds: f64,
    ) -> Result<CollectOutcome, WorkflowError> {
        let session = self.ensure_session().await?;
        let deadline = Instant::now() + Duration::from_secs_f64(max_seconds.max(0.0));

        let operation = self.submit(session, query).await?;

        let remaining = deadline.saturating_duration_since(Instant::now());
        let (outcome, status_payload) = poll_operation(
            self.gateway.as_ref(),
            session,
            &operation,
            PollPolicy::new(STATUS_POLL_INTERVAL, remaining),
        )
        .await?;
        if outcome != StatusOutcome::Finished {
            return Err(self
                .operation_failure(session, &operation, outcome, status_payload)
                .await);
        }

        let mut pages: Vec<Value> = Vec::new();
        let mut rows_collected = 0usize;
        let mut token = 0u64;
        let mut job_id: Option<String> = None;

        while rows_collected <= max_rows && Instant::now() < deadline {
            let page = ResultPage::from_value(
                self.gateway.fetch_result(session, &operation, token).await?,
            );
            if page.kind == ResultKind::NotReady {
                tokio::time::sleep(NOT_READY_RETRY_DELAY).await;
                continue;
            }
            if job_id.is_none() {
                job_id = page.job_id.clone();
            }
            rows_collected += page.row_count();
            let is_eos = page.is_eos();
            pages.push(page.raw);
            token += 1;
            if is_eos {
                break;
            }
        }

        let stop_result = match &job_id {
            Some(jid) => self.stop_job_best_effort(session, jid).await,
            None => None,
        };

        if let Err(e) = self.gateway.close_operation(session, &operation).await {
            debug!(operation = %operation, error = %e, "Ignoring operation close failure");
        }

        Ok(CollectOutcome {
            job_id,
            pages,
            rows_collected,
            next_token: token,
            stop_result,
        })
    }

    /// Start a streaming query, learn its cluster job identifier from result
    /// page 0 and register the job for later per-job fetches. The job is
    /// left running.
    pub async fn run_query_stream_start(
        &self,
        query: &str,
    ) -> Result<StreamStartOutcome, WorkflowError> {
        let session = self.ensure_session().await?;
        let operation = self.submit(session, query).await?;

        let (outcome, status_payload) = poll_operation(
            self.gateway.as_ref(),
            session,
            &operation,
            PollPolicy::new(STATUS_POLL_INTERVAL, STREAM_START_POLL_TIMEOUT),
        )
        .await?;
        if outcome != StatusOutcome::Finished {
            return Err(self
                .operation_failure(session, &operation, outcome, status_payload)
                .await);
        }

        for attempt in 0..STREAM_START_FETCH_ATTEMPTS {
            let page = ResultPage::from_value(
                self.gateway.fetch_result(session, &operation, 0).await?,
            );
            if let Some(job_id) = page.job_id {
                self.jobs.register(&job_id, session, &operation);
                info!(job_id = %job_id, "Streaming job registered");
                return Ok(StreamStartOutcome { job_id });
            }
            if page.kind != ResultKind::NotReady {
                break;
            }
            if attempt + 1 < STREAM_START_FETCH_ATTEMPTS {
                tokio::time::sleep(NOT_READY_RETRY_DELAY).await;
            }
        }
        Err(WorkflowError::JobIdUnavailable)
    }

    /// Fetch one result page for a tracked job through its shared cursor.
    ///
    /// The per-job lock is held across the gateway round trip, so concurrent
    /// fetches for the same job are serialized and the cursor never skips or
    /// repeats a token. The cursor advances past the fetched token whatever
    /// the page kind.
    pub async fn fetch_result_by_jobid(
        &self,
        job_id: &str,
    ) -> Result<JobFetchOutcome, WorkflowError> {
        let cursor = self
            .jobs
            .lookup(job_id)
            .ok_or_else(|| WorkflowError::UnknownJob(job_id.to_string()))?;
        let mut cursor = cursor.lock().await;

        let token = cursor.next_token;
        let page = ResultPage::from_value(
            self.gateway
                .fetch_result(&cursor.session, &cursor.operation, token)
                .await?,
        );
        cursor.advance_to(token + 1);

        Ok(JobFetchOutcome {
            next_token: cursor.next_token,
            is_end: page.is_eos(),
            page: page.raw,
        })
    }

    /// Cancel a tracked job and confirm it has left the running state.
    ///
    /// The stop submission, the stop-operation poll and the termination
    /// confirmation are each best-effort and sequenced: a stop operation that
    /// errors or times out does not prevent the confirmation probes. The job
    /// is removed from the registry unconditionally, even when termination
    /// could not be confirmed; an unconfirmed job is thereafter untrackable
    /// through this server and must be re-submitted to resume paging.
    pub async fn cancel_job(&self, job_id: &str) -> Result<CancelOutcome, WorkflowError> {
        if self.jobs.lookup(job_id).is_none() {
            return Err(WorkflowError::UnknownJob(job_id.to_string()));
        }
        let session = self.ensure_session().await?;

        if self.stop_job_best_effort(session, job_id).await.is_none() {
            warn!(job_id, "Stop submission failed; still checking job termination");
        }

        let (job_gone, job_status) = self.confirm_job_termination(session, job_id).await;

        self.jobs.remove(job_id);
        info!(job_id, job_gone, "Job removed from stream registry");

        Ok(CancelOutcome {
            job_id: job_id.to_string(),
            status: "STOP_SUBMITTED".to_string(),
            job_gone,
            job_status,
        })
    }

    /// Submit a statement and extract its operation handle.
    async fn submit(&self, session: &str, statement: &str) -> Result<String, WorkflowError> {
        let response = self
            .gateway
            .execute_statement(session, statement)
            .await
            .map_err(WorkflowError::Submit)?;
        operation_handle(&response).ok_or(WorkflowError::MissingOperationHandle)
    }

    /// Build the non-finished terminal error, attaching result page 0 as
    /// diagnostic context when it can still be fetched.
    async fn operation_failure(
        &self,
        session: &str,
        operation: &str,
        outcome: StatusOutcome,
        status_payload: Value,
    ) -> WorkflowError {
        let first_page = self.gateway.fetch_result(session, operation, 0).await.ok();
        WorkflowError::OperationNotFinished {
            outcome,
            status_payload,
            first_page,
        }
    }

    /// Submit `STOP JOB` for `job_id` and wait for the stop operation.
    ///
    /// Returns `Some({"ok": true})` once the stop statement was submitted;
    /// the outcome of the stop-operation poll is observed and logged only.
    /// A submission failure yields `None`.
    async fn stop_job_best_effort(&self, session: &str, job_id: &str) -> Option<Value> {
        let statement = format!("STOP JOB '{}'", job_id);
        match self.gateway.execute_statement(session, &statement).await {
            Ok(response) => {
                match operation_handle(&response) {
                    Some(stop_op) => {
                        match poll_operation(
                            self.gateway.as_ref(),
                            session,
                            &stop_op,
                            PollPolicy::new(STATUS_POLL_INTERVAL, STOP_POLL_TIMEOUT),
                        )
                        .await
                        {
                            Ok((outcome, _)) => {
                                debug!(job_id, outcome = outcome.tag(), "Stop operation settled")
                            }
                            Err(e) => warn!(job_id, error = %e, "Stop operation poll failed"),
                        }
                    }
                    None => warn!(job_id, "Stop statement returned no operation handle"),
                }
                Some(json!({"ok": true}))
            }
            Err(e) => {
                warn!(job_id, error = %e, "Failed to submit stop statement");
                None
            }
        }
    }

    /// Re-query the job's status at a coarse interval until it no longer
    /// reads RUNNING or the confirmation deadline elapses.
    ///
    /// A probe that cannot determine the status ends the confirmation early:
    /// the job is no longer confirmable but not necessarily gone.
    async fn confirm_job_termination(
        &self,
        session: &str,
        job_id: &str,
    ) -> (bool, Option<String>) {
        let deadline = Instant::now() + CONFIRM_DEADLINE;
        let mut last_status: Option<String> = None;

        loop {
            match self.probe_job_status(session, job_id).await {
                Some(status) => {
                    let running = status.eq_ignore_ascii_case("RUNNING");
                    last_status = Some(status);
                    if !running {
                        return (true, last_status);
                    }
                }
                None => {
                    debug!(job_id, "Job status undeterminable; stopping confirmation");
                    return (false, last_status);
                }
            }
            if Instant::now() >= deadline {
                return (false, last_status);
            }
            tokio::time::sleep(CONFIRM_PROBE_INTERVAL).await;
        }
    }

    /// One DESCRIBE JOB round trip: submit, poll to a terminal state, read
    /// the status column of the single result row. `None` when any step
    /// fails to produce a status.
    async fn probe_job_status(&self, session: &str, job_id: &str) -> Option<String> {
        let statement = format!("DESCRIBE JOB '{}'", job_id);
        let response = self
            .gateway
            .execute_statement(session, &statement)
            .await
            .ok()?;
        let operation = operation_handle(&response)?;

        let (outcome, _) = poll_operation(
            self.gateway.as_ref(),
            session,
            &operation,
            PollPolicy::new(STATUS_POLL_INTERVAL, PROBE_POLL_TIMEOUT),
        )
        .await
        .ok()?;
        if outcome != StatusOutcome::Finished {
            return None;
        }

        let page = ResultPage::from_value(
            self.gateway.fetch_result(session, &operation, 0).await.ok()?,
        );
        page.field_by_column("status")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}
