//! Scripted in-memory gateway for orchestrator tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::gateway::{GatewayApi, GatewayError};

/// Scripted fake of the SQL Gateway.
///
/// Status responses are served from a queue and fall back to a default
/// (`FINISHED` unless overridden). Result pages are queued per token; the last
/// page queued for a token is sticky, and an unscripted token yields an empty
/// EOS page. Every call is recorded so tests can assert on the exact gateway
/// traffic a workflow produced.
pub struct FakeGateway {
    calls: Mutex<Vec<String>>,
    open_session_response: Mutex<Value>,
    execute_default: Mutex<Value>,
    execute_overrides: Mutex<Vec<(String, Value)>>,
    fail_next_execute: Mutex<Option<String>>,
    statuses: Mutex<VecDeque<Value>>,
    status_default: Mutex<Value>,
    pages: Mutex<HashMap<u64, VecDeque<Value>>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            open_session_response: Mutex::new(json!({"sessionHandle": "sess-1"})),
            execute_default: Mutex::new(json!({"operationHandle": "op-1"})),
            execute_overrides: Mutex::new(Vec::new()),
            fail_next_execute: Mutex::new(None),
            statuses: Mutex::new(VecDeque::new()),
            status_default: Mutex::new(json!({"status": "FINISHED"})),
            pages: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_open_session_response(&self, response: Value) {
        *self.open_session_response.lock().unwrap() = response;
    }

    pub fn set_execute_default(&self, response: Value) {
        *self.execute_default.lock().unwrap() = response;
    }

    /// Use `response` for statements containing `needle` (case-insensitive).
    pub fn execute_response_for(&self, needle: &str, response: Value) {
        self.execute_overrides
            .lock()
            .unwrap()
            .push((needle.to_lowercase(), response));
    }

    /// Make the next `execute_statement` call fail with a connection error.
    pub fn fail_next_execute(&self, message: &str) {
        *self.fail_next_execute.lock().unwrap() = Some(message.to_string());
    }

    pub fn push_status(&self, status: Value) {
        self.statuses.lock().unwrap().push_back(status);
    }

    pub fn set_status_default(&self, status: Value) {
        *self.status_default.lock().unwrap() = status;
    }

    pub fn push_page(&self, token: u64, page: Value) {
        self.pages
            .lock()
            .unwrap()
            .entry(token)
            .or_default()
            .push_back(page);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls whose label starts with `prefix`.
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GatewayApi for FakeGateway {
    async fn get_info(&self) -> Result<Value, GatewayError> {
        self.record("info");
        Ok(json!({"productName": "Apache Flink", "version": "1.20-test"}))
    }

    async fn open_session(&self) -> Result<Value, GatewayError> {
        self.record("open_session");
        Ok(self.open_session_response.lock().unwrap().clone())
    }

    async fn get_session(&self, _session: &str) -> Result<Value, GatewayError> {
        self.record("get_session");
        Ok(json!({"properties": {}}))
    }

    async fn configure_session(
        &self,
        _session: &str,
        statement: &str,
    ) -> Result<Value, GatewayError> {
        self.record(format!("configure:{}", statement));
        Ok(json!({}))
    }

    async fn execute_statement(
        &self,
        _session: &str,
        statement: &str,
    ) -> Result<Value, GatewayError> {
        self.record(format!("execute:{}", statement));
        if let Some(message) = self.fail_next_execute.lock().unwrap().take() {
            return Err(GatewayError::Connection(message));
        }
        let lowered = statement.to_lowercase();
        for (needle, response) in self.execute_overrides.lock().unwrap().iter() {
            if lowered.contains(needle) {
                return Ok(response.clone());
            }
        }
        Ok(self.execute_default.lock().unwrap().clone())
    }

    async fn operation_status(
        &self,
        _session: &str,
        _operation: &str,
    ) -> Result<Value, GatewayError> {
        self.record("status");
        match self.statuses.lock().unwrap().pop_front() {
            Some(status) => Ok(status),
            None => Ok(self.status_default.lock().unwrap().clone()),
        }
    }

    async fn fetch_result(
        &self,
        _session: &str,
        _operation: &str,
        token: u64,
    ) -> Result<Value, GatewayError> {
        self.record(format!("fetch:{}", token));
        let mut pages = self.pages.lock().unwrap();
        match pages.get_mut(&token) {
            Some(queue) if queue.len() > 1 => Ok(queue.pop_front().unwrap()),
            Some(queue) if !queue.is_empty() => Ok(queue.front().unwrap().clone()),
            _ => Ok(json!({"resultType": "EOS", "results": {"data": []}})),
        }
    }

    async fn close_operation(
        &self,
        _session: &str,
        _operation: &str,
    ) -> Result<Value, GatewayError> {
        self.record("close");
        Ok(json!({"status": "CLOSED"}))
    }
}
