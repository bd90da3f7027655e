//! Common test infrastructure
//!
//! A scripted in-process mock of the Flink SQL Gateway REST surface. Tests
//! drive the real reqwest client against it over HTTP and assert on the
//! requests it received.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

pub const SESSION_HANDLE: &str = "sess-mock";
pub const QUERY_OPERATION: &str = "op-exec";
pub const STOP_OPERATION: &str = "op-stop";
pub const DESCRIBE_OPERATION: &str = "op-describe";

#[derive(Default)]
struct GatewayState {
    /// Scripted result pages per (operation, token). Queued pages pop in
    /// order; the last page for a token is sticky.
    pages: HashMap<(String, u64), Vec<Value>>,
    /// Status row served to DESCRIBE JOB result fetches.
    job_status: Option<String>,
    /// Request log, one "METHOD path" entry per request.
    requests: Vec<String>,
}

type SharedState = Arc<Mutex<GatewayState>>;

/// Mock SQL Gateway listening on an ephemeral local port.
#[derive(Clone)]
pub struct MockGateway {
    pub base_url: String,
    state: SharedState,
}

impl MockGateway {
    pub async fn spawn() -> Self {
        let state: SharedState = Arc::new(Mutex::new(GatewayState::default()));

        let app = Router::new()
            .route("/v3/info", get(get_info))
            .route("/v3/sessions", post(open_session))
            .route("/v3/sessions/{session}", get(get_session))
            .route(
                "/v3/sessions/{session}/configure-session",
                post(configure_session),
            )
            .route("/v3/sessions/{session}/statements", post(execute_statement))
            .route(
                "/v3/sessions/{session}/operations/{operation}/status",
                get(operation_status),
            )
            .route(
                "/v3/sessions/{session}/operations/{operation}/result/{token}",
                get(fetch_result),
            )
            .route(
                "/v3/sessions/{session}/operations/{operation}/close",
                delete(close_operation),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Queue a result page for `operation` at `token`.
    pub fn push_page(&self, operation: &str, token: u64, page: Value) {
        self.state
            .lock()
            .unwrap()
            .pages
            .entry((operation.to_string(), token))
            .or_default()
            .push(page);
    }

    /// Set the job status reported to DESCRIBE JOB probes.
    pub fn set_job_status(&self, status: &str) {
        self.state.lock().unwrap().job_status = Some(status.to_string());
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Number of logged requests containing `needle`.
    pub fn request_count(&self, needle: &str) -> usize {
        self.requests().iter().filter(|r| r.contains(needle)).count()
    }
}

fn record(state: &SharedState, method: &str, path: String) {
    state
        .lock()
        .unwrap()
        .requests
        .push(format!("{} {}", method, path));
}

async fn get_info(State(state): State<SharedState>) -> Json<Value> {
    record(&state, "GET", "/v3/info".to_string());
    Json(json!({"productName": "Apache Flink", "version": "1.20-mock"}))
}

async fn open_session(State(state): State<SharedState>) -> Json<Value> {
    record(&state, "POST", "/v3/sessions".to_string());
    Json(json!({"sessionHandle": SESSION_HANDLE, "properties": {}}))
}

async fn get_session(
    State(state): State<SharedState>,
    Path(session): Path<String>,
) -> Json<Value> {
    record(&state, "GET", format!("/v3/sessions/{}", session));
    Json(json!({"properties": {"execution.runtime-mode": "streaming"}}))
}

async fn configure_session(
    State(state): State<SharedState>,
    Path(session): Path<String>,
    Json(_body): Json<Value>,
) -> Json<Value> {
    record(
        &state,
        "POST",
        format!("/v3/sessions/{}/configure-session", session),
    );
    Json(json!({}))
}

async fn execute_statement(
    State(state): State<SharedState>,
    Path(session): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let statement = body
        .get("statement")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase();
    record(
        &state,
        "POST",
        format!("/v3/sessions/{}/statements [{}]", session, statement),
    );

    let operation = if statement.contains("stop job") {
        STOP_OPERATION
    } else if statement.contains("describe job") {
        DESCRIBE_OPERATION
    } else {
        QUERY_OPERATION
    };
    Json(json!({"operationHandle": operation}))
}

async fn operation_status(
    State(state): State<SharedState>,
    Path((session, operation)): Path<(String, String)>,
) -> Json<Value> {
    record(
        &state,
        "GET",
        format!("/v3/sessions/{}/operations/{}/status", session, operation),
    );
    Json(json!({"status": "FINISHED"}))
}

async fn fetch_result(
    State(state): State<SharedState>,
    Path((session, operation, token)): Path<(String, String, u64)>,
) -> Json<Value> {
    record(
        &state,
        "GET",
        format!(
            "/v3/sessions/{}/operations/{}/result/{}",
            session, operation, token
        ),
    );

    let mut guard = state.lock().unwrap();
    if operation == DESCRIBE_OPERATION {
        let status = guard.job_status.clone().unwrap_or_default();
        return Json(json!({
            "resultType": "PAYLOAD",
            "results": {
                "columns": [{"name": "job id"}, {"name": "status"}],
                "data": [{"fields": ["job-mock", status]}],
            },
        }));
    }
    let page = match guard.pages.get_mut(&(operation, token)) {
        Some(queue) if queue.len() > 1 => queue.remove(0),
        Some(queue) if !queue.is_empty() => queue[0].clone(),
        _ => json!({"resultType": "EOS", "results": {"data": []}}),
    };
    Json(page)
}

async fn close_operation(
    State(state): State<SharedState>,
    Path((session, operation)): Path<(String, String)>,
) -> Json<Value> {
    record(
        &state,
        "DELETE",
        format!("/v3/sessions/{}/operations/{}/close", session, operation),
    );
    Json(json!({"status": "CLOSED"}))
}
