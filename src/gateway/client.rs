//! HTTP client for the Flink SQL Gateway REST API (v3).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when talking to the SQL Gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Gateway error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout
        } else if e.is_decode() {
            GatewayError::InvalidResponse(e.to_string())
        } else {
            GatewayError::Connection(e.to_string())
        }
    }
}

/// Raw calls against the SQL Gateway REST surface.
///
/// Responses are returned as loosely-typed JSON; the shape-tolerant field
/// extraction lives in [`super::responses`]. Implementations must be safe to
/// share across concurrent workflows.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// GET `/v3/info` - cluster/product information.
    async fn get_info(&self) -> Result<Value, GatewayError>;

    /// POST `/v3/sessions` - open a session with default properties.
    async fn open_session(&self) -> Result<Value, GatewayError>;

    /// GET `/v3/sessions/{session}` - read session properties.
    async fn get_session(&self, session: &str) -> Result<Value, GatewayError>;

    /// POST `/v3/sessions/{session}/configure-session` - apply a config/DDL statement.
    async fn configure_session(&self, session: &str, statement: &str)
        -> Result<Value, GatewayError>;

    /// POST `/v3/sessions/{session}/statements` - submit a statement.
    async fn execute_statement(&self, session: &str, statement: &str)
        -> Result<Value, GatewayError>;

    /// GET `/v3/sessions/{session}/operations/{operation}/status`.
    async fn operation_status(&self, session: &str, operation: &str)
        -> Result<Value, GatewayError>;

    /// GET `/v3/sessions/{session}/operations/{operation}/result/{token}`.
    async fn fetch_result(
        &self,
        session: &str,
        operation: &str,
        token: u64,
    ) -> Result<Value, GatewayError>;

    /// DELETE `/v3/sessions/{session}/operations/{operation}/close`.
    async fn close_operation(&self, session: &str, operation: &str)
        -> Result<Value, GatewayError>;
}

/// Reqwest-backed SQL Gateway client.
pub struct SqlGatewayClient {
    client: Client,
    base_url: String,
    request_timeout: std::time::Duration,
}

impl SqlGatewayClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the gateway (e.g., "http://localhost:8083").
    /// * `request_timeout` - Timeout applied to each individual request.
    pub fn new(base_url: impl Into<String>, request_timeout: std::time::Duration) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> Result<Value, GatewayError> {
        let response = self
            .client
            .get(self.url(path))
            .timeout(self.request_timeout)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, GatewayError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .timeout(self.request_timeout)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<Value, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        // Some endpoints (configure-session) legitimately return an empty body.
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(json!({}));
        }
        serde_json::from_str(&body)
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl GatewayApi for SqlGatewayClient {
    async fn get_info(&self) -> Result<Value, GatewayError> {
        self.get_json("/v3/info").await
    }

    async fn open_session(&self) -> Result<Value, GatewayError> {
        debug!("Opening SQL Gateway session");
        self.post_json("/v3/sessions", &json!({ "properties": {} }))
            .await
    }

    async fn get_session(&self, session: &str) -> Result<Value, GatewayError> {
        self.get_json(&format!("/v3/sessions/{}", session)).await
    }

    async fn configure_session(
        &self,
        session: &str,
        statement: &str,
    ) -> Result<Value, GatewayError> {
        debug!(session = %session, "Applying session configuration statement");
        self.post_json(
            &format!("/v3/sessions/{}/configure-session", session),
            &json!({ "statement": statement }),
        )
        .await
    }

    async fn execute_statement(
        &self,
        session: &str,
        statement: &str,
    ) -> Result<Value, GatewayError> {
        debug!(session = %session, "Submitting statement");
        self.post_json(
            &format!("/v3/sessions/{}/statements", session),
            &json!({ "statement": statement }),
        )
        .await
    }

    async fn operation_status(
        &self,
        session: &str,
        operation: &str,
    ) -> Result<Value, GatewayError> {
        self.get_json(&format!(
            "/v3/sessions/{}/operations/{}/status",
            session, operation
        ))
        .await
    }

    async fn fetch_result(
        &self,
        session: &str,
        operation: &str,
        token: u64,
    ) -> Result<Value, GatewayError> {
        let response = self
            .client
            .get(self.url(&format!(
                "/v3/sessions/{}/operations/{}/result/{}",
                session, operation, token
            )))
            .query(&[("rowFormat", "JSON")])
            .timeout(self.request_timeout)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn close_operation(
        &self,
        session: &str,
        operation: &str,
    ) -> Result<Value, GatewayError> {
        let response = self
            .client
            .delete(self.url(&format!(
                "/v3/sessions/{}/operations/{}/close",
                session, operation
            )))
            .timeout(self.request_timeout)
            .send()
            .await?;
        Self::decode(response).await
    }
}
