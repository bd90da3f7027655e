//! Stdio JSON-RPC server loop.
//!
//! Reads one JSON-RPC message per line from stdin and writes one response
//! per line to stdout. Logging goes to stderr; stdout belongs to the
//! protocol.

use std::io::Write;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

use super::context::ToolContext;
use super::protocol::{
    methods, InitializeResult, McpError, McpRequest, McpResponse, PingResult, RequestId,
    ResourcesCapability, ResourcesListResult, ResourcesReadParams, ResourcesReadResult,
    ServerCapabilities, ServerInfo, ToolsCallParams, ToolsCapability, ToolsListResult,
    JSONRPC_VERSION, MCP_PROTOCOL_VERSION,
};
use super::registry::McpRegistry;

/// MCP server over stdio.
pub struct McpServer {
    registry: Arc<McpRegistry>,
    context: ToolContext,
    initialized: bool,
}

impl McpServer {
    pub fn new(registry: Arc<McpRegistry>, context: ToolContext) -> Self {
        Self {
            registry,
            context,
            initialized: false,
        }
    }

    /// Serve requests until stdin closes.
    pub async fn run(&mut self) -> std::io::Result<()> {
        let stdin = tokio::io::stdin();
        let reader = BufReader::new(stdin);
        let mut lines = reader.lines();

        let stdout = std::io::stdout();
        let mut stdout = stdout.lock();

        info!("MCP server listening on stdio");

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            debug!(raw = %line, "Received JSON-RPC message");

            let request: McpRequest = match serde_json::from_str(&line) {
                Ok(request) => request,
                Err(e) => {
                    error!(error = %e, "Failed to parse JSON-RPC request");
                    let response = McpResponse::error(None, McpError::ParseError(e.to_string()));
                    Self::write_response(&mut stdout, &response)?;
                    continue;
                }
            };

            if request.jsonrpc != JSONRPC_VERSION {
                let response = McpResponse::error(
                    request.id.clone(),
                    McpError::InvalidRequest(format!(
                        "Unsupported JSON-RPC version: {}",
                        request.jsonrpc
                    )),
                );
                Self::write_response(&mut stdout, &response)?;
                continue;
            }

            let method = request.method.clone();
            let start = std::time::Instant::now();
            let response = self.handle_request(request).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            if let Some(response) = &response {
                if response.error.is_some() {
                    warn!(method = %method, elapsed_ms, error = ?response.error, "Request failed");
                } else {
                    info!(method = %method, elapsed_ms, "Request handled");
                }
                Self::write_response(&mut stdout, response)?;
            }
        }

        Ok(())
    }

    fn write_response(
        stdout: &mut impl Write,
        response: &McpResponse,
    ) -> std::io::Result<()> {
        match serde_json::to_string(response) {
            Ok(json) => {
                writeln!(stdout, "{}", json)?;
                stdout.flush()
            }
            Err(e) => {
                error!(error = %e, "Failed to serialize response");
                Ok(())
            }
        }
    }

    /// Dispatch a single request. Returns `None` for notifications.
    pub async fn handle_request(&mut self, request: McpRequest) -> Option<McpResponse> {
        match request.method.as_str() {
            methods::INITIALIZED | methods::SHUTDOWN => return None,
            _ => {}
        }
        // A request without an id is a notification; nothing to answer.
        let request_id: RequestId = request.id.clone()?;

        let result = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(),
            methods::PING => {
                serde_json::to_value(PingResult {}).map_err(|e| McpError::InternalError(e.to_string()))
            }
            methods::TOOLS_LIST => self.ensure_initialized().and_then(|_| self.handle_tools_list()),
            methods::TOOLS_CALL => match self.ensure_initialized() {
                Ok(()) => self.handle_tools_call(&request).await,
                Err(e) => Err(e),
            },
            methods::RESOURCES_LIST => {
                self.ensure_initialized().and_then(|_| self.handle_resources_list())
            }
            methods::RESOURCES_READ => match self.ensure_initialized() {
                Ok(()) => self.handle_resources_read(&request).await,
                Err(e) => Err(e),
            },
            other => Err(McpError::MethodNotFound(other.to_string())),
        };

        Some(match result {
            Ok(value) => McpResponse::success(request_id, value),
            Err(error) => McpResponse::error(Some(request_id), error),
        })
    }

    fn ensure_initialized(&self) -> Result<(), McpError> {
        if self.initialized {
            Ok(())
        } else {
            Err(McpError::InvalidRequest("Not initialized".to_string()))
        }
    }

    fn handle_initialize(&mut self) -> Result<Value, McpError> {
        self.initialized = true;

        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: None }),
                resources: Some(ResourcesCapability {
                    subscribe: Some(false),
                    list_changed: None,
                }),
            },
            server_info: ServerInfo {
                name: "flink-mcp-server".to_string(),
                version: self.context.server_version.clone(),
            },
        };

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    fn handle_tools_list(&self) -> Result<Value, McpError> {
        let result = ToolsListResult {
            tools: self.registry.list_tools(),
        };
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_tools_call(&self, request: &McpRequest) -> Result<Value, McpError> {
        let params: ToolsCallParams = request
            .params
            .clone()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Missing params".to_string()))?;

        let tool = self
            .registry
            .get_tool(&params.name)
            .ok_or_else(|| McpError::MethodNotFound(format!("Unknown tool: {}", params.name)))?;

        info!(tool = %params.name, "Executing tool");
        let arguments = params.arguments.unwrap_or_else(|| serde_json::json!({}));
        let result = (tool.handler)(self.context.clone(), arguments).await?;

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    fn handle_resources_list(&self) -> Result<Value, McpError> {
        let result = ResourcesListResult {
            resources: self.registry.list_resources(),
        };
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_resources_read(&self, request: &McpRequest) -> Result<Value, McpError> {
        let params: ResourcesReadParams = request
            .params
            .clone()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| McpError::InvalidParams(e.to_string()))?
            .ok_or_else(|| McpError::InvalidParams("Missing params".to_string()))?;

        let resource = self
            .registry
            .find_resource(&params.uri)
            .ok_or_else(|| McpError::ResourceNotFound(params.uri.clone()))?;

        let contents = (resource.handler)(self.context.clone(), params.uri).await?;
        let result = ResourcesReadResult { contents };

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }
}
