//! MCP server implementation.
//!
//! JSON-RPC 2.0 over newline-delimited stdio. One request per line, one
//! response per line; notifications get no response.

use crate::error::McpError;
use crate::executor::{ExecutionResult, ToolExecutor};
use crate::protocol::*;
use crate::tools::{TOOLSET_VERSION, ToolRegistry};
use pgpilot_assist::{CatalogAccessor, StatementExecutor};
use pgpilot_core::McpConfig;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// The MCP server.
pub struct McpServer<E, C> {
    config: McpConfig,
    tools: ToolRegistry,
    executor: ToolExecutor<E, C>,
}

impl<E, C> McpServer<E, C>
where
    E: StatementExecutor,
    C: CatalogAccessor,
{
    /// Offers the tools allowed by the executor's guardrails.
    pub fn new(config: McpConfig, executor: ToolExecutor<E, C>) -> Self {
        let tools = ToolRegistry::from_guardrails(executor.guardrails());
        Self {
            config,
            tools,
            executor,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Serve requests on the process's stdin and stdout until EOF or `shutdown`.
    pub async fn run_stdio(&self) -> Result<(), McpError> {
        tracing::info!(
            server = %self.config.server_name,
            tools = self.tools.len(),
            "Starting MCP server with stdio transport"
        );
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve requests read from `reader`, writing responses to `writer`.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<(), McpError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (response, shutdown) = match serde_json::from_str::<Value>(line) {
                Ok(message) => {
                    let id = message.get("id").cloned();
                    match serde_json::from_value::<JsonRpcRequest>(message) {
                        Ok(request) => {
                            let shutdown = request.method == "shutdown";
                            (self.handle_request(request).await, shutdown)
                        }
                        Err(e) => {
                            let err = McpError::InvalidRequest(e.to_string());
                            tracing::warn!(error = %err, "Rejecting malformed request");
                            (Some(JsonRpcResponse::error(id, err.code(), err.to_string())), false)
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unparseable line");
                    let response = JsonRpcResponse::error(None, -32700, format!("Parse error: {}", e));
                    (Some(response), false)
                }
            };

            if let Some(response) = response {
                let mut out = serde_json::to_vec(&response)?;
                out.push(b'\n');
                writer.write_all(&out).await?;
                writer.flush().await?;
            }
            if shutdown {
                break;
            }
        }

        tracing::info!("MCP server stopped");
        Ok(())
    }

    /// Handle a JSON-RPC request. Returns `None` for notifications.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "Received notification");
            return None;
        }
        let id = request.id.clone();

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "initialized" | "notifications/initialized" => JsonRpcResponse::success(id, json!({})),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, request.params).await,
            "shutdown" => self.handle_shutdown(id),
            _ => JsonRpcResponse::error(
                id,
                -32601,
                format!("Method not found: {}", request.method),
            ),
        };
        Some(response)
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": self.config.server_name,
                "version": env!("CARGO_PKG_VERSION"),
                "toolsetVersion": TOOLSET_VERSION
            },
            "capabilities": {
                "tools": {
                    "listChanged": false
                }
            }
        });
        JsonRpcResponse::success(id, result)
    }

    fn handle_list_tools(&self, id: Option<Value>) -> JsonRpcResponse {
        let response = ListToolsResponse {
            tools: self.tools.list().into_iter().cloned().collect(),
        };
        match serde_json::to_value(response) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::error(id, -32603, e.to_string()),
        }
    }

    async fn handle_call_tool(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(id, -32602, format!("Invalid params: {}", e));
                }
            },
            None => return JsonRpcResponse::error(id, -32602, "Missing params"),
        };

        let Some((kind, _)) = self.tools.get(&params.name) else {
            let err = McpError::ToolNotFound { name: params.name };
            return JsonRpcResponse::error(id, err.code(), err.to_string());
        };

        match self.executor.call(kind, params.arguments).await {
            Ok(result) => execution_result_to_response(id, result),
            Err(e) => JsonRpcResponse::error(id, e.code(), e.to_string()),
        }
    }

    fn handle_shutdown(&self, id: Option<Value>) -> JsonRpcResponse {
        tracing::info!("MCP server shutdown requested");
        JsonRpcResponse::success(id, json!(null))
    }
}

fn execution_result_to_response(id: Option<Value>, result: ExecutionResult) -> JsonRpcResponse {
    let response = CallToolResponse {
        content: result.content,
        is_error: !result.success,
    };
    match serde_json::to_value(response) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, -32603, e.to_string()),
    }
}
