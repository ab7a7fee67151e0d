//! JSON-RPC dispatch for the MCP endpoint
//!
//! Transport-independent: the HTTP layer hands over the raw body and the
//! session header, and turns the returned [`McpReply`] back into a response.

use std::sync::Arc;

use serde_json::Value;

use crate::auth::SessionId;
use crate::gate::{CallContext, Gate};
use crate::mcp::catalog::ToolCatalog;
use crate::mcp::types::{
    negotiate_protocol_version, CallToolParams, Implementation, InitializeParams,
    InitializeResponse, JsonRpcRequest, JsonRpcResponse, ServerCapabilities, INTERNAL_ERROR,
    INVALID_PARAMS, INVALID_REQUEST, METHOD_INITIALIZE, METHOD_INITIALIZED, METHOD_NOT_FOUND,
    METHOD_PING, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST, PARSE_ERROR, SESSION_HEADER,
};

/// What the transport should send back for one inbound message.
#[derive(Debug, Clone)]
pub enum McpReply {
    /// A JSON-RPC response body.
    Response {
        /// The response to serialize.
        response: JsonRpcResponse,
        /// A freshly minted session to advertise in the session header.
        new_session: Option<SessionId>,
    },
    /// A notification was accepted; no body.
    Accepted,
}

impl McpReply {
    fn response(response: JsonRpcResponse) -> Self {
        McpReply::Response {
            response,
            new_session: None,
        }
    }

    /// The JSON-RPC response, if any.
    pub fn json(&self) -> Option<&JsonRpcResponse> {
        match self {
            McpReply::Response { response, .. } => Some(response),
            McpReply::Accepted => None,
        }
    }
}

/// Routes JSON-RPC methods to the catalog and the gate.
pub struct McpHandler {
    gate: Arc<Gate>,
    catalog: ToolCatalog,
    server_info: Implementation,
}

impl McpHandler {
    /// Creates a handler serving `catalog` through `gate`.
    pub fn new(gate: Arc<Gate>, catalog: ToolCatalog, server_info: Implementation) -> Self {
        Self {
            gate,
            catalog,
            server_info,
        }
    }

    /// The advertised tools.
    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Handles one raw message body arriving on `session` (if any).
    pub async fn handle_message(&self, session: Option<SessionId>, body: &str) -> McpReply {
        let request: JsonRpcRequest = match serde_json::from_str(body) {
            Ok(req) => req,
            Err(e) => {
                tracing::debug!("Rejected unparseable message: {}", e);
                return McpReply::response(JsonRpcResponse::failure(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };
        self.handle_request(session, request).await
    }

    /// Handles one parsed request.
    pub async fn handle_request(
        &self,
        session: Option<SessionId>,
        request: JsonRpcRequest,
    ) -> McpReply {
        if request.is_notification() {
            if request.method != METHOD_INITIALIZED {
                tracing::debug!(method = %request.method, "Ignoring unknown notification");
            }
            return McpReply::Accepted;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        match request.method.as_str() {
            METHOD_INITIALIZE => self.initialize(id, request.params),
            METHOD_PING => McpReply::response(JsonRpcResponse::success(id, serde_json::json!({}))),
            METHOD_TOOLS_LIST => match serde_json::to_value(self.catalog.list()) {
                Ok(result) => McpReply::response(JsonRpcResponse::success(id, result)),
                Err(e) => McpReply::response(JsonRpcResponse::failure(
                    id,
                    INTERNAL_ERROR,
                    e.to_string(),
                )),
            },
            METHOD_TOOLS_CALL => self.call_tool(id, session, request.params).await,
            other => {
                tracing::debug!(method = %other, "Method not found");
                McpReply::response(JsonRpcResponse::failure(
                    id,
                    METHOD_NOT_FOUND,
                    format!("Method not found: {}", other),
                ))
            }
        }
    }

    fn initialize(&self, id: Value, params: Option<Value>) -> McpReply {
        let params: InitializeParams = params
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or_default();

        let session = SessionId::generate();
        let version = negotiate_protocol_version(params.protocol_version.as_deref());
        tracing::info!(
            session = %session,
            protocol_version = version,
            client = params.client_info.as_ref().map(|c| c.name.as_str()).unwrap_or("unknown"),
            "Session initialized"
        );

        let result = InitializeResponse {
            protocol_version: version.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(serde_json::json!({ "listChanged": false })),
            },
            server_info: self.server_info.clone(),
            instructions: None,
        };

        match serde_json::to_value(result) {
            Ok(result) => McpReply::Response {
                response: JsonRpcResponse::success(id, result),
                new_session: Some(session),
            },
            Err(e) => McpReply::response(JsonRpcResponse::failure(
                id,
                INTERNAL_ERROR,
                e.to_string(),
            )),
        }
    }

    async fn call_tool(
        &self,
        id: Value,
        session: Option<SessionId>,
        params: Option<Value>,
    ) -> McpReply {
        let Some(session) = session else {
            return McpReply::response(JsonRpcResponse::failure(
                id,
                INVALID_REQUEST,
                format!("Missing {} header", SESSION_HEADER),
            ));
        };

        let params: CallToolParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return McpReply::response(JsonRpcResponse::failure(
                    id,
                    INVALID_PARAMS,
                    format!("Invalid params: {}", e),
                ))
            }
            None => {
                return McpReply::response(JsonRpcResponse::failure(
                    id,
                    INVALID_PARAMS,
                    "Missing params",
                ))
            }
        };

        if !self.catalog.contains(&params.name) {
            return McpReply::response(JsonRpcResponse::failure(
                id,
                INVALID_PARAMS,
                format!("Unknown tool: {}", params.name),
            ));
        }

        let response = self
            .gate
            .handle(&CallContext::new(session), params)
            .await;
        match serde_json::to_value(response) {
            Ok(result) => McpReply::response(JsonRpcResponse::success(id, result)),
            Err(e) => McpReply::response(JsonRpcResponse::failure(
                id,
                INTERNAL_ERROR,
                e.to_string(),
            )),
        }
    }
}
