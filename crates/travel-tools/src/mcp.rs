//! Remote tool protocol: JSON-RPC 2.0 over HTTP in the shape of MCP's
//! streamable HTTP transport. The server side is transport-free
//! ([`handle_request`]); [`McpToolClient`] is the matching [`ToolProvider`].

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use travel_core::{warning, ToolSpec};

use crate::{request_error, ToolError, ToolProvider};

pub const PROTOCOL_VERSION: &str = "2025-03-26";
pub const SERVER_NAME: &str = "travel_planner_app";
pub const SESSION_HEADER: &str = "mcp-session-id";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure<T: Into<String>>(id: Value, code: i64, message: T) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn parse_error<T: Into<String>>(message: T) -> Self {
        Self::failure(Value::Null, PARSE_ERROR, message)
    }
}

#[derive(Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Answers one request. Notifications (no id) get `None`.
pub async fn handle_request(
    provider: &dyn ToolProvider,
    request: JsonRpcRequest,
) -> Option<JsonRpcResponse> {
    let Some(id) = request.id else {
        tracing::debug!(method = %request.method, "notification received");
        return None;
    };

    let response = match request.method.as_str() {
        "initialize" => JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {"tools": {"listChanged": false}},
                "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")},
            }),
        ),
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => match provider.list_tools().await {
            Ok(specs) => {
                let tools: Vec<Value> = specs
                    .into_iter()
                    .map(|spec| {
                        json!({
                            "name": spec.name,
                            "description": spec.description,
                            "inputSchema": spec.parameters,
                        })
                    })
                    .collect();
                JsonRpcResponse::success(id, json!({ "tools": tools }))
            }
            Err(err) => JsonRpcResponse::failure(id, INVALID_PARAMS, err.to_string()),
        },
        "tools/call" => match serde_json::from_value::<CallParams>(request.params) {
            Ok(params) => {
                let arguments = if params.arguments.is_null() {
                    json!({})
                } else {
                    params.arguments
                };
                let text = provider.call_tool(&params.name, arguments).await;
                JsonRpcResponse::success(
                    id,
                    json!({
                        "content": [{"type": "text", "text": text}],
                        "isError": false,
                    }),
                )
            }
            Err(err) => JsonRpcResponse::failure(id, INVALID_PARAMS, err.to_string()),
        },
        other => JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("unknown method: {other}")),
    };
    Some(response)
}

#[derive(Deserialize)]
struct RemoteTool {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default, rename = "inputSchema")]
    input_schema: Value,
}

/// Consumes tools served by a remote tool server.
pub struct McpToolClient {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
    session: Mutex<Option<String>>,
}

impl McpToolClient {
    /// Performs the initialize handshake against `url`.
    /// `timeout` bounds every request, handshake included.
    pub async fn connect<T: Into<String>>(url: T, timeout: Duration) -> Result<Self, ToolError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(request_error)?;
        let client = Self {
            client: http,
            url: url.into(),
            next_id: AtomicU64::new(1),
            session: Mutex::new(None),
        };
        let info = client
            .rpc(
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {"name": "travel-planner", "version": env!("CARGO_PKG_VERSION")},
                }),
            )
            .await?;
        tracing::info!(url = %client.url, server = %info["serverInfo"]["name"], "connected to tool server");
        client.notify("notifications/initialized").await?;
        Ok(client)
    }

    fn session_id(&self) -> Option<String> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn post(&self, body: &JsonRpcRequest) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .post(&self.url)
            .header(ACCEPT, "application/json, text/event-stream")
            .json(body);
        if let Some(session) = self.session_id() {
            request = request.header(SESSION_HEADER, session);
        }
        request
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value, ToolError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: Some(Value::from(self.next_id.fetch_add(1, Ordering::Relaxed))),
            method: method.to_string(),
            params,
        };
        let resp = self.post(&request).send().await.map_err(request_error)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ToolError::Status(status.as_u16()));
        }
        if let Some(session) = resp
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            *self
                .session
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session.to_string());
        }
        let is_stream = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"));
        let body = resp.text().await.map_err(request_error)?;
        let payload = if is_stream {
            last_event_data(&body)
                .ok_or_else(|| ToolError::InvalidResponse("event stream carried no data".into()))?
        } else {
            body
        };

        let response: JsonRpcResponse = serde_json::from_str(&payload)
            .map_err(|e| ToolError::InvalidResponse(e.to_string()))?;
        if let Some(error) = response.error {
            return Err(ToolError::Remote {
                code: error.code,
                message: error.message,
            });
        }
        response
            .result
            .ok_or_else(|| ToolError::InvalidResponse("response has neither result nor error".into()))
    }

    async fn notify(&self, method: &str) -> Result<(), ToolError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: None,
            method: method.to_string(),
            params: Value::Null,
        };
        let resp = self.post(&request).send().await.map_err(request_error)?;
        if !resp.status().is_success() {
            return Err(ToolError::Status(resp.status().as_u16()));
        }
        Ok(())
    }
}

/// The JSON-RPC answer is the last `data:` event of the stream.
fn last_event_data(stream: &str) -> Option<String> {
    // Lines may end in CRLF, LF or CR.
    let stream = stream.replace("\r\n", "\n").replace('\r', "\n");
    stream
        .split("\n\n")
        .filter_map(|event| {
            let data: Vec<&str> = event
                .lines()
                .filter_map(|line| line.strip_prefix("data:"))
                .map(str::trim_start)
                .collect();
            (!data.is_empty()).then(|| data.join("\n"))
        })
        .last()
}

#[async_trait]
impl ToolProvider for McpToolClient {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolError> {
        let result = self.rpc("tools/list", json!({})).await?;
        let tools: Vec<RemoteTool> = serde_json::from_value(result["tools"].clone())
            .map_err(|e| ToolError::InvalidResponse(e.to_string()))?;
        Ok(tools
            .into_iter()
            .map(|tool| ToolSpec {
                name: tool.name,
                description: tool.description,
                parameters: tool.input_schema,
            })
            .collect())
    }

    async fn call_tool(&self, name: &str, args: Value) -> String {
        match self
            .rpc("tools/call", json!({"name": name, "arguments": args}))
            .await
        {
            Ok(result) => {
                let parts: Vec<&str> = result["content"]
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|item| item.get("text").and_then(Value::as_str))
                            .collect()
                    })
                    .unwrap_or_default();
                if parts.is_empty() {
                    warning(format!("{name} returned no text"))
                } else {
                    parts.join("\n")
                }
            }
            Err(err) => {
                tracing::warn!(tool = %name, error = %err, "remote tool call failed");
                warning(format!("{name} failed: {err}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::{FlightInfoTool, PackingListTool};
    use crate::ToolRegistry;
    use travel_core::WARNING_MARKER;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(PackingListTool);
        registry.register(FlightInfoTool);
        registry
    }

    fn request(id: Option<i64>, method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: id.map(Value::from),
            method: method.into(),
            params,
        }
    }

    #[tokio::test]
    async fn server_lists_tools_with_input_schema() {
        let response = handle_request(&registry(), request(Some(1), "tools/list", json!({})))
            .await
            .expect("response");
        let tools = response.result.expect("result")["tools"].clone();
        assert_eq!(tools.as_array().map(Vec::len), Some(2));
        assert_eq!(tools[1]["name"], "packing_list");
        assert_eq!(tools[1]["inputSchema"]["required"], json!(["city"]));
    }

    #[tokio::test]
    async fn server_calls_tool_and_wraps_text() {
        let response = handle_request(
            &registry(),
            request(
                Some(7),
                "tools/call",
                json!({"name": "packing_list", "arguments": {"city": "Oslo", "season": "rainy"}}),
            ),
        )
        .await
        .expect("response");
        assert_eq!(response.id, json!(7));
        let result = response.result.expect("result");
        assert_eq!(result["isError"], json!(false));
        assert!(result["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Umbrella"));
    }

    #[tokio::test]
    async fn server_rejects_unknown_methods_and_ignores_notifications() {
        let registry = registry();
        let response = handle_request(&registry, request(Some(2), "resources/list", json!({})))
            .await
            .expect("response");
        assert_eq!(response.error.expect("error").code, METHOD_NOT_FOUND);

        let bad = handle_request(&registry, request(Some(3), "tools/call", json!({"arguments": {}})))
            .await
            .expect("response");
        assert_eq!(bad.error.expect("error").code, INVALID_PARAMS);

        assert!(
            handle_request(&registry, request(None, "notifications/initialized", Value::Null))
                .await
                .is_none()
        );
    }

    async fn mount_handshake(server: &MockServer) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "initialize"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(SESSION_HEADER, "session-42")
                    .set_body_json(json!({
                        "jsonrpc": "2.0",
                        "id": 1,
                        "result": {"protocolVersion": PROTOCOL_VERSION, "serverInfo": {"name": SERVER_NAME}}
                    })),
            )
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "notifications/initialized"})))
            .respond_with(ResponseTemplate::new(202))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn client_lists_remote_tools() {
        let server = MockServer::start().await;
        mount_handshake(&server).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/list"})))
            .and(header(SESSION_HEADER, "session-42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 2,
                "result": {"tools": [{
                    "name": "weather_forecast",
                    "description": "Get a weather forecast for a city.",
                    "inputSchema": {"type": "object", "required": ["city"]}
                }]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = McpToolClient::connect(format!("{}/mcp", server.uri()), TIMEOUT)
            .await
            .expect("handshake succeeds");
        let tools = client.list_tools().await.expect("tools listed");
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "weather_forecast");
        assert_eq!(tools[0].parameters["required"], json!(["city"]));
    }

    #[tokio::test]
    async fn client_reads_event_stream_responses() {
        let server = MockServer::start().await;
        mount_handshake(&server).await;
        let stream = "event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{\"content\":[{\"type\":\"text\",\"text\":\"🧳 Suggested packing list\"}]}}\n\n";
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/call", "params": {"name": "packing_list"}})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(stream, "text/event-stream"))
            .mount(&server)
            .await;

        let client = McpToolClient::connect(server.uri(), TIMEOUT).await.expect("handshake");
        let text = client
            .call_tool("packing_list", json!({"city": "Oslo"}))
            .await;
        assert_eq!(text, "🧳 Suggested packing list");
    }

    #[tokio::test]
    async fn client_turns_remote_errors_into_warnings() {
        let server = MockServer::start().await;
        mount_handshake(&server).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/call"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 2,
                "error": {"code": -32602, "message": "missing name"}
            })))
            .mount(&server)
            .await;

        let client = McpToolClient::connect(server.uri(), TIMEOUT).await.expect("handshake");
        let text = client.call_tool("packing_list", json!({})).await;
        assert!(text.starts_with(WARNING_MARKER));
        assert!(text.contains("missing name"));
    }

    #[test]
    fn last_event_data_picks_final_event() {
        let stream = "data: {\"a\":1}\n\nevent: message\ndata: {\"b\":2}\n\n";
        assert_eq!(last_event_data(stream).as_deref(), Some("{\"b\":2}"));
        assert_eq!(last_event_data(": keepalive\n\n"), None);
    }

    #[test]
    fn last_event_data_handles_crlf_framing() {
        let stream = "event: message\r\ndata: {\"a\":1}\r\n\r\nevent: message\r\ndata: {\"b\":2}\r\n\r\n";
        assert_eq!(last_event_data(stream).as_deref(), Some("{\"b\":2}"));
        assert_eq!(last_event_data("data: {\"c\":3}\r\r").as_deref(), Some("{\"c\":3}"));
    }

    #[tokio::test]
    async fn client_reads_crlf_stream_with_leading_notification() {
        let server = MockServer::start().await;
        mount_handshake(&server).await;
        let stream = "event: message\r\ndata: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/message\",\"params\":{}}\r\n\r\n\
                      event: message\r\ndata: {\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{\"content\":[{\"type\":\"text\",\"text\":\"✈️ flights\"}]}}\r\n\r\n";
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/call"})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(stream, "text/event-stream"))
            .mount(&server)
            .await;

        let client = McpToolClient::connect(server.uri(), TIMEOUT).await.expect("handshake");
        let text = client
            .call_tool("flight_info", json!({"source": "Oslo", "destination": "Rome"}))
            .await;
        assert_eq!(text, "✈️ flights");
    }

    #[tokio::test]
    async fn connect_gives_up_after_the_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let result = McpToolClient::connect(server.uri(), Duration::from_millis(200)).await;
        assert!(matches!(result, Err(ToolError::Request(_))));
    }
}
