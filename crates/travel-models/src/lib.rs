use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use travel_core::{Message, ModelReply, ToolCall, ToolSpec};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UsageMetrics {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    pub provider: String,
    pub model: String,
    pub supports_tools: bool,
}

#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub reply: ModelReply,
    pub usage: UsageMetrics,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A chat model that can be offered tools on every turn.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelResponse, ModelError>;

    fn metadata(&self) -> ModelMetadata;
}

#[derive(Debug, Clone)]
pub struct ChatModelConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for ChatModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key: String::new(),
            model: "mistralai/mistral-7b-instruct".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Client for any `/chat/completions` endpoint speaking the OpenAI wire format
/// (OpenRouter by default).
pub struct OpenAiChatModel {
    client: reqwest::Client,
    config: ChatModelConfig,
}

impl OpenAiChatModel {
    pub fn new(config: ChatModelConfig) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::Request(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: Option<String>,
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelResponse, ModelError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: messages.iter().map(to_wire_message).collect(),
            tools: tools.iter().map(to_wire_tool).collect(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        tracing::debug!(
            model = %self.config.model,
            messages = messages.len(),
            tools = tools.len(),
            "sending chat completion"
        );

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("no choices returned".into()))?;
        let content = choice.message.content.as_ref().and_then(content_text);
        let calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, call)| ToolCall {
                id: call.id.unwrap_or_else(|| format!("call_{index}")),
                name: call.function.name,
                arguments: parse_arguments(call.function.arguments),
            })
            .collect();
        let usage = parsed
            .usage
            .map(|u| UsageMetrics {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(ModelResponse {
            reply: ModelReply::from_parts(content, calls),
            usage,
        })
    }

    fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            provider: "openai-compatible".into(),
            model: self.config.model.clone(),
            supports_tools: true,
        }
    }
}

fn to_wire_message(message: &Message) -> Value {
    match message {
        Message::System { content } => json!({"role": "system", "content": content}),
        Message::User { content } => json!({"role": "user", "content": content}),
        Message::Assistant {
            reply: ModelReply::Answer { content },
        } => json!({"role": "assistant", "content": content}),
        Message::Assistant {
            reply: ModelReply::ToolCalls { content, calls },
        } => json!({
            "role": "assistant",
            "content": content,
            "tool_calls": calls.iter().map(|call| json!({
                "id": call.id,
                "type": "function",
                "function": {
                    "name": call.name,
                    "arguments": call.arguments.to_string(),
                }
            })).collect::<Vec<_>>(),
        }),
        Message::Tool {
            call_id,
            name,
            content,
        } => json!({
            "role": "tool",
            "tool_call_id": call_id,
            "name": name,
            "content": content,
        }),
    }
}

fn to_wire_tool(spec: &ToolSpec) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": spec.name,
            "description": spec.description,
            "parameters": spec.parameters,
        }
    })
}

/// Content is either a plain string or a list of typed parts.
fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let text: Vec<&str> = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();
            (!text.is_empty()).then(|| text.join(""))
        }
        _ => None,
    }
}

/// Arguments arrive as a JSON-encoded string; some providers send an object.
fn parse_arguments(raw: Value) -> Value {
    match raw {
        Value::String(text) if text.trim().is_empty() => json!({}),
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        Value::Null => json!({}),
        other => other,
    }
}

enum ScriptStep {
    Reply(ModelReply),
    Fail(String),
}

/// Replays a fixed sequence of replies and records every history it is sent.
/// Once the script runs out it keeps returning the repeat reply, if any.
pub struct ScriptedModel {
    script: Mutex<VecDeque<ScriptStep>>,
    repeat: Option<ModelReply>,
    histories: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<ModelReply>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().map(ScriptStep::Reply).collect()),
            repeat: None,
            histories: Mutex::new(Vec::new()),
        }
    }

    pub fn repeating(reply: ModelReply) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeat: Some(reply),
            histories: Mutex::new(Vec::new()),
        }
    }

    pub fn failing<T: Into<String>>(message: T) -> Self {
        Self {
            script: Mutex::new(VecDeque::from([ScriptStep::Fail(message.into())])),
            repeat: None,
            histories: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.histories
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn histories(&self) -> Vec<Vec<Message>> {
        self.histories
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[ToolSpec],
    ) -> Result<ModelResponse, ModelError> {
        self.histories
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(messages.to_vec());
        let step = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        let reply = match step {
            Some(ScriptStep::Reply(reply)) => reply,
            Some(ScriptStep::Fail(message)) => return Err(ModelError::Request(message)),
            None => self
                .repeat
                .clone()
                .ok_or_else(|| ModelError::Request("script exhausted".into()))?,
        };
        Ok(ModelResponse {
            reply,
            usage: UsageMetrics::default(),
        })
    }

    fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            provider: "scripted".into(),
            model: "scripted".into(),
            supports_tools: true,
        }
    }
}
