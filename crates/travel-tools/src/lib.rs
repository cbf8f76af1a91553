use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use travel_core::{warning, ToolSpec};

pub mod builtins;
pub mod mcp;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String },
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn input_schema(&self) -> Value;
    async fn execute(&self, args: Value) -> Result<String, ToolError>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.input_schema(),
        }
    }
}

/// Anything that can advertise tools to the model and run them by name.
///
/// `call_tool` never fails: every problem comes back as warning-marked text,
/// since the only consumer is the model's next turn.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolError>;
    async fn call_tool(&self, name: &str, args: Value) -> String;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>, // deterministic ordering
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn list(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|tool| tool.spec()).collect()
    }

    pub async fn invoke(&self, name: &str, args: Value) -> String {
        let Some(tool) = self.get(name) else {
            tracing::warn!(tool = %name, "model requested an unknown tool");
            return warning(format!("Unknown tool: {name}"));
        };
        tracing::info!(tool = %name, args = %args, "invoking tool");
        match tool.execute(args).await {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(tool = %name, error = %err, "tool failed");
                warning(format!("{name} failed: {err}"))
            }
        }
    }
}

#[async_trait]
impl ToolProvider for ToolRegistry {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolError> {
        Ok(self.specs())
    }

    async fn call_tool(&self, name: &str, args: Value) -> String {
        self.invoke(name, args).await
    }
}

/// Base URLs and credentials of the public APIs behind the built-in tools.
#[derive(Debug, Clone)]
pub struct ToolEndpoints {
    pub nominatim_url: String,
    pub geocoding_url: String,
    pub forecast_url: String,
    pub exchange_rate_url: String,
    pub exchange_rate_access_key: Option<String>,
    pub translation_url: String,
    pub translation_token: Option<String>,
    pub timeout: Duration,
}

impl Default for ToolEndpoints {
    fn default() -> Self {
        Self {
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            geocoding_url: "https://geocoding-api.open-meteo.com/v1".to_string(),
            forecast_url: "https://api.open-meteo.com/v1".to_string(),
            exchange_rate_url: "https://api.exchangerate.host".to_string(),
            exchange_rate_access_key: None,
            translation_url: "https://api-inference.huggingface.co/models".to_string(),
            translation_token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ToolError::InvalidArgs(format!("{key} missing")))
}

pub(crate) fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Accepts JSON numbers and numeric strings; models emit both.
pub(crate) fn number_arg(args: &Value, key: &str) -> Result<Option<f64>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ToolError::InvalidArgs(format!("{key} is not a number: {s}"))),
        Some(other) => Err(ToolError::InvalidArgs(format!(
            "{key} is not a number: {other}"
        ))),
    }
}

pub(crate) async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ToolError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(ToolError::Status(status.as_u16()));
    }
    resp.json::<T>()
        .await
        .map_err(|e| ToolError::InvalidResponse(e.to_string()))
}

pub(crate) fn request_error(err: reqwest::Error) -> ToolError {
    ToolError::Request(err.to_string())
}
