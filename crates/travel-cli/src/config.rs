//! Runtime configuration, read once from the environment (and `.env`).
//!
//! - `OPENROUTER_API_KEY`: required to plan. Not needed by `tool-server` or `tools`.
//! - `LLM_BASE_URL`, `LLM_MODEL`, `LLM_TEMPERATURE`, `LLM_MAX_TOKENS`: chat model settings.
//! - `HOST`, `PORT`: web front end address. Defaults to `127.0.0.1:8501`.
//! - `TOOL_SERVER_PORT`: port of the `tool-server` subcommand. Defaults to `8000`.
//! - `TOOL_SERVER_URL`: when set, tools are consumed from that tool server
//!   instead of running in-process.
//! - `MAX_TOOL_ROUNDS`: tool round-trips allowed per plan. Defaults to `8`.
//! - `PLAN_STORE_CAPACITY`: dashboard plans kept for download. Defaults to `64`.
//! - `HTTP_TIMEOUT_SECS`: timeout of tool HTTP calls. Defaults to `30`.
//! - `NOMINATIM_URL`, `OPEN_METEO_GEOCODING_URL`, `OPEN_METEO_FORECAST_URL`,
//!   `EXCHANGE_RATE_URL`, `EXCHANGE_RATE_ACCESS_KEY`, `TRANSLATION_URL`,
//!   `HF_API_TOKEN`: overrides for the public APIs behind the tools.

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use travel_core::DEFAULT_MAX_TOOL_ROUNDS;
use travel_models::ChatModelConfig;
use travel_tools::ToolEndpoints;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub host: String,
    pub port: u16,
    pub tool_server_port: u16,
    pub tool_server_url: Option<String>,
    pub max_tool_rounds: usize,
    pub plan_store_capacity: usize,
    pub endpoints: ToolEndpoints,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let model_defaults = ChatModelConfig::default();
        let endpoint_defaults = ToolEndpoints::default();

        let timeout_secs: u64 = parse_or(&get, "HTTP_TIMEOUT_SECS", 30)?;
        let endpoints = ToolEndpoints {
            nominatim_url: get("NOMINATIM_URL").unwrap_or(endpoint_defaults.nominatim_url),
            geocoding_url: get("OPEN_METEO_GEOCODING_URL").unwrap_or(endpoint_defaults.geocoding_url),
            forecast_url: get("OPEN_METEO_FORECAST_URL").unwrap_or(endpoint_defaults.forecast_url),
            exchange_rate_url: get("EXCHANGE_RATE_URL").unwrap_or(endpoint_defaults.exchange_rate_url),
            exchange_rate_access_key: get("EXCHANGE_RATE_ACCESS_KEY"),
            translation_url: get("TRANSLATION_URL").unwrap_or(endpoint_defaults.translation_url),
            translation_token: get("HF_API_TOKEN"),
            timeout: Duration::from_secs(timeout_secs),
        };

        let max_tool_rounds = parse_or(&get, "MAX_TOOL_ROUNDS", DEFAULT_MAX_TOOL_ROUNDS)?;
        if max_tool_rounds == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_TOOL_ROUNDS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api_key: get("OPENROUTER_API_KEY"),
            llm_base_url: get("LLM_BASE_URL").unwrap_or(model_defaults.base_url),
            llm_model: get("LLM_MODEL").unwrap_or(model_defaults.model),
            temperature: parse_or(&get, "LLM_TEMPERATURE", model_defaults.temperature)?,
            max_tokens: parse_or(&get, "LLM_MAX_TOKENS", model_defaults.max_tokens)?,
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&get, "PORT", 8501)?,
            tool_server_port: parse_or(&get, "TOOL_SERVER_PORT", 8000)?,
            tool_server_url: get("TOOL_SERVER_URL"),
            max_tool_rounds,
            plan_store_capacity: parse_or(&get, "PLAN_STORE_CAPACITY", 64)?,
            endpoints,
        })
    }

    pub fn chat_model_config(&self) -> Result<ChatModelConfig, ConfigError> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENROUTER_API_KEY".to_string()))?;
        Ok(ChatModelConfig {
            base_url: self.llm_base_url.clone(),
            api_key,
            model: self.llm_model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            ..ChatModelConfig::default()
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
