use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod prompt;
mod trip;

pub use trip::{
    itinerary_lines, DashboardRequest, Season, Theme, TripRequest, BUDGET_CURRENCIES,
    TRANSLATION_TARGETS,
};

/// Prefix carried by every degraded tool result and partial answer.
pub const WARNING_MARKER: &str = "⚠️";

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 8;

pub fn warning<T: AsRef<str>>(message: T) -> String {
    format!("{WARNING_MARKER} {}", message.as_ref())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub max_tool_rounds: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "travel_planner".to_string(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }
}

/// Signature of a tool as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl ToolCall {
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// What the model produced on one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelReply {
    Answer {
        content: String,
    },
    ToolCalls {
        content: Option<String>,
        calls: Vec<ToolCall>,
    },
}

impl ModelReply {
    pub fn answer<T: Into<String>>(content: T) -> Self {
        Self::Answer {
            content: content.into(),
        }
    }

    /// Builds a reply from raw parts; an empty call list is a plain answer.
    pub fn from_parts(content: Option<String>, calls: Vec<ToolCall>) -> Self {
        if calls.is_empty() {
            Self::Answer {
                content: content.unwrap_or_default(),
            }
        } else {
            Self::ToolCalls { content, calls }
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Answer { content } => Some(content.as_str()),
            Self::ToolCalls { content, .. } => content.as_deref(),
        }
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Answer { .. } => &[],
            Self::ToolCalls { calls, .. } => calls,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        reply: ModelReply,
    },
    Tool {
        call_id: String,
        name: String,
        content: String,
    },
}

impl Message {
    pub fn system<T: Into<String>>(content: T) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn user<T: Into<String>>(content: T) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    pub fn assistant(reply: ModelReply) -> Self {
        Self::Assistant { reply }
    }

    pub fn tool_result<T: Into<String>>(call: &ToolCall, content: T) -> Self {
        Self::Tool {
            call_id: call.id.clone(),
            name: call.name.clone(),
            content: content.into(),
        }
    }

    pub fn requests_tools(&self) -> bool {
        matches!(
            self,
            Self::Assistant {
                reply: ModelReply::ToolCalls { .. }
            }
        )
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model failure: {0}")]
    Model(String),
    #[error("tool provider failure: {0}")]
    Tools(String),
    #[error("validation failed: {0}")]
    Validation(String),
}

impl AgentError {
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Text shown to the end user. Only validation messages are echoed verbatim.
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Validation(message) => warning(message),
            AgentError::Model(_) | AgentError::Tools(_) => {
                "❌ An error occurred while planning your trip. Please try again later.".to_string()
            }
        }
    }
}
