use crate::error::Result;
use crate::traits::ToolSpec;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// One entry of conversation history. History order is conversation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part { text: text.into() }],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallRequest {
    pub id: String,
    pub name: String,
    pub args: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallResponse {
    pub id: String,
    pub name: String,
    pub outcome: std::result::Result<Value, String>,
}

impl FunctionCallResponse {
    pub fn success(id: impl Into<String>, name: impl Into<String>, result: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            outcome: Ok(result),
        }
    }

    pub fn error(id: impl Into<String>, name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            outcome: Err(error.into()),
        }
    }

    /// `{"result": ..}` or `{"error": ..}`, the body the model receives.
    pub fn payload(&self) -> Value {
        match &self.outcome {
            Ok(result) => json!({ "result": result }),
            Err(error) => json!({ "error": error }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    TextDelta(String),
    FunctionCalls(Vec<FunctionCallRequest>),
}

/// What a session turn carries: a fresh prompt or the results of the
/// previous turn's function calls.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionMessage {
    Prompt(String),
    FunctionResponses(Vec<FunctionCallResponse>),
}

/// Fixed for the lifetime of one chat submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub model_id: String,
    pub system_instruction: Option<String>,
    /// 0 leaves thinking out of the request entirely.
    pub thinking_budget: u32,
    /// Empty means the request carries no tools.
    pub tool_schemas: Vec<ToolSpec>,
}

pub type EventStream = BoxStream<'static, Result<StreamEvent>>;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Fails with `ChatError::Authentication` before any network traffic
    /// when no credential is configured.
    async fn open_session(
        &self,
        config: SessionConfig,
        history: Vec<ChatTurn>,
    ) -> Result<Box<dyn Session>>;
}

/// A live conversational context.
///
/// Each returned stream is finite and must be drained before the next
/// `send_and_stream` call; starting a new turn while a previous stream is
/// still being consumed is undefined behavior.
#[async_trait]
pub trait Session: Send {
    async fn send_and_stream(&mut self, message: SessionMessage) -> Result<EventStream>;
}
