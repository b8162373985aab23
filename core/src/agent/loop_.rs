use crate::agent::{StreamConsumer, ToolRegistry};
use crate::config::DEFAULT_MAX_TURNS;
use crate::error::{ChatError, Result};
use crate::models::ModelTier;
use crate::traits::{
    ChatTurn, FunctionCallRequest, FunctionCallResponse, Provider, SessionConfig, SessionMessage,
    StreamEvent,
};
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Everything the caller decides for one chat submission.
#[derive(Debug, Clone)]
pub struct ChatSubmission {
    pub tier: ModelTier,
    pub prompt: String,
    pub history: Vec<ChatTurn>,
    pub system_instruction: Option<String>,
    pub tools_enabled: bool,
}

impl ChatSubmission {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            tier: ModelTier::default(),
            prompt: prompt.into(),
            history: Vec::new(),
            system_instruction: None,
            tools_enabled: true,
        }
    }
}

/// Drives one submission through stream → tool dispatch → continuation
/// until the model answers without requesting tools.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    tool_registry: Arc<ToolRegistry>,
    max_turns: usize,
}

impl AgentLoop {
    pub fn new(provider: Arc<dyn Provider>, tool_registry: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            tool_registry,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Caps transport turns per submission. 0 removes the cap, in which case
    /// a model that never stops requesting tools keeps the loop alive forever.
    pub fn with_max_turns(mut self, max: usize) -> Self {
        self.max_turns = max;
        self
    }

    pub fn tool_registry(&self) -> &ToolRegistry {
        &self.tool_registry
    }

    fn session_config(&self, submission: &ChatSubmission) -> SessionConfig {
        SessionConfig {
            model_id: submission.tier.model_id().to_string(),
            system_instruction: submission.system_instruction.clone(),
            thinking_budget: submission.tier.thinking_budget(),
            tool_schemas: if submission.tools_enabled {
                self.tool_registry.export_schemas()
            } else {
                Vec::new()
            },
        }
    }

    /// Returns the concatenation of every text delta across all turns.
    /// Only authentication and transport failures escape; text already
    /// handed to the consumer stays delivered.
    pub async fn stream_chat(
        &self,
        submission: ChatSubmission,
        consumer: &mut dyn StreamConsumer,
    ) -> Result<String> {
        let config = self.session_config(&submission);
        let mut session = self
            .provider
            .open_session(config, submission.history)
            .await?;

        let mut message = SessionMessage::Prompt(submission.prompt);
        let mut full_text = String::new();
        let mut turns = 0;

        loop {
            turns += 1;
            debug!("Starting turn {}", turns);

            let mut events = session.send_and_stream(message).await?;
            let text_before = full_text.len();
            let mut pending_calls: Vec<FunctionCallRequest> = Vec::new();

            while let Some(event) = events.next().await {
                match event? {
                    StreamEvent::TextDelta(delta) => {
                        full_text.push_str(&delta);
                        consumer.on_text_chunk(&delta);
                    }
                    StreamEvent::FunctionCalls(batch) => pending_calls.extend(batch),
                }
            }

            debug!(
                "Turn {} finished: {} chars, {} function calls",
                turns,
                full_text.len() - text_before,
                pending_calls.len()
            );

            if pending_calls.is_empty() {
                return Ok(full_text);
            }

            if self.max_turns > 0 && turns >= self.max_turns {
                warn!(
                    "Model still requesting {} tools after {} turns, giving up",
                    pending_calls.len(),
                    turns
                );
                return Err(ChatError::TurnLimit(turns));
            }

            let responses = self.dispatch_tools(pending_calls, consumer).await;
            message = SessionMessage::FunctionResponses(responses);
        }
    }

    async fn dispatch_tools(
        &self,
        calls: Vec<FunctionCallRequest>,
        consumer: &mut dyn StreamConsumer,
    ) -> Vec<FunctionCallResponse> {
        let mut responses = Vec::with_capacity(calls.len());

        for call in calls {
            consumer.on_tool_start(&call.name, &call.args);
            debug!("Executing tool '{}' (call {})", call.name, call.id);

            let response = match self.tool_registry.execute(&call.name, call.args).await {
                Ok(result) => FunctionCallResponse::success(call.id, call.name, result),
                Err(e) => {
                    warn!("Tool '{}' failed: {}", call.name, e);
                    FunctionCallResponse::error(call.id, call.name, e.to_string())
                }
            };

            consumer.on_tool_finish(&response);
            responses.push(response);
        }

        responses
    }
}
