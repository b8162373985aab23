//! In-process provider that replays scripted turns and records what the
//! loop sends. Used by the loop tests and available to downstream crates.

use crate::error::{ChatError, Result};
use crate::traits::{
    ChatTurn, EventStream, FunctionCallRequest, Provider, Session, SessionConfig, SessionMessage,
    StreamEvent,
};
use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type ScriptedTurn = Vec<std::result::Result<StreamEvent, String>>;

#[derive(Default)]
struct Recorded {
    configs: Vec<SessionConfig>,
    histories: Vec<Vec<ChatTurn>>,
    messages: Vec<SessionMessage>,
}

#[derive(Clone)]
pub struct ScriptedProvider {
    turns: Arc<Mutex<VecDeque<ScriptedTurn>>>,
    recorded: Arc<Mutex<Recorded>>,
    authenticated: bool,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            turns: Arc::new(Mutex::new(VecDeque::new())),
            recorded: Arc::new(Mutex::new(Recorded::default())),
            authenticated: true,
        }
    }

    /// Behaves like a provider with no credential configured.
    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            ..Self::new()
        }
    }

    pub fn then_events(self, events: Vec<StreamEvent>) -> Self {
        self.push_turn(events.into_iter().map(Ok).collect());
        self
    }

    pub fn then_text(self, deltas: &[&str]) -> Self {
        self.then_events(
            deltas
                .iter()
                .map(|d| StreamEvent::TextDelta(d.to_string()))
                .collect(),
        )
    }

    pub fn then_calls(self, calls: Vec<FunctionCallRequest>) -> Self {
        self.then_events(vec![StreamEvent::FunctionCalls(calls)])
    }

    /// A turn that yields `events` and then fails with a transport error.
    pub fn then_failure(self, events: Vec<StreamEvent>, message: impl Into<String>) -> Self {
        let mut turn: ScriptedTurn = events.into_iter().map(Ok).collect();
        turn.push(Err(message.into()));
        self.push_turn(turn);
        self
    }

    fn push_turn(&self, turn: ScriptedTurn) {
        if let Ok(mut turns) = self.turns.lock() {
            turns.push_back(turn);
        }
    }

    pub fn sent_messages(&self) -> Vec<SessionMessage> {
        self.recorded
            .lock()
            .map(|r| r.messages.clone())
            .unwrap_or_default()
    }

    pub fn opened_configs(&self) -> Vec<SessionConfig> {
        self.recorded
            .lock()
            .map(|r| r.configs.clone())
            .unwrap_or_default()
    }

    pub fn opened_histories(&self) -> Vec<Vec<ChatTurn>> {
        self.recorded
            .lock()
            .map(|r| r.histories.clone())
            .unwrap_or_default()
    }
}

pub fn call(id: &str, name: &str, args: Value) -> FunctionCallRequest {
    FunctionCallRequest {
        id: id.to_string(),
        name: name.to_string(),
        args: args.as_object().cloned().unwrap_or_else(Map::new),
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn open_session(
        &self,
        config: SessionConfig,
        history: Vec<ChatTurn>,
    ) -> Result<Box<dyn Session>> {
        if !self.authenticated {
            return Err(ChatError::Authentication("API key is missing".to_string()));
        }
        if let Ok(mut recorded) = self.recorded.lock() {
            recorded.configs.push(config);
            recorded.histories.push(history);
        }
        Ok(Box::new(ScriptedSession {
            provider: self.clone(),
        }))
    }
}

struct ScriptedSession {
    provider: ScriptedProvider,
}

#[async_trait]
impl Session for ScriptedSession {
    async fn send_and_stream(&mut self, message: SessionMessage) -> Result<EventStream> {
        if let Ok(mut recorded) = self.provider.recorded.lock() {
            recorded.messages.push(message);
        }

        let turn = self
            .provider
            .turns
            .lock()
            .ok()
            .and_then(|mut turns| turns.pop_front())
            .unwrap_or_default();

        Ok(stream::iter(turn.into_iter().map(|item| item.map_err(ChatError::transport))).boxed())
    }
}
