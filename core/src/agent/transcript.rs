use crate::traits::ChatTurn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    User,
    Assistant,
    System,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalMessage {
    pub id: String,
    pub kind: MessageKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// The display-side message list a front end folds loop events into.
/// The orchestration loop never reads or writes it.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<TerminalMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: MessageKind, content: impl Into<String>) -> &TerminalMessage {
        self.messages.push(TerminalMessage {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            content: content.into(),
            timestamp: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[TerminalMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// User and assistant messages with content, as model history.
    pub fn api_history(&self) -> Vec<ChatTurn> {
        self.messages
            .iter()
            .filter(|m| !m.content.is_empty())
            .filter_map(|m| match m.kind {
                MessageKind::User => Some(ChatTurn::user(m.content.clone())),
                MessageKind::Assistant => Some(ChatTurn::model(m.content.clone())),
                MessageKind::System | MessageKind::Error => None,
            })
            .collect()
    }
}
