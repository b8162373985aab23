use thiserror::Error;

/// Failures that end a chat submission and reach the caller of the loop.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Missing or rejected credential. Never retried.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Network, quota or decoding failure while talking to the model service.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The model kept requesting tools past the configured turn cap.
    #[error("Turn limit reached: model still requesting tools after {0} turns")]
    TurnLimit(usize),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChatError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::transport(format!("request timed out: {err}"));
        }
        Self::transport(err.to_string())
    }
}

/// Tool-level failures. These never unwind out of the orchestration loop;
/// they are reported back to the model as data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("Tool '{0}' not found")]
    NotFound(String),

    #[error("{0}")]
    Execution(String),
}

pub type Result<T, E = ChatError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_message_is_verbatim() {
        let err = ChatError::transport("quota exceeded");
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "Transport error: quota exceeded");
    }

    #[test]
    fn tool_not_found_names_the_tool() {
        let err = ToolError::NotFound("nonexistent".into());
        assert_eq!(err.to_string(), "Tool 'nonexistent' not found");
    }
}
