pub mod consumer;
pub mod loop_;
pub mod registry;
pub mod transcript;

pub use consumer::{FnConsumer, StreamConsumer};
pub use loop_::{AgentLoop, ChatSubmission};
pub use registry::{ToolRegistry, ToolServer};
pub use transcript::{MessageKind, TerminalMessage, Transcript};
