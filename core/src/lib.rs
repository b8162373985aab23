pub mod agent;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod tools;
pub mod traits;

pub use agent::{
    AgentLoop, ChatSubmission, FnConsumer, StreamConsumer, ToolRegistry, ToolServer,
    Transcript,
};
pub use config::*;
pub use error::{ChatError, ToolError};
pub use models::ModelTier;
pub use providers::*;
pub use tools::*;
pub use traits::*;
