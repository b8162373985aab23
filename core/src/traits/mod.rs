pub mod provider;
pub mod tool;

pub use provider::{
    ChatTurn, EventStream, FunctionCallRequest, FunctionCallResponse, Part, Provider, Role,
    Session, SessionConfig, SessionMessage, StreamEvent,
};
pub use tool::{Tool, ToolSpec};
