use crate::agent::ToolServer;
use serde_json::{Map, Value};

pub mod current_time;
pub mod dice;
pub mod weather;

pub use current_time::CurrentTimeTool;
pub use dice::RollDiceTool;
pub use weather::WeatherTool;

pub const STANDARD_SERVER_NAME: &str = "standard-utils";

/// The built-in local tool server registered at start-up.
pub fn standard_server() -> ToolServer {
    ToolServer::new(STANDARD_SERVER_NAME)
        .with_tool(CurrentTimeTool)
        .with_tool(WeatherTool)
        .with_tool(RollDiceTool)
}

pub fn extract_string_arg(args: &Map<String, Value>, key: &str) -> anyhow::Result<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' parameter", key))
        .map(|s| s.to_string())
}
