use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire-facing description of a tool: what the model sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Schema in the `{type: "OBJECT", properties, required}` shape.
    fn parameters_schema(&self) -> Value;

    /// Runs the tool body. Any error, including rejected arguments, is
    /// reported to the model as the call's `error` field.
    async fn execute(&self, args: Map<String, Value>) -> anyhow::Result<Value>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}
