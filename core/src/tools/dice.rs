use crate::traits::Tool;
use async_trait::async_trait;
use rand::Rng;
use serde_json::{Map, Value, json};

pub struct RollDiceTool;

#[async_trait]
impl Tool for RollDiceTool {
    fn name(&self) -> &str {
        "roll_dice"
    }

    fn description(&self) -> &str {
        "Roll a standard d6 die"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "OBJECT",
            "properties": {}
        })
    }

    async fn execute(&self, _args: Map<String, Value>) -> anyhow::Result<Value> {
        let roll: u32 = rand::rng().random_range(1..=6);
        Ok(json!({ "result": roll }))
    }
}
