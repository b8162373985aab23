use crate::tools::extract_string_arg;
use crate::traits::Tool;
use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use serde_json::{Map, Value, json};

pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Get the current time in a specific timezone"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "timezone": {
                    "type": "STRING",
                    "description": "The timezone to get the time for (e.g., 'UTC', 'America/New_York')"
                }
            },
            "required": ["timezone"]
        })
    }

    async fn execute(&self, args: Map<String, Value>) -> anyhow::Result<Value> {
        let timezone = extract_string_arg(&args, "timezone")?;

        // An unknown zone is an answer the model can act on, not a failure.
        match timezone.parse::<Tz>() {
            Ok(tz) => {
                let now = Utc::now().with_timezone(&tz);
                Ok(json!({ "time": now.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string() }))
            }
            Err(_) => Ok(json!({ "error": format!("Invalid timezone: {}", timezone) })),
        }
    }
}
