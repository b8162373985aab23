use crate::tools::extract_string_arg;
use crate::traits::Tool;
use async_trait::async_trait;
use rand::Rng;
use serde_json::{Map, Value, json};

const CONDITIONS: &[&str] = &["Sunny", "Cloudy", "Rainy", "Stormy"];

/// Simulated weather; there is no upstream service.
pub struct WeatherTool;

fn simulate(city: &str) -> Value {
    let mut rng = rand::rng();
    let condition = CONDITIONS[rng.random_range(0..CONDITIONS.len())];
    let temperature: u32 = rng.random_range(10..40);
    let humidity: u32 = rng.random_range(50..100);

    json!({
        "city": city,
        "condition": condition,
        "temperature": format!("{temperature}°C"),
        "humidity": format!("{humidity}%"),
    })
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the simulated weather for a city"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "city": {
                    "type": "STRING",
                    "description": "The city name"
                }
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, args: Map<String, Value>) -> anyhow::Result<Value> {
        let city = extract_string_arg(&args, "city")?;
        Ok(simulate(&city))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_values_stay_in_range() {
        for _ in 0..50 {
            let value = simulate("Oslo");
            assert_eq!(value["city"], "Oslo");
            assert!(CONDITIONS.contains(&value["condition"].as_str().unwrap()));

            let temp = value["temperature"].as_str().unwrap();
            let temp: u32 = temp.trim_end_matches("°C").parse().unwrap();
            assert!((10..40).contains(&temp));

            let humidity = value["humidity"].as_str().unwrap();
            let humidity: u32 = humidity.trim_end_matches('%').parse().unwrap();
            assert!((50..100).contains(&humidity));
        }
    }
}
