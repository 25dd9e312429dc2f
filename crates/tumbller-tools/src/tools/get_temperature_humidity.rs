//! `get_temperature_humidity` tool — read the onboard SHT3x sensor.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use tumbller_types::ToolDefinition;

use crate::context::RobotToolContext;
use crate::tool::{RobotTool, ToolError};

pub struct GetTemperatureHumidityTool {
    ctx: Arc<RobotToolContext>,
    definition: ToolDefinition,
}

impl GetTemperatureHumidityTool {
    pub fn new(ctx: Arc<RobotToolContext>) -> Self {
        let definition = ToolDefinition {
            name: "get_temperature_humidity".to_string(),
            description: "Read temperature (C) and humidity (%) from the onboard SHT3x sensor."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        };
        Self { ctx, definition }
    }
}

#[async_trait]
impl RobotTool for GetTemperatureHumidityTool {
    fn name(&self) -> &str {
        "get_temperature_humidity"
    }

    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, _params: Value) -> Result<Value, ToolError> {
        Ok(self.ctx.link.send("/sensor/ht").await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockLink;
    use tumbller_types::AutoStopRule;

    fn tool(link: &Arc<MockLink>) -> GetTemperatureHumidityTool {
        GetTemperatureHumidityTool::new(Arc::new(RobotToolContext::new(
            link.clone(),
            AutoStopRule::default(),
        )))
    }

    #[tokio::test]
    async fn test_forwards_sensor_reading() {
        let reading = json!({"temperature": 23.1, "humidity": 38.4});
        let link = Arc::new(MockLink::ok(reading.clone()));
        let result = tool(&link).execute(json!({})).await.unwrap();
        assert_eq!(result, reading);
        assert_eq!(link.calls(), vec!["/sensor/ht"]);
    }

    #[tokio::test]
    async fn test_link_failure_is_not_masked() {
        let link = Arc::new(MockLink::failing("timed out after 5s"));
        let err = tool(&link).execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::Link(_)));
    }
}
