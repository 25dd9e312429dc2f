//! `is_robot_online` tool — liveness probe that always answers.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use tumbller_types::ToolDefinition;

use crate::context::RobotToolContext;
use crate::tool::{RobotTool, ToolError};

pub struct IsRobotOnlineTool {
    ctx: Arc<RobotToolContext>,
    definition: ToolDefinition,
}

impl IsRobotOnlineTool {
    pub fn new(ctx: Arc<RobotToolContext>) -> Self {
        let definition = ToolDefinition {
            name: "is_robot_online".to_string(),
            description: "Check if the robot is online and reachable.".to_string(),
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
impl RobotTool for IsRobotOnlineTool {
    fn name(&self) -> &str {
        "is_robot_online"
    }

    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    /// Never fails: any link error is reported as `{"online": false}`.
    async fn execute(&self, _params: Value) -> Result<Value, ToolError> {
        let online = match self.ctx.link.send("/info").await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Robot liveness probe failed");
                false
            }
        };
        Ok(json!({ "online": online }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockLink;
    use tumbller_types::AutoStopRule;

    fn tool(link: &Arc<MockLink>) -> IsRobotOnlineTool {
        IsRobotOnlineTool::new(Arc::new(RobotToolContext::new(link.clone(), AutoStopRule::default())))
    }

    #[tokio::test]
    async fn test_online_when_info_answers() {
        let link = Arc::new(MockLink::ok(json!({"name": "tumbller"})));
        let result = tool(&link).execute(json!({})).await.unwrap();
        assert_eq!(result, json!({"online": true}));
        assert_eq!(link.calls(), vec!["/info"]);
    }

    #[tokio::test]
    async fn test_offline_instead_of_error() {
        let link = Arc::new(MockLink::failing("robot unreachable"));
        let result = tool(&link).execute(Value::Null).await.unwrap();
        assert_eq!(result, json!({"online": false}));
    }
}
