//! `move` tool — drive the robot in one direction.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};

use tumbller_types::{Direction, InvalidDirection, ToolDefinition};

use crate::context::RobotToolContext;
use crate::tool::{RobotTool, ToolError};

pub struct MoveTool {
    ctx: Arc<RobotToolContext>,
    definition: ToolDefinition,
}

impl MoveTool {
    pub fn new(ctx: Arc<RobotToolContext>) -> Self {
        let directions: Vec<&str> = Direction::ALL.iter().map(|d| d.as_str()).collect();
        let definition = ToolDefinition {
            name: "move".to_string(),
            description: "Move the robot in a given direction.\n\
                forward/back auto-stop after 2 seconds, left/right after 1 second,\n\
                stop halts motors immediately."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "direction": {
                        "type": "string",
                        "enum": directions,
                        "description": "Direction to move."
                    }
                },
                "required": ["direction"]
            }),
        };
        Self { ctx, definition }
    }
}

#[async_trait]
impl RobotTool for MoveTool {
    fn name(&self) -> &str {
        "move"
    }

    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let direction = match params.get("direction") {
            Some(Value::String(s)) => s.as_str(),
            Some(other) => return Err(InvalidDirection(other.to_string()).into()),
            None => {
                return Err(ToolError::InvalidArguments(
                    "Missing required parameter: direction".into(),
                ));
            }
        };

        self.ctx.policy.issue_move(direction).await
    }
}
