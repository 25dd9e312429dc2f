//! The `RobotTool` trait and the error type shared by every tool.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use tumbller_link::LinkError;
use tumbller_types::{InvalidDirection, ToolDefinition};

/// Reasons a tool invocation can fail.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The direction argument is outside the recognized set. Raised before
    /// any robot request.
    #[error(transparent)]
    InvalidDirection(#[from] InvalidDirection),
    /// Arguments are missing or have the wrong shape.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// The robot request failed; the physical action may not have happened.
    #[error(transparent)]
    Link(#[from] LinkError),
}

/// A named, schema-described operation callable through the gateway.
#[async_trait]
pub trait RobotTool: Send + Sync {
    fn name(&self) -> &str;

    fn definition(&self) -> &ToolDefinition;

    /// Run the tool with JSON `params` and return its structured result.
    async fn execute(&self, params: Value) -> Result<Value, ToolError>;
}
