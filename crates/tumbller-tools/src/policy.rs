//! Command policy for motor actuation.
//!
//! Validates the requested direction and dispatches exactly one motor request
//! per call. Timed halts are the robot firmware's job: after a `forward` or
//! `back` command the motors stop on their own after 2 seconds, after `left`
//! or `right` after 1 second. No delayed stop is scheduled here, so an
//! explicit `stop` never races a pending one.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use tumbller_link::RobotLink;
use tumbller_types::{AutoStopRule, Command, Direction};

use crate::tool::ToolError;

/// Dispatches validated motor commands to the robot.
#[derive(Clone)]
pub struct CommandPolicy {
    link: Arc<dyn RobotLink>,
    rule: AutoStopRule,
}

impl CommandPolicy {
    pub fn new(link: Arc<dyn RobotLink>, rule: AutoStopRule) -> Self {
        Self { link, rule }
    }

    /// Parse `direction` and issue the matching motor command.
    ///
    /// Unknown directions fail with [`ToolError::InvalidDirection`] before
    /// the robot is contacted.
    pub async fn issue_move(&self, direction: &str) -> Result<Value, ToolError> {
        let direction: Direction = direction.parse()?;
        self.dispatch(direction).await
    }

    /// Issue one motor request for an already-validated direction.
    ///
    /// `stop` is always immediate; stopping a robot that is already at rest
    /// is answered by the firmware like any other stop.
    pub async fn dispatch(&self, direction: Direction) -> Result<Value, ToolError> {
        let command = Command::new(direction);
        let auto_stop_secs = self.rule.duration_for(direction).map(|d| d.as_secs_f32());
        info!(
            direction = %command.direction,
            issued_at = %command.issued_at,
            auto_stop_secs = ?auto_stop_secs,
            "Dispatching motor command"
        );

        let result = self.link.send(&direction.motor_path()).await?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockLink;
    use serde_json::json;

    fn policy(link: &Arc<MockLink>) -> CommandPolicy {
        CommandPolicy::new(link.clone(), AutoStopRule::default())
    }

    #[tokio::test]
    async fn test_each_direction_hits_one_endpoint() {
        for direction in Direction::ALL {
            let link = Arc::new(MockLink::ok(json!({"direction": direction.as_str()})));
            let result = policy(&link).issue_move(direction.as_str()).await.unwrap();

            assert_eq!(link.calls(), vec![format!("/motor/{direction}")]);
            assert_eq!(result, json!({"direction": direction.as_str()}));
        }
    }

    #[tokio::test]
    async fn test_invalid_direction_makes_no_request() {
        let link = Arc::new(MockLink::ok(json!({})));
        let err = policy(&link).issue_move("jump").await.unwrap_err();

        assert!(matches!(err, ToolError::InvalidDirection(_)));
        assert!(link.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stop_twice_is_not_an_error() {
        let link = Arc::new(MockLink::ok(json!({"status": "stopped"})));
        let policy = policy(&link);

        assert!(policy.issue_move("stop").await.is_ok());
        assert!(policy.issue_move("stop").await.is_ok());
        assert_eq!(link.calls(), vec!["/motor/stop", "/motor/stop"]);
    }

    #[tokio::test]
    async fn test_link_failure_propagates() {
        let link = Arc::new(MockLink::failing("robot unreachable"));
        let err = policy(&link).issue_move("forward").await.unwrap_err();

        assert!(matches!(err, ToolError::Link(_)));
        assert!(err.to_string().contains("robot unreachable"));
        assert_eq!(link.calls(), vec!["/motor/forward"]);
    }
}
