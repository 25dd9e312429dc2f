use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ──────────────────── Motion Types ────────────────────

/// A drive direction understood by the robot's motor endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Back,
    Left,
    Right,
    Stop,
}

impl Direction {
    /// Every direction, in the order advertised to clients.
    pub const ALL: [Direction; 5] = [
        Direction::Forward,
        Direction::Back,
        Direction::Left,
        Direction::Right,
        Direction::Stop,
    ];

    /// Wire name, as used in the `/motor/{direction}` path and tool arguments.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Back => "back",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Stop => "stop",
        }
    }

    /// Robot endpoint that actuates this direction.
    pub fn motor_path(&self) -> String {
        format!("/motor/{}", self.as_str())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A direction string outside the recognized set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid direction '{0}': expected one of forward, back, left, right, stop")]
pub struct InvalidDirection(pub String);

impl FromStr for Direction {
    type Err = InvalidDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| InvalidDirection(s.to_string()))
    }
}

/// How long the robot firmware keeps the motors running after a move command
/// before halting on its own.
///
/// The gateway never enforces these durations itself; they describe the
/// downstream controller's behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoStopRule {
    /// Duration for `forward` and `back`.
    pub linear: Duration,
    /// Duration for `left` and `right`.
    pub turn: Duration,
}

impl AutoStopRule {
    /// Auto-stop duration for `direction`; `None` for `stop`.
    pub fn duration_for(&self, direction: Direction) -> Option<Duration> {
        match direction {
            Direction::Forward | Direction::Back => Some(self.linear),
            Direction::Left | Direction::Right => Some(self.turn),
            Direction::Stop => None,
        }
    }
}

impl Default for AutoStopRule {
    fn default() -> Self {
        Self {
            linear: Duration::from_secs(2),
            turn: Duration::from_secs(1),
        }
    }
}

/// A single motor command, alive only for the duration of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub direction: Direction,
    pub issued_at: DateTime<Utc>,
}

impl Command {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            issued_at: Utc::now(),
        }
    }
}

// ──────────────────── Tool Types ────────────────────

/// Descriptor of a callable tool as advertised over MCP `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Tool name (e.g. "move").
    pub name: String,
    /// Human-readable description shown to the calling model.
    pub description: String,
    /// JSON Schema of the tool arguments.
    pub input_schema: serde_json::Value,
}
