//! tumbller-tools: the robot tool catalog and motor command policy.
//!
//! Provides:
//! - `RobotTool` trait and `ToolError`
//! - `CommandPolicy`: direction validation and single-shot motor dispatch
//! - The three robot tools (`move`, `is_robot_online`,
//!   `get_temperature_humidity`) and the `ToolCatalog` that holds them
//! - Tool context for shared access to the robot link

pub mod context;
pub mod policy;
pub mod tool;
pub mod tools;

#[cfg(test)]
mod test_support;

pub use context::RobotToolContext;
pub use policy::CommandPolicy;
pub use tool::{RobotTool, ToolError};
pub use tools::{ToolCatalog, create_robot_tools};
