//! Robot tool implementations and the fixed tool catalog.
//!
//! Each tool implements [`RobotTool`] and reaches the robot through the
//! shared [`RobotToolContext`].

pub mod get_temperature_humidity;
pub mod is_robot_online;
pub mod move_robot;

use std::sync::Arc;

use tumbller_types::ToolDefinition;

use crate::context::RobotToolContext;
use crate::tool::RobotTool;

/// The closed set of tools the gateway exposes, in advertisement order.
///
/// Built once at startup and never mutated.
#[derive(Clone)]
pub struct ToolCatalog {
    tools: Vec<Arc<dyn RobotTool>>,
}

impl ToolCatalog {
    pub fn new(tools: Vec<Arc<dyn RobotTool>>) -> Self {
        Self { tools }
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn RobotTool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition().clone()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Create the robot tool catalog: `move`, `is_robot_online`,
/// `get_temperature_humidity`.
pub fn create_robot_tools(ctx: Arc<RobotToolContext>) -> ToolCatalog {
    let tools: Vec<Arc<dyn RobotTool>> = vec![
        Arc::new(move_robot::MoveTool::new(ctx.clone())),
        Arc::new(is_robot_online::IsRobotOnlineTool::new(ctx.clone())),
        Arc::new(get_temperature_humidity::GetTemperatureHumidityTool::new(ctx)),
    ];

    ToolCatalog::new(tools)
}
