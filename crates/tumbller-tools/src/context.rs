//! Robot tool context — shared state available to every tool.

use std::sync::Arc;

use tumbller_link::RobotLink;
use tumbller_types::AutoStopRule;

use crate::policy::CommandPolicy;

/// Read-only state handed to each tool at construction time.
///
/// Built once at startup; concurrent invocations share it without locking.
#[derive(Clone)]
pub struct RobotToolContext {
    /// Link to the robot's HTTP control surface.
    pub link: Arc<dyn RobotLink>,
    /// Motor command policy layered on the same link.
    pub policy: CommandPolicy,
}

impl RobotToolContext {
    pub fn new(link: Arc<dyn RobotLink>, rule: AutoStopRule) -> Self {
        let policy = CommandPolicy::new(link.clone(), rule);
        Self { link, policy }
    }
}
