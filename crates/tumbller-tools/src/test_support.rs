use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use tumbller_link::{LinkError, RobotLink};

/// In-process robot that records every requested path.
pub(crate) struct MockLink {
    response: Result<Value, String>,
    calls: Mutex<Vec<String>>,
}

impl MockLink {
    pub(crate) fn ok(body: Value) -> Self {
        Self {
            response: Ok(body),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(cause: &str) -> Self {
        Self {
            response: Err(cause.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RobotLink for MockLink {
    async fn send(&self, path: &str) -> Result<Value, LinkError> {
        self.calls.lock().unwrap().push(path.to_string());
        self.response
            .clone()
            .map_err(|cause| LinkError::new(path, cause))
    }
}
