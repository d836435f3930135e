use serde::{Deserialize, Serialize};

/// Opaque session value returned by the service and echoed back on the next
/// call. Its structure is never inspected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session(serde_json::Value);

impl Session {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_json(self) -> serde_json::Value {
        self.0
    }
}
