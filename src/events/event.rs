// ABOUTME: A single event from the runtime's feed.
// ABOUTME: Kept as the original JSON object; only type and actor are read.

use crate::types::ContainerId;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An event as received from the runtime.
///
/// The payload is never modified: what is emitted downstream is exactly
/// what was decoded from the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Value);

impl Event {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// The event type used to look up interceptors, e.g. `start` or `die`.
    ///
    /// Reads `Action`, falling back to the legacy `status` field.
    pub fn kind(&self) -> Option<&str> {
        self.0
            .get("Action")
            .or_else(|| self.0.get("status"))
            .and_then(Value::as_str)
    }

    /// ID of the object the event is about (`Actor.ID`, or legacy `id`).
    pub fn actor_id(&self) -> Option<ContainerId> {
        self.0
            .get("Actor")
            .and_then(|actor| actor.get("ID"))
            .or_else(|| self.0.get("id"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(ContainerId::new)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// One JSON object followed by a newline, as sent to subscribers.
    pub fn to_line(&self) -> Result<Bytes, serde_json::Error> {
        let mut line = serde_json::to_vec(&self.0)?;
        line.push(b'\n');
        Ok(Bytes::from(line))
    }
}
