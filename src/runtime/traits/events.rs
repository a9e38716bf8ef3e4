// ABOUTME: Raw event feed subscription trait.
// ABOUTME: The feed is a boxed stream owned by whoever subscribed.

use crate::events::Event;
use futures::Stream;
use std::pin::Pin;

/// A live subscription to the runtime's event feed.
pub type EventFeed = Pin<Box<dyn Stream<Item = Result<Event, EventError>> + Send>>;

pub trait EventOps: Send + Sync {
    /// Subscribe to every event the runtime emits from now on.
    fn events(&self) -> EventFeed;
}

/// Errors from the event feed.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event stream error: {0}")]
    Stream(String),

    #[error("failed to decode event: {0}")]
    Decode(#[from] serde_json::Error),
}
