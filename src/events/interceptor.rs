// ABOUTME: Decision handlers keyed by event type.
// ABOUTME: The table is built once before listening and read-only afterwards.

use super::Event;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// What happens to an intercepted event.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Forward the event unchanged.
    Emit(Event),
    /// Suppress the event; no subscriber sees it.
    Drop,
}

/// Decides the fate of one event.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn handle(&self, event: Event) -> Decision;
}

/// Interceptor backed by a synchronous closure.
pub struct FnInterceptor<F>(F);

/// Wrap a closure as an `Interceptor`.
pub fn from_fn<F>(f: F) -> FnInterceptor<F>
where
    F: Fn(Event) -> Decision + Send + Sync,
{
    FnInterceptor(f)
}

#[async_trait]
impl<F> Interceptor for FnInterceptor<F>
where
    F: Fn(Event) -> Decision + Send + Sync,
{
    async fn handle(&self, event: Event) -> Decision {
        (self.0)(event)
    }
}

/// Event type → handler. At most one handler per type.
#[derive(Clone, Default)]
pub struct Interceptors {
    handlers: HashMap<String, Arc<dyn Interceptor>>,
}

impl Interceptors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`, replacing any earlier one.
    pub fn intercept(mut self, kind: impl Into<String>, handler: impl Interceptor + 'static) -> Self {
        self.handlers.insert(kind.into(), Arc::new(handler));
        self
    }

    /// Run the handler registered for the event's type.
    ///
    /// Events whose type has no handler are emitted as-is.
    pub async fn apply(&self, event: Event) -> Decision {
        match event.kind().and_then(|kind| self.handlers.get(kind)) {
            Some(handler) => handler.handle(event).await,
            None => Decision::Emit(event),
        }
    }
}

impl std::fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("Interceptors").field("kinds", &kinds).finish()
    }
}
