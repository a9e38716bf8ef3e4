// ABOUTME: Consumes the raw event feed and redistributes decided events.
// ABOUTME: Serves the filtered feed as a streaming HTTP response, one JSON event per chunk.

use super::{Decision, Event, Interceptors};
use crate::body::{Body, BoxError};
use crate::runtime::{EventError, EventFeed, EventOps};
use crate::shutdown::{Shutdown, ShutdownSignal};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::Response;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Events buffered per subscriber before the oldest are discarded.
pub const SUBSCRIBER_BUFFER: usize = 1024;

/// Lifecycle of a distributor's feed subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Listening,
    Stopped,
}

#[derive(Debug, thiserror::Error)]
pub enum DistributorError {
    #[error("distributor is already listening or has stopped")]
    AlreadyListening,

    #[error("runtime event feed closed")]
    FeedClosed,
}

/// Owns the raw feed subscription and the interceptor table.
pub struct Distributor {
    feed: Mutex<Option<EventFeed>>,
    interceptors: Interceptors,
    sender: broadcast::Sender<Bytes>,
    shutdown: Shutdown,
    state: Mutex<State>,
}

impl Distributor {
    /// Subscribe to the runtime's event feed.
    pub fn new(runtime: &impl EventOps, interceptors: Interceptors) -> Self {
        Self::with_feed(runtime.events(), interceptors)
    }

    pub fn with_feed(feed: EventFeed, interceptors: Interceptors) -> Self {
        let (sender, _) = broadcast::channel(SUBSCRIBER_BUFFER);
        Self {
            feed: Mutex::new(Some(feed)),
            interceptors,
            sender,
            shutdown: Shutdown::new(),
            state: Mutex::new(State::Idle),
        }
    }

    pub fn state(&self) -> State {
        *self.state.lock()
    }

    /// Number of connected filtered-feed subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Ask `listen` to return and end every subscriber stream.
    ///
    /// A handler that is already running is not interrupted; the loop exits
    /// once its decision has been applied.
    pub fn stop(&self) {
        self.shutdown.trigger();
    }

    /// Process the raw feed until `stop` is called or the feed ends.
    ///
    /// Each event is fully decided and forwarded before the next one is read.
    pub async fn listen(&self) -> Result<(), DistributorError> {
        let mut feed = self
            .feed
            .lock()
            .take()
            .ok_or(DistributorError::AlreadyListening)?;
        *self.state.lock() = State::Listening;

        let mut stop = self.shutdown.signal();
        tracing::info!(intercepted = ?self.interceptors, "Listening...");

        let result = loop {
            let item = tokio::select! {
                biased;
                _ = stop.wait() => break Ok(()),
                item = feed.next() => item,
            };

            match item {
                Some(Ok(event)) => self.dispatch(event).await,
                Some(Err(EventError::Decode(e))) => {
                    tracing::warn!(error = %e, "Skipping undecodable event");
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Event feed error");
                }
                None => break Err(DistributorError::FeedClosed),
            }
        };

        drop(feed);
        *self.state.lock() = State::Stopped;
        self.shutdown.trigger();
        tracing::info!("Stopped distributing events");
        result
    }

    async fn dispatch(&self, event: Event) {
        let kind = event.kind().unwrap_or_default().to_string();
        match self.interceptors.apply(event).await {
            Decision::Emit(event) => self.emit(&event),
            Decision::Drop => tracing::info!(kind = %kind, "Dropped event"),
        }
    }

    fn emit(&self, event: &Event) {
        match event.to_line() {
            Ok(line) => {
                // Err only means nobody is subscribed right now.
                if self.sender.send(line).is_err() {
                    tracing::debug!("No subscribers for event");
                }
            }
            Err(e) => tracing::error!(error = %e, "Failed to encode event"),
        }
    }

    /// Stream of forwarded events, one encoded line per item.
    ///
    /// Ends when the distributor stops. A subscriber that falls more than
    /// `SUBSCRIBER_BUFFER` events behind skips the oldest ones.
    pub fn subscribe(&self) -> impl Stream<Item = Bytes> + Send + 'static {
        let rx = self.sender.subscribe();
        let stop = self.shutdown.signal();
        futures::stream::unfold((rx, stop), |(mut rx, mut stop)| async move {
            loop {
                let received = tokio::select! {
                    biased;
                    _ = stop.wait() => return None,
                    received = rx.recv() => received,
                };
                match received {
                    Ok(line) => return Some((line, (rx, stop))),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Subscriber lagging, events skipped");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
    }

    /// HTTP response carrying the filtered feed.
    pub fn serve(&self) -> Response<Body> {
        let frames = self
            .subscribe()
            .map(|line| Ok::<_, BoxError>(Frame::data(line)));
        let mut response = Response::new(StreamBody::new(frames).boxed_unsync());
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

impl std::fmt::Debug for Distributor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Distributor")
            .field("state", &self.state())
            .field("interceptors", &self.interceptors)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
