// ABOUTME: In-memory runtime implementing the capability traits.
// ABOUTME: Containers are label maps; exec exit codes come from `exit N` shell scripts.

use async_trait::async_trait;
use boot::events::Event;
use boot::runtime::{
    ContainerError, ContainerInfo, ContainerOps, EventError, EventFeed, EventOps, ExecError,
    ExecOps, RuntimeInfo, RuntimeInfoError,
};
use boot::types::ContainerId;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// A feed driven by the returned sender. Ends when the sender is dropped.
pub fn channel_feed() -> (mpsc::UnboundedSender<Result<Event, EventError>>, EventFeed) {
    let (tx, rx) = mpsc::unbounded_channel();
    let feed = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    });
    (tx, Box::pin(feed))
}

/// A Docker-style container event.
pub fn event(action: &str, id: &str) -> Event {
    Event::from_value(json!({
        "Type": "container",
        "Action": action,
        "Actor": { "ID": id, "Attributes": { "name": format!("name-{id}") } },
        "scope": "local",
        "time": 1700000000,
    }))
}

/// Shared byte buffer implementing `Write`.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).to_string()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct FakeRuntime {
    containers: HashMap<String, HashMap<String, String>>,
    output: Vec<Vec<u8>>,
    fail_exec: bool,
    fail_ping: bool,
    exec_delay: Duration,
    feed_tx: Mutex<Option<mpsc::UnboundedSender<Result<Event, EventError>>>>,
    feed: Mutex<Option<EventFeed>>,
    execs: Mutex<Vec<(ContainerId, Vec<String>)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeRuntime {
    pub fn new() -> Self {
        let (tx, feed) = channel_feed();
        Self {
            containers: HashMap::new(),
            output: Vec::new(),
            fail_exec: false,
            fail_ping: false,
            exec_delay: Duration::ZERO,
            feed_tx: Mutex::new(Some(tx)),
            feed: Mutex::new(Some(feed)),
            execs: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Add a container, optionally with a `boot` label.
    pub fn container(mut self, id: &str, boot: Option<&str>) -> Self {
        let mut labels = HashMap::new();
        if let Some(boot) = boot {
            labels.insert("boot".to_string(), boot.to_string());
        }
        self.containers.insert(id.to_string(), labels);
        self
    }

    /// Chunks written to the output sink by every exec, in order.
    pub fn exec_output(mut self, chunks: &[&[u8]]) -> Self {
        self.output = chunks.iter().map(|c| c.to_vec()).collect();
        self
    }

    pub fn failing_exec(mut self) -> Self {
        self.fail_exec = true;
        self
    }

    pub fn failing_ping(mut self) -> Self {
        self.fail_ping = true;
        self
    }

    pub fn exec_delay(mut self, delay: Duration) -> Self {
        self.exec_delay = delay;
        self
    }

    pub fn push(&self, event: Event) {
        if let Some(tx) = self.feed_tx.lock().as_ref() {
            tx.send(Ok(event)).unwrap();
        }
    }

    /// End the event feed.
    pub fn close_feed(&self) {
        self.feed_tx.lock().take();
    }

    pub fn execs(&self) -> Vec<(ContainerId, Vec<String>)> {
        self.execs.lock().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn exit_code(argv: &[String]) -> i64 {
    match argv {
        [sh, c, script] if sh == "/bin/sh" && c == "-c" => script
            .strip_prefix("exit ")
            .and_then(|code| code.trim().parse().ok())
            .unwrap_or(0),
        _ => 0,
    }
}

#[async_trait]
impl RuntimeInfo for FakeRuntime {
    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        if self.fail_ping {
            return Err(RuntimeInfoError::ConnectionFailed(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerOps for FakeRuntime {
    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let labels = self
            .containers
            .get(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))?;
        Ok(ContainerInfo {
            id: id.clone(),
            labels: labels.clone(),
        })
    }
}

#[async_trait]
impl ExecOps for FakeRuntime {
    async fn exec_attached(
        &self,
        container: &ContainerId,
        cmd: &[String],
        output: &mut (dyn Write + Send),
    ) -> Result<i64, ExecError> {
        self.execs.lock().push((container.clone(), cmd.to_vec()));
        if self.fail_exec {
            return Err(ExecError::ContainerNotRunning(container.to_string()));
        }

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if !self.exec_delay.is_zero() {
            tokio::time::sleep(self.exec_delay).await;
        }
        // Stricter than a real runtime, so sink failures surface as exec errors.
        for chunk in &self.output {
            output
                .write_all(chunk)
                .map_err(|e| ExecError::Failed(e.to_string()))?;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(exit_code(cmd))
    }
}

impl EventOps for FakeRuntime {
    fn events(&self) -> EventFeed {
        self.feed
            .lock()
            .take()
            .unwrap_or_else(|| Box::pin(futures::stream::empty::<Result<Event, EventError>>()))
    }
}
