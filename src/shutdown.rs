// ABOUTME: Stop signal shared by the event loop, feed subscribers and the accept loop.
// ABOUTME: Backed by a watch channel so late subscribers still observe a stop.

use tokio::sync::watch;

/// Sending half: triggers shutdown for every `ShutdownSignal`.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolves once shutdown is triggered, or the `Shutdown` is dropped.
    pub async fn wait(&mut self) {
        loop {
            let stopped = *self.rx.borrow_and_update();
            if stopped || self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
