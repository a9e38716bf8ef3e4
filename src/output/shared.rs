// ABOUTME: Cloneable handle to one log sink shared by many writers.
// ABOUTME: Each write takes the lock, so a single call is never split by another writer.

use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

/// Shared destination for readiness command output.
///
/// Writes never fail. If the underlying writer errors, the bytes are
/// discarded and a warning is logged once until a write succeeds again.
#[derive(Clone)]
pub struct SharedSink {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    writer: Box<dyn Write + Send>,
    failing: bool,
}

impl SharedSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                writer: Box::new(writer),
                failing: false,
            })),
        }
    }

    /// Sink writing to the process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl Inner {
    fn record(&mut self, result: io::Result<()>) {
        match result {
            Ok(()) if self.failing => {
                tracing::info!("Output sink recovered");
                self.failing = false;
            }
            Ok(()) => {}
            Err(e) => {
                if !self.failing {
                    tracing::warn!(error = %e, "Output sink failed, discarding command output");
                }
                self.failing = true;
            }
        }
    }
}

impl std::fmt::Debug for SharedSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSink")
            .field("failing", &self.inner.lock().failing)
            .finish_non_exhaustive()
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock();
        let result = inner.writer.write_all(buf);
        let result = result.and_then(|()| inner.writer.flush());
        inner.record(result);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut inner = self.inner.lock();
        let result = inner.writer.flush();
        inner.record(result);
        Ok(())
    }
}
