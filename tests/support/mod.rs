// ABOUTME: Test support utilities.
// ABOUTME: Fake runtime, capture sink, event feeds and an HTTP client over unix sockets.

use std::sync::Once;

// Each test binary only uses some of these modules, so allow dead_code.
#[allow(dead_code)]
pub mod docker;
#[allow(dead_code)]
pub mod fake_runtime;
#[allow(dead_code)]
pub mod http;

#[allow(unused_imports)]
pub use fake_runtime::{Capture, FakeRuntime, channel_feed, event};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("boot=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}
