// ABOUTME: Output sinks for readiness command output.
// ABOUTME: Line-prefixing writer over a shared, lock-guarded log sink.

mod prefixed;
mod shared;

pub use prefixed::Prefixed;
pub use shared::SharedSink;
