// ABOUTME: Library root for boot - exposes the gate's building blocks for testing.
// ABOUTME: The main binary is in main.rs.

pub mod addr;
pub mod body;
pub mod daemon;
pub mod error;
pub mod events;
pub mod gate;
pub mod output;
pub mod proxy;
pub mod runtime;
pub mod server;
pub mod shutdown;
pub mod types;
pub mod upstream;
