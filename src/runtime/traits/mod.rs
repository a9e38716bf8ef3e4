// ABOUTME: Composable capability traits for the control-plane daemon.
// ABOUTME: Defines RuntimeInfo, ContainerOps, ExecOps and EventOps.

mod container;
mod events;
mod exec;
mod runtime_info;

pub use container::{ContainerError, ContainerInfo, ContainerOps};
pub use events::{EventError, EventFeed, EventOps};
pub use exec::{ExecError, ExecOps};
pub use runtime_info::{RuntimeInfo, RuntimeInfoError};
