// ABOUTME: Type-safe identifiers shared across modules.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod id;

pub use id::{ContainerId, ExecId, Id};
