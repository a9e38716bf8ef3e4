// ABOUTME: Container runtime access for the gate.
// ABOUTME: Capability traits plus the bollard-backed Docker implementation.

mod bollard;
mod feed;
pub mod traits;

pub use self::bollard::BollardRuntime;
pub use traits::*;
