// ABOUTME: The readiness gate: boot commands resolved from labels, run, and judged.
// ABOUTME: The Readiness handler is the interceptor registered for start events.

mod command;
mod readiness;
mod runner;

pub use command::{BOOT_LABEL, BootAction, SHELL, resolve};
pub use readiness::{Readiness, decide, output_prefix};
pub use runner::{RunResult, run};
