// ABOUTME: Exec operations trait for container runtimes.
// ABOUTME: Runs a command inside a container with its output attached to a writer.

use crate::types::ContainerId;
use async_trait::async_trait;
use std::io::Write;

/// Exec operations: run commands in containers.
#[async_trait]
pub trait ExecOps: Send + Sync {
    /// Create an attached exec session, start it and wait for it to finish.
    ///
    /// Standard output and standard error both go to `output`, in the order
    /// the runtime delivers them. A failing `output` does not fail the exec.
    /// Returns the command's exit code; a nonzero code is not an error.
    async fn exec_attached(
        &self,
        container: &ContainerId,
        cmd: &[String],
        output: &mut (dyn Write + Send),
    ) -> Result<i64, ExecError>;
}

/// Errors from exec operations.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("container not running: {0}")]
    ContainerNotRunning(String),

    #[error("exec instance not found: {0}")]
    ExecNotFound(String),

    #[error("exec failed: {0}")]
    Failed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
