// ABOUTME: Runs a resolved boot action inside its container.
// ABOUTME: Output goes to the caller's sink; exit status is classified, not interpreted.

use super::BootAction;
use crate::runtime::{ExecError, ExecOps};
use std::io::Write;

/// Outcome of running a boot action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunResult {
    /// There was no command to run.
    NotRun,
    /// The command ran and exited with this code.
    Exited(i64),
}

/// Run `action`, streaming stdout and stderr into `output`.
///
/// Errors are transport or daemon failures. A command that exits nonzero
/// is `Ok(RunResult::Exited(code))`.
pub async fn run<R>(
    runtime: &R,
    action: &BootAction,
    output: &mut (dyn Write + Send),
) -> Result<RunResult, ExecError>
where
    R: ExecOps + ?Sized,
{
    match action {
        BootAction::None => Ok(RunResult::NotRun),
        BootAction::Shell { container, argv } | BootAction::Raw { container, argv } => {
            let code = runtime.exec_attached(container, argv, output).await?;
            Ok(RunResult::Exited(code))
        }
    }
}
