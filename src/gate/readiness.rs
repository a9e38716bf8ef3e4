// ABOUTME: Readiness handler for container start events.
// ABOUTME: Inspects the container, runs its boot command and maps the outcome to a decision.

use super::{RunResult, resolve, run};
use crate::events::{Decision, Event, Interceptor};
use crate::output::{Prefixed, SharedSink};
use crate::runtime::{ContainerOps, ExecError, ExecOps};
use crate::types::ContainerId;
use async_trait::async_trait;
use std::sync::Arc;

/// Gates start events on the container's boot command.
pub struct Readiness<R> {
    runtime: Arc<R>,
    output: SharedSink,
}

impl<R> Readiness<R>
where
    R: ContainerOps + ExecOps,
{
    pub fn new(runtime: Arc<R>, output: SharedSink) -> Self {
        Self { runtime, output }
    }

    async fn check(&self, id: &ContainerId) -> Result<RunResult, ReadinessError> {
        let container = self.runtime.inspect_container(id).await?;
        let action = resolve(&container);
        tracing::info!(container = %id.short(), command = %action, "Using boot command");

        let mut output = Prefixed::new(output_prefix(id), self.output.clone());
        Ok(run(self.runtime.as_ref(), &action, &mut output).await?)
    }
}

#[derive(Debug, thiserror::Error)]
enum ReadinessError {
    #[error("inspect failed: {0}")]
    Inspect(#[from] crate::runtime::ContainerError),

    #[error("run failed: {0}")]
    Run(#[from] ExecError),
}

/// Prefix for a container's boot command output lines.
pub fn output_prefix(id: &ContainerId) -> String {
    format!("{} | ", id.short())
}

/// Only a missing command or a zero exit lets the event through.
pub fn decide<E>(event: Event, outcome: &Result<RunResult, E>) -> Decision {
    match outcome {
        Ok(RunResult::NotRun) | Ok(RunResult::Exited(0)) => Decision::Emit(event),
        Ok(RunResult::Exited(_)) | Err(_) => Decision::Drop,
    }
}

#[async_trait]
impl<R> Interceptor for Readiness<R>
where
    R: ContainerOps + ExecOps + 'static,
{
    async fn handle(&self, event: Event) -> Decision {
        let Some(id) = event.actor_id() else {
            tracing::error!("Start event without actor ID");
            return Decision::Drop;
        };

        let outcome = self.check(&id).await;
        let container = id.short();
        match &outcome {
            Err(e) => tracing::error!(container = %container, error = %e, "Readiness check failed"),
            Ok(RunResult::NotRun) => {
                tracing::info!(container = %container, "No boot command present, assuming container started")
            }
            Ok(RunResult::Exited(0)) => tracing::info!(container = %container, "Up and running!"),
            Ok(RunResult::Exited(code)) => {
                tracing::warn!(container = %container, exit_code = code, "Boot command exited non-zero")
            }
        }

        decide(event, &outcome)
    }
}

impl<R> std::fmt::Debug for Readiness<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Readiness").finish_non_exhaustive()
    }
}
