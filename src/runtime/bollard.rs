// ABOUTME: Bollard-based implementation of the runtime capability traits.
// ABOUTME: Talks to the Docker-compatible control API over a unix socket or TCP.

use crate::addr::Addr;
use crate::runtime::feed;
use crate::runtime::traits::{
    ContainerError, ContainerInfo, ContainerOps, EventFeed, EventOps, ExecError, ExecOps,
    RuntimeInfo, RuntimeInfoError,
};
use crate::types::{ContainerId, ExecId};
use async_trait::async_trait;
use bollard::Docker;
use bollard::container::LogOutput;
use bollard::exec::{StartExecOptions, StartExecResults};
use bollard::query_parameters::InspectContainerOptions;
use futures::StreamExt;
use std::io::Write;

/// Request timeout handed to bollard, in seconds.
const TIMEOUT_SECS: u64 = 120;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_container_not_found_error(e: bollard::errors::Error) -> ContainerError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ContainerError::NotFound(message.clone()),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_exec_create_error(e: bollard::errors::Error) -> ExecError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ExecError::ContainerNotFound(message.clone()),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 409 => ExecError::ContainerNotRunning(message.clone()),
        _ => ExecError::Runtime(e.to_string()),
    }
}

fn map_exec_not_found_error(e: bollard::errors::Error) -> ExecError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => ExecError::ExecNotFound(message.clone()),
        _ => ExecError::Runtime(e.to_string()),
    }
}

// =============================================================================
// BollardRuntime
// =============================================================================

/// Runtime implementation using bollard.
///
/// The event feed bypasses bollard's typed model and is read as raw JSON
/// from the same daemon address.
#[derive(Debug, Clone)]
pub struct BollardRuntime {
    client: Docker,
    addr: Addr,
}

impl BollardRuntime {
    pub fn new(client: Docker, addr: Addr) -> Self {
        Self { client, addr }
    }

    /// Build a client for the daemon at `addr`. No connection is made yet.
    pub fn connect(addr: &Addr) -> Result<Self, RuntimeInfoError> {
        let client = match addr {
            Addr::Unix(path) => {
                let path = path.to_str().ok_or_else(|| {
                    RuntimeInfoError::ConnectionFailed(format!(
                        "socket path is not valid UTF-8: {}",
                        path.display()
                    ))
                })?;
                Docker::connect_with_unix(path, TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)
            }
            Addr::Tcp(_) => Docker::connect_with_http(
                &addr.to_string(),
                TIMEOUT_SECS,
                bollard::API_DEFAULT_VERSION,
            ),
        }
        .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;

        Ok(Self::new(client, addr.clone()))
    }

    async fn exec_create(
        &self,
        container: &ContainerId,
        cmd: &[String],
    ) -> Result<ExecId, ExecError> {
        let opts = bollard::models::ExecConfig {
            cmd: Some(cmd.to_vec()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            tty: Some(false),
            ..Default::default()
        };

        let response = self
            .client
            .create_exec(container.as_str(), opts)
            .await
            .map_err(map_exec_create_error)?;

        Ok(ExecId::new(response.id))
    }

    async fn exec_exit_code(&self, exec_id: &ExecId) -> Result<i64, ExecError> {
        let details = self
            .client
            .inspect_exec(exec_id.as_str())
            .await
            .map_err(map_exec_not_found_error)?;

        if details.running.unwrap_or(false) {
            return Err(ExecError::Failed(format!(
                "exec {} still running after its output closed",
                exec_id
            )));
        }

        details
            .exit_code
            .ok_or_else(|| ExecError::Failed(format!("exec {} reported no exit code", exec_id)))
    }
}

#[async_trait]
impl RuntimeInfo for BollardRuntime {
    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        self.client
            .ping()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ContainerOps for BollardRuntime {
    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let details = self
            .client
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(map_container_not_found_error)?;

        Ok(ContainerInfo {
            id: details.id.map(ContainerId::new).unwrap_or_else(|| id.clone()),
            labels: details.config.and_then(|c| c.labels).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl ExecOps for BollardRuntime {
    async fn exec_attached(
        &self,
        container: &ContainerId,
        cmd: &[String],
        output: &mut (dyn Write + Send),
    ) -> Result<i64, ExecError> {
        let exec_id = self.exec_create(container, cmd).await?;

        let opts = StartExecOptions {
            detach: false,
            ..Default::default()
        };

        let result = self
            .client
            .start_exec(exec_id.as_str(), Some(opts))
            .await
            .map_err(map_exec_not_found_error)?;

        // Output write failures are logged and the stream is still drained:
        // only the exit code decides the outcome.
        let mut write_failed = false;
        if let StartExecResults::Attached { output: mut stream, .. } = result {
            while let Some(item) = stream.next().await {
                match item {
                    Ok(LogOutput::StdOut { message })
                    | Ok(LogOutput::StdErr { message })
                    | Ok(LogOutput::Console { message }) => {
                        if let Err(e) = output.write_all(&message) {
                            if !write_failed {
                                tracing::warn!(exec = %exec_id, error = %e, "Discarding exec output");
                            }
                            write_failed = true;
                        }
                    }
                    Ok(LogOutput::StdIn { .. }) => {}
                    Err(e) => return Err(ExecError::Failed(e.to_string())),
                }
            }
        }
        if let Err(e) = output.flush() {
            tracing::warn!(exec = %exec_id, error = %e, "Failed to flush exec output");
        }

        self.exec_exit_code(&exec_id).await
    }
}

impl EventOps for BollardRuntime {
    fn events(&self) -> EventFeed {
        feed::subscribe(self.addr.clone())
    }
}
