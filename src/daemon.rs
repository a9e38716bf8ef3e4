// ABOUTME: Daemon startup, wiring and shutdown.
// ABOUTME: Connects to the runtime, registers the readiness gate and serves until interrupted.

use crate::addr::Addr;
use crate::gate::Readiness;
use crate::error::{
    ConnectSnafu, EventsSnafu, ListenSnafu, PingSnafu, Result, SignalSnafu,
};
use crate::events::{Distributor, Interceptors};
use crate::output::SharedSink;
use crate::proxy::Proxy;
use crate::runtime::{BollardRuntime, ContainerOps, EventOps, ExecOps, RuntimeInfo};
use crate::server::{self, Router};
use crate::shutdown::Shutdown;
use snafu::ResultExt;
use std::future::Future;
use std::sync::Arc;

pub const DEFAULT_DOCKER: &str = "unix:///var/run/docker.sock";
pub const DEFAULT_LISTEN: &str = "unix:///var/run/boot.sock";

/// Event type gated on the boot command.
pub const START_EVENT: &str = "start";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    /// Control-plane daemon socket.
    pub docker: Addr,
    /// Socket this daemon serves on.
    pub listen: Addr,
}

/// Run against the Docker daemon until Ctrl+C.
pub async fn run(config: DaemonConfig) -> Result<()> {
    let runtime = BollardRuntime::connect(&config.docker).context(ConnectSnafu {
        addr: config.docker.to_string(),
    })?;

    run_with(
        Arc::new(runtime),
        &config,
        SharedSink::stdout(),
        tokio::signal::ctrl_c(),
    )
    .await
}

/// Run with the given runtime until `interrupt` resolves.
///
/// Boot command output is written to `output`. Returns an error if the
/// runtime cannot be pinged, the listening socket cannot be bound, or the
/// runtime's event feed ends.
pub async fn run_with<R, F>(
    runtime: Arc<R>,
    config: &DaemonConfig,
    output: SharedSink,
    interrupt: F,
) -> Result<()>
where
    R: RuntimeInfo + ContainerOps + ExecOps + EventOps + 'static,
    F: Future<Output = std::io::Result<()>>,
{
    let docker = config.docker.to_string();
    let listen = config.listen.to_string();

    runtime.ping().await.context(PingSnafu {
        addr: docker.clone(),
    })?;
    let listener = config.listen.listen().await.context(ListenSnafu {
        addr: listen.clone(),
    })?;

    let interceptors =
        Interceptors::new().intercept(START_EVENT, Readiness::new(runtime.clone(), output));
    let distributor = Arc::new(Distributor::new(runtime.as_ref(), interceptors));
    let router = Router::new(distributor.clone(), Proxy::new(config.docker.clone()));

    let server_stop = Shutdown::new();
    let server = tokio::spawn(server::serve(listener, router, server_stop.signal()));
    tracing::info!(%docker, %listen, "Serving");

    let listen = distributor.listen();
    tokio::pin!(listen);

    let result = tokio::select! {
        listened = &mut listen => listened.context(EventsSnafu),
        signal = interrupt => {
            tracing::info!("Received interrupt, shutting down");
            // An in-flight readiness check runs to completion first.
            distributor.stop();
            if let Err(e) = listen.await {
                tracing::warn!(error = %e, "Event distribution ended with error");
            }
            signal.context(SignalSnafu)
        }
    };

    distributor.stop();
    server_stop.trigger();
    if let Err(e) = server.await {
        tracing::warn!(error = %e, "Server task failed");
    }

    result
}
