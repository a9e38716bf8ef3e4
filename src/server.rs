// ABOUTME: HTTP front end on the listening socket.
// ABOUTME: Routes */events to the distributor and everything else to the proxy.

use crate::addr::Listener;
use crate::body::Body;
use crate::events::Distributor;
use crate::proxy::Proxy;
use crate::shutdown::ShutdownSignal;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

/// Path suffix served by the distributor.
pub const EVENTS_SUFFIX: &str = "/events";

/// True for requests that should get the filtered event feed.
///
/// Matches any API version prefix, e.g. `/v1.43/events`.
pub fn is_events_path(path: &str) -> bool {
    path.ends_with(EVENTS_SUFFIX)
}

#[derive(Debug, Clone)]
pub struct Router {
    distributor: Arc<Distributor>,
    proxy: Arc<Proxy>,
}

impl Router {
    pub fn new(distributor: Arc<Distributor>, proxy: Proxy) -> Self {
        Self {
            distributor,
            proxy: Arc::new(proxy),
        }
    }

    pub async fn route(&self, req: Request<Incoming>) -> Response<Body> {
        if is_events_path(req.uri().path()) {
            tracing::debug!(path = %req.uri().path(), "Event subscriber connected");
            self.distributor.serve()
        } else {
            self.proxy.forward(req).await
        }
    }
}

/// Accept connections until `stop` fires, serving each on its own task.
pub async fn serve(listener: Listener, router: Router, mut stop: ShutdownSignal) {
    loop {
        let accepted = tokio::select! {
            biased;
            _ = stop.wait() => break,
            accepted = accept(&listener, &router) => accepted,
        };

        if let Err(e) = accepted {
            tracing::warn!(error = %e, "Accept error");
        }
    }
    tracing::debug!("Stopped accepting connections");
}

async fn accept(listener: &Listener, router: &Router) -> std::io::Result<()> {
    match listener {
        Listener::Unix(listener, _) => {
            let (stream, _) = listener.accept().await?;
            spawn_connection(stream, router.clone());
        }
        Listener::Tcp(listener) => {
            let (stream, peer) = listener.accept().await?;
            tracing::debug!(%peer, "Accepted TCP connection");
            spawn_connection(stream, router.clone());
        }
    }
    Ok(())
}

fn spawn_connection<S>(stream: S, router: Router)
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        let service = service_fn(move |req| {
            let router = router.clone();
            async move { Ok::<_, Infallible>(router.route(req).await) }
        });

        if let Err(e) = http1::Builder::new()
            .serve_connection(TokioIo::new(stream), service)
            .with_upgrades()
            .await
        {
            tracing::debug!(error = %e, "Connection error");
        }
    });
}
