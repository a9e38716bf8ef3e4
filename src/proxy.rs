// ABOUTME: Transparent HTTP proxy to the control-plane daemon socket.
// ABOUTME: Replays requests verbatim and tunnels upgraded (hijacked) connections.

use crate::addr::Addr;
use crate::body::{self, Body, BoxError};
use crate::upstream::{self, UpstreamError};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::upgrade::OnUpgrade;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("request failed: {0}")]
    Request(hyper::Error),
}

/// Forwards requests to the daemon, one upstream connection per request.
#[derive(Debug, Clone)]
pub struct Proxy {
    upstream: Addr,
}

impl Proxy {
    pub fn new(upstream: Addr) -> Self {
        Self { upstream }
    }

    /// Forward `req` and return the daemon's response unchanged.
    ///
    /// Upstream failures become a `502 Bad Gateway` for this caller only.
    pub async fn forward(&self, req: Request<Incoming>) -> Response<Body> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        match self.try_forward(req).await {
            Ok(response) => {
                tracing::debug!(%method, %path, status = %response.status(), "Proxied");
                response
            }
            Err(e) => {
                tracing::warn!(%method, %path, error = %e, "Proxy error");
                body::text(StatusCode::BAD_GATEWAY, e.to_string())
            }
        }
    }

    async fn try_forward(&self, mut req: Request<Incoming>) -> Result<Response<Body>, ProxyError> {
        let client_upgrade = hyper::upgrade::on(&mut req);

        let mut sender = upstream::connect::<Incoming>(&self.upstream).await?;
        let mut response = sender
            .send_request(req)
            .await
            .map_err(ProxyError::Request)?;

        if response.status() == StatusCode::SWITCHING_PROTOCOLS {
            let upstream_upgrade = hyper::upgrade::on(&mut response);
            tokio::spawn(tunnel(client_upgrade, upstream_upgrade));
        }

        Ok(response.map(|incoming| incoming.map_err(BoxError::from).boxed_unsync()))
    }
}

/// Copy bytes both ways once caller and daemon have both switched protocols.
async fn tunnel(client: OnUpgrade, upstream: OnUpgrade) {
    let (client, upstream) = match tokio::try_join!(client, upstream) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(error = %e, "Upgrade failed");
            return;
        }
    };

    let mut client = TokioIo::new(client);
    let mut upstream = TokioIo::new(upstream);
    match tokio::io::copy_bidirectional(&mut client, &mut upstream).await {
        Ok((sent, received)) => tracing::debug!(sent, received, "Tunnel closed"),
        Err(e) => tracing::debug!(error = %e, "Tunnel error"),
    }
}
