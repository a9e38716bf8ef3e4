// ABOUTME: HTTP/1 client connections to the control-plane daemon socket.
// ABOUTME: One handshake per call; the connection task runs with upgrades enabled.

use crate::addr::Addr;
use crate::body::BoxError;
use hyper::body::Body;
use hyper::client::conn::http1::SendRequest;
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, UnixStream};

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error("HTTP handshake failed: {0}")]
    Handshake(hyper::Error),
}

/// Open a fresh connection to `addr` and return its request handle.
pub async fn connect<B>(addr: &Addr) -> Result<SendRequest<B>, UpstreamError>
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    let connect_error = |source| UpstreamError::Connect {
        addr: addr.to_string(),
        source,
    };

    match addr {
        Addr::Unix(path) => {
            let stream = UnixStream::connect(path).await.map_err(connect_error)?;
            handshake(stream).await
        }
        Addr::Tcp(hostport) => {
            let stream = TcpStream::connect(hostport.as_str())
                .await
                .map_err(connect_error)?;
            handshake(stream).await
        }
    }
}

async fn handshake<S, B>(stream: S) -> Result<SendRequest<B>, UpstreamError>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    let (sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .map_err(UpstreamError::Handshake)?;

    tokio::spawn(async move {
        if let Err(e) = conn.with_upgrades().await {
            tracing::debug!(error = %e, "Upstream connection error");
        }
    });

    Ok(sender)
}
