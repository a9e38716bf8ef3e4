// ABOUTME: Minimal HTTP/1 client and upstream server over unix sockets.
// ABOUTME: The upstreams stand in for the Docker daemon in proxy and event feed tests.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::client::conn::http1::SendRequest;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use futures::StreamExt;
use std::convert::Infallible;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};

/// Open a client connection to the unix socket at `path`.
pub async fn connect(path: &Path) -> SendRequest<Full<Bytes>> {
    let stream = UnixStream::connect(path).await.unwrap();
    let (sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .unwrap();
    tokio::spawn(async move {
        let _ = conn.with_upgrades().await;
    });
    sender
}

pub fn request(method: &str, uri: &str, body: &'static str) -> Request<Full<Bytes>> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Host", "docker")
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap()
}

pub async fn body_string(response: Response<Incoming>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Wait until a unix socket file appears.
pub async fn wait_for_socket(path: &Path) {
    for _ in 0..200 {
        if path.exists() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("socket {} never appeared", path.display());
}

/// Fake daemon: echoes requests, and tunnels `POST /exec/*/start` upgrades.
pub async fn spawn_upstream(path: &Path) {
    let listener = UnixListener::bind(path).unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service_fn(upstream))
                    .with_upgrades()
                    .await;
            });
        }
    });
}

async fn upstream(mut req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    if req.uri().path().ends_with("/start") && req.headers().contains_key("upgrade") {
        let on_upgrade = hyper::upgrade::on(&mut req);
        tokio::spawn(async move {
            let upgraded = on_upgrade.await.unwrap();
            let mut io = TokioIo::new(upgraded);
            let mut buf = [0u8; 64];
            let n = io.read(&mut buf).await.unwrap();
            io.write_all(b"echo:").await.unwrap();
            io.write_all(&buf[..n]).await.unwrap();
            io.shutdown().await.unwrap();
        });
        let response = Response::builder()
            .status(StatusCode::SWITCHING_PROTOCOLS)
            .header("Connection", "Upgrade")
            .header("Upgrade", "tcp")
            .body(Full::new(Bytes::new()))
            .unwrap();
        return Ok(response);
    }

    let method = req.method().to_string();
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_default();
    let custom = req
        .headers()
        .get("x-custom")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let body = req.into_body().collect().await.unwrap().to_bytes();

    let status = if path.starts_with("/missing") {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };
    let text = format!(
        "{method} {path} custom={custom} body={}",
        String::from_utf8_lossy(&body)
    );
    let response = Response::builder()
        .status(status)
        .header("Api-Version", "1.43")
        .header("X-Upstream", "fake")
        .body(Full::new(Bytes::from(text)))
        .unwrap();
    Ok(response)
}

/// Fake daemon whose `GET /events` streams `chunks` and then ends the body.
/// Any other path gets a 404.
pub async fn spawn_event_source(path: &Path, chunks: Vec<&'static [u8]>) {
    let listener = UnixListener::bind(path).unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let chunks = chunks.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let chunks = chunks.clone();
                    async move {
                        let status = if req.uri().path() == "/events" {
                            StatusCode::OK
                        } else {
                            StatusCode::NOT_FOUND
                        };
                        let frames = futures::stream::iter(chunks).then(|chunk| async move {
                            tokio::time::sleep(Duration::from_millis(5)).await;
                            Ok::<_, Infallible>(Frame::data(Bytes::from_static(chunk)))
                        })
                        .boxed();
                        let response = Response::builder()
                            .status(status)
                            .header("Content-Type", "application/json")
                            .body(StreamBody::new(frames))
                            .unwrap();
                        Ok::<_, Infallible>(response)
                    }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });
}
