// ABOUTME: Socket addresses for the daemon connection and the listening socket.
// ABOUTME: Parses unix:// and tcp:// forms and binds listeners for them.

use std::fmt;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::net::{TcpListener, UnixListener, UnixStream};

/// A unix socket path or a TCP `host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addr {
    Unix(PathBuf),
    Tcp(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AddrError {
    #[error("empty address")]
    Empty,

    #[error("unsupported scheme in {0} (expected unix:// or tcp://)")]
    UnsupportedScheme(String),

    #[error("invalid tcp address {0}: expected host:port")]
    InvalidTcp(String),

    #[error("unix socket path must be absolute: {0}")]
    RelativePath(String),
}

impl Addr {
    pub fn parse(s: &str) -> Result<Self, AddrError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddrError::Empty);
        }

        if let Some(path) = s.strip_prefix("unix://") {
            return Self::unix(path);
        }
        if let Some(hostport) = s.strip_prefix("tcp://") {
            return Self::tcp(hostport);
        }
        if s.contains("://") {
            return Err(AddrError::UnsupportedScheme(s.to_string()));
        }
        if s.starts_with('/') {
            return Self::unix(s);
        }
        Self::tcp(s)
    }

    fn unix(path: &str) -> Result<Self, AddrError> {
        if !path.starts_with('/') {
            return Err(AddrError::RelativePath(path.to_string()));
        }
        Ok(Addr::Unix(PathBuf::from(path)))
    }

    fn tcp(hostport: &str) -> Result<Self, AddrError> {
        let valid = hostport
            .rsplit_once(':')
            .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
        if !valid {
            return Err(AddrError::InvalidTcp(hostport.to_string()));
        }
        Ok(Addr::Tcp(hostport.to_string()))
    }

    /// Bind a listener on this address.
    ///
    /// For unix sockets a stale socket file is removed first. A socket that
    /// still accepts connections, or a path that is not a socket, is an error
    /// and is left in place.
    pub async fn listen(&self) -> io::Result<Listener> {
        match self {
            Addr::Unix(path) => {
                clear_stale_socket(path).await?;
                let listener = UnixListener::bind(path)?;
                Ok(Listener::Unix(listener, SocketFile(path.clone())))
            }
            Addr::Tcp(hostport) => Ok(Listener::Tcp(TcpListener::bind(hostport).await?)),
        }
    }
}

async fn clear_stale_socket(path: &Path) -> io::Result<()> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    if !metadata.file_type().is_socket() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} exists and is not a socket", path.display()),
        ));
    }
    if UnixStream::connect(path).await.is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AddrInUse,
            format!("{} is in use by another process", path.display()),
        ));
    }

    tracing::debug!(path = %path.display(), "Removing stale socket");
    std::fs::remove_file(path)
}

impl FromStr for Addr {
    type Err = AddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Addr::parse(s)
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Addr::Unix(path) => write!(f, "unix://{}", path.display()),
            Addr::Tcp(hostport) => write!(f, "tcp://{}", hostport),
        }
    }
}

/// A bound listening socket.
#[derive(Debug)]
pub enum Listener {
    Unix(UnixListener, SocketFile),
    Tcp(TcpListener),
}

/// Removes the unix socket file when dropped.
#[derive(Debug)]
pub struct SocketFile(PathBuf);

impl Drop for SocketFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}
