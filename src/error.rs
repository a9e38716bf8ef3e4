// ABOUTME: Fatal daemon error types with SNAFU context selectors.
// ABOUTME: Anything here stops the process; per-event and per-request errors never reach it.

use snafu::Snafu;

use crate::events::DistributorError;
use crate::runtime::RuntimeInfoError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Connect '{addr}': {source}"))]
    Connect {
        addr: String,
        source: RuntimeInfoError,
    },

    #[snafu(display("Ping '{addr}': {source}"))]
    Ping {
        addr: String,
        source: RuntimeInfoError,
    },

    #[snafu(display("Listen '{addr}': {source}"))]
    Listen {
        addr: String,
        source: std::io::Error,
    },

    #[snafu(display("event distribution stopped: {source}"))]
    Events { source: DistributorError },

    #[snafu(display("failed to wait for interrupt signal: {source}"))]
    Signal { source: std::io::Error },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The control-plane daemon could not be reached.
    Connectivity,
    /// The listening socket could not be bound.
    Listen,
    /// The runtime's event feed ended.
    EventFeed,
    /// Signal handling could not be installed.
    Signal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Connect { .. } | Error::Ping { .. } => ErrorKind::Connectivity,
            Error::Listen { .. } => ErrorKind::Listen,
            Error::Events { .. } => ErrorKind::EventFeed,
            Error::Signal { .. } => ErrorKind::Signal,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
