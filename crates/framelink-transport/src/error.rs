use std::net::SocketAddr;

use crate::text::TextError;

/// Errors that can occur in client transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// `send` or `receive` was called while no socket is held.
    #[error("client not started (call start() first)")]
    NotStarted,

    /// `start` was called on a client that already holds a socket.
    #[error("client already started")]
    AlreadyStarted,

    /// The endpoint string is not `host:port`.
    #[error("invalid endpoint {0:?} (expected host:port)")]
    InvalidEndpoint(String),

    /// The endpoint host could not be resolved to an address.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        source: std::io::Error,
    },

    /// The stream peer could not be reached.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to bind a local socket.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// An I/O error occurred on the socket.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A received text payload is not valid UTF-16.
    #[error("invalid text payload: {0}")]
    InvalidText(#[from] TextError),
}

pub type Result<T> = std::result::Result<T, TransportError>;
