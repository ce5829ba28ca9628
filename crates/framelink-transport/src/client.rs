use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::config::ClientConfig;
use crate::datagram::DatagramClient;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::stream::StreamClient;
use crate::text::{decode_utf16, encode_utf16};

/// Which transport a client runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Reliable, ordered, length-prefixed (TCP).
    Stream,
    /// Best-effort, one payload per datagram (UDP).
    Datagram,
}

impl TransportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Stream => "stream",
            TransportKind::Datagram => "datagram",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stream" | "tcp" => Ok(TransportKind::Stream),
            "datagram" | "udp" => Ok(TransportKind::Datagram),
            other => Err(format!(
                "unknown transport {other:?} (expected stream|tcp|datagram|udp)"
            )),
        }
    }
}

/// The client contract shared by every transport.
///
/// A client holds at most one socket. It is absent until [`start`] succeeds
/// and absent again after [`close`]. [`send`] and [`receive`] on an absent
/// socket fail with [`TransportError::NotStarted`].
///
/// [`start`]: Client::start
/// [`close`]: Client::close
/// [`send`]: Client::send
/// [`receive`]: Client::receive
/// [`TransportError::NotStarted`]: crate::TransportError::NotStarted
pub trait Client {
    /// The transport this client runs over.
    fn kind(&self) -> TransportKind;

    /// Whether a socket is currently held.
    fn is_started(&self) -> bool;

    /// Acquire the socket. Also used to restart a closed client.
    fn start(&mut self) -> Result<()>;

    /// Transmit one payload.
    fn send(&mut self, payload: &[u8]) -> Result<()>;

    /// Block until one payload arrives. Empty means the peer is gone.
    fn receive(&mut self) -> Result<Bytes>;

    /// Release the socket if held. Idempotent.
    fn close(&mut self);

    /// Send `text` as UTF-16.
    fn send_string(&mut self, text: &str) -> Result<()> {
        self.send(&encode_utf16(text))
    }

    /// Receive one payload and decode it as UTF-16.
    ///
    /// An empty payload yields an empty string.
    fn receive_string(&mut self) -> Result<String> {
        let payload = self.receive()?;
        if payload.is_empty() {
            return Ok(String::new());
        }
        Ok(decode_utf16(&payload)?)
    }
}

/// A client whose transport is chosen at construction time.
#[derive(Debug)]
pub enum AnyClient {
    Stream(StreamClient),
    Datagram(DatagramClient),
}

impl AnyClient {
    /// Build an unstarted client of the given kind.
    pub fn new(kind: TransportKind, endpoint: Endpoint, config: ClientConfig) -> Result<Self> {
        Ok(match kind {
            TransportKind::Stream => Self::Stream(StreamClient::with_config(endpoint, config)?),
            TransportKind::Datagram => {
                Self::Datagram(DatagramClient::with_config(endpoint, config)?)
            }
        })
    }

    /// The configured target.
    pub fn endpoint(&self) -> &Endpoint {
        match self {
            Self::Stream(client) => client.endpoint(),
            Self::Datagram(client) => client.endpoint(),
        }
    }
}

impl Client for AnyClient {
    fn kind(&self) -> TransportKind {
        match self {
            Self::Stream(client) => client.kind(),
            Self::Datagram(client) => client.kind(),
        }
    }

    fn is_started(&self) -> bool {
        match self {
            Self::Stream(client) => client.is_started(),
            Self::Datagram(client) => client.is_started(),
        }
    }

    fn start(&mut self) -> Result<()> {
        match self {
            Self::Stream(client) => client.start(),
            Self::Datagram(client) => client.start(),
        }
    }

    fn send(&mut self, payload: &[u8]) -> Result<()> {
        match self {
            Self::Stream(client) => client.send(payload),
            Self::Datagram(client) => client.send(payload),
        }
    }

    fn receive(&mut self) -> Result<Bytes> {
        match self {
            Self::Stream(client) => client.receive(),
            Self::Datagram(client) => client.receive(),
        }
    }

    fn close(&mut self) {
        match self {
            Self::Stream(client) => client.close(),
            Self::Datagram(client) => client.close(),
        }
    }
}
