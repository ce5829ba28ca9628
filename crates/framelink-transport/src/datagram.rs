use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use bytes::Bytes;
use tracing::{debug, info};

use crate::client::{Client, TransportKind};
use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};

/// Largest datagram read by [`DatagramClient::receive`].
pub const MAX_DATAGRAM_SIZE: usize = 65535;

/// Best-effort client over UDP.
///
/// Each payload is exactly one datagram: no header, no fragmentation, no
/// acknowledgement. Payloads over the datagram limit are the caller's to
/// split. Socket errors are returned as-is and leave the client started,
/// since one lost datagram says nothing about the next.
pub struct DatagramClient {
    endpoint: Endpoint,
    addr: SocketAddr,
    config: ClientConfig,
    socket: Option<UdpSocket>,
    recv_buf: Vec<u8>,
}

impl DatagramClient {
    /// Create an unstarted client with default socket options.
    pub fn new(endpoint: Endpoint) -> Result<Self> {
        Self::with_config(endpoint, ClientConfig::default())
    }

    /// Create an unstarted client. The endpoint is resolved here, once.
    pub fn with_config(endpoint: Endpoint, config: ClientConfig) -> Result<Self> {
        let addr = endpoint.resolve()?;
        Ok(Self {
            endpoint,
            addr,
            config,
            socket: None,
            recv_buf: Vec::new(),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The address resolved at construction.
    pub fn peer_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Local address of the bound socket, if started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket
            .as_ref()
            .and_then(|socket| socket.local_addr().ok())
    }

    fn socket(&self) -> Result<&UdpSocket> {
        self.socket.as_ref().ok_or(TransportError::NotStarted)
    }

    /// Ephemeral local address in the same family as the target.
    fn bind_addr(&self) -> SocketAddr {
        let ip = match self.addr {
            SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        SocketAddr::new(ip, 0)
    }
}

impl Client for DatagramClient {
    fn kind(&self) -> TransportKind {
        TransportKind::Datagram
    }

    fn is_started(&self) -> bool {
        self.socket.is_some()
    }

    fn start(&mut self) -> Result<()> {
        if self.socket.is_some() {
            return Err(TransportError::AlreadyStarted);
        }

        let bind_addr = self.bind_addr();
        let socket = UdpSocket::bind(bind_addr).map_err(|source| TransportError::Bind {
            addr: bind_addr,
            source,
        })?;
        socket.set_read_timeout(self.config.read_timeout)?;
        socket.set_write_timeout(self.config.write_timeout)?;

        self.socket = Some(socket);
        info!(endpoint = %self.endpoint, addr = %self.addr, "datagram client ready");
        Ok(())
    }

    fn send(&mut self, payload: &[u8]) -> Result<()> {
        let sent = self.socket()?.send_to(payload, self.addr)?;
        debug!(len = payload.len(), sent, "datagram sent");
        Ok(())
    }

    fn receive(&mut self) -> Result<Bytes> {
        let socket = self.socket.as_ref().ok_or(TransportError::NotStarted)?;
        self.recv_buf.resize(MAX_DATAGRAM_SIZE, 0);

        let (len, from) = socket.recv_from(&mut self.recv_buf)?;
        debug!(len, %from, "datagram received");
        Ok(Bytes::copy_from_slice(&self.recv_buf[..len]))
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            info!(addr = %self.addr, "datagram client closed");
        }
    }
}

impl Drop for DatagramClient {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for DatagramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatagramClient")
            .field("endpoint", &self.endpoint)
            .field("addr", &self.addr)
            .field("started", &self.socket.is_some())
            .finish()
    }
}
