use std::net::{SocketAddr, TcpListener, UdpSocket};
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::datagram::MAX_DATAGRAM_SIZE;
use crate::error::{Result, TransportError};
use crate::stream::StreamClient;

/// Collector side of the stream transport.
///
/// Each accepted connection comes back as an already-started
/// [`StreamClient`], so the peer speaks exactly the same framing.
pub struct StreamListener {
    listener: TcpListener,
    config: ClientConfig,
}

impl StreamListener {
    /// Bind and listen on `addr`.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener =
            TcpListener::bind(addr).map_err(|source| TransportError::Bind { addr, source })?;
        info!(%addr, "listening for stream clients");
        Ok(Self {
            listener,
            config: ClientConfig::default(),
        })
    }

    /// Socket options applied to every accepted connection.
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Switch `accept` between blocking and returning `WouldBlock` when no
    /// connection is pending.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        Ok(self.listener.set_nonblocking(nonblocking)?)
    }

    /// Accept the next connection.
    ///
    /// The accepted connection is always blocking, whatever mode the
    /// listener is in.
    pub fn accept(&self) -> Result<StreamClient> {
        let (stream, peer) = self.listener.accept()?;
        stream.set_nonblocking(false)?;
        debug!(%peer, "accepted stream client");
        StreamClient::from_accepted(stream, peer, self.config.clone())
    }
}

/// Collector side of the datagram transport.
pub struct DatagramListener {
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl DatagramListener {
    /// Bind a receiving socket on `addr`.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let socket =
            UdpSocket::bind(addr).map_err(|source| TransportError::Bind { addr, source })?;
        info!(%addr, "listening for datagrams");
        Ok(Self {
            socket,
            buf: vec![0u8; MAX_DATAGRAM_SIZE],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        Ok(self.socket.set_read_timeout(timeout)?)
    }

    /// Receive one datagram and the address it came from (blocking).
    pub fn recv(&mut self) -> Result<(Bytes, SocketAddr)> {
        let (len, from) = self.socket.recv_from(&mut self.buf)?;
        debug!(len, %from, "datagram received");
        Ok((Bytes::copy_from_slice(&self.buf[..len]), from))
    }

    /// Send one datagram back to `to`.
    pub fn send_to(&self, payload: &[u8], to: SocketAddr) -> Result<()> {
        self.socket.send_to(payload, to)?;
        Ok(())
    }
}
