use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use bytes::Bytes;
use framelink_frame::{FrameError, FrameReader, FrameWriter};
use tracing::{debug, error, info, warn};

use crate::client::{Client, TransportKind};
use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};

/// Reliable client over TCP with big-endian length-prefix framing.
///
/// `send` and `receive` never return I/O errors. A failure mid-frame leaves
/// the byte stream unusable, so the client logs it, closes itself, and
/// reports the failure through its closed state: `send` returns `Ok(())`,
/// `receive` returns an empty payload, and the next call gets
/// [`TransportError::NotStarted`].
pub struct StreamClient {
    endpoint: Endpoint,
    addr: SocketAddr,
    config: ClientConfig,
    conn: Option<Connection>,
}

struct Connection {
    reader: FrameReader<TcpStream>,
    writer: FrameWriter<TcpStream>,
}

impl Connection {
    fn open(stream: TcpStream, config: &ClientConfig) -> Result<Self> {
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;
        stream.set_nodelay(config.nodelay)?;

        let reader_stream = stream.try_clone()?;
        Ok(Self {
            reader: FrameReader::with_config(reader_stream, config.frame_config()),
            writer: FrameWriter::with_config(stream, config.frame_config()),
        })
    }
}

impl StreamClient {
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
            conn: None,
        })
    }

    /// Wrap a connection accepted by a listener. The client starts active.
    pub(crate) fn from_accepted(
        stream: TcpStream,
        peer: SocketAddr,
        config: ClientConfig,
    ) -> Result<Self> {
        let conn = Connection::open(stream, &config)?;
        Ok(Self {
            endpoint: Endpoint::from(peer),
            addr: peer,
            config,
            conn: Some(conn),
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The address resolved at construction.
    pub fn peer_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Local address of the live connection, if any.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.conn
            .as_ref()
            .and_then(|conn| conn.writer.get_ref().local_addr().ok())
    }

    /// Wait up to `timeout` for the next frame to start arriving.
    ///
    /// Returns `Ok(true)` once a byte is pending or the connection has ended,
    /// so the following `receive` does not block on an idle link. `timeout`
    /// must be non-zero. The configured read timeout is restored afterwards.
    pub fn wait_readable(&self, timeout: Duration) -> Result<bool> {
        let stream = self
            .conn
            .as_ref()
            .ok_or(TransportError::NotStarted)?
            .reader
            .get_ref();

        stream.set_read_timeout(Some(timeout))?;
        let mut byte = [0u8; 1];
        let peeked = stream.peek(&mut byte);
        stream.set_read_timeout(self.config.read_timeout)?;

        match peeked {
            Ok(_) => Ok(true),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                Ok(false)
            }
            // Let `receive` hit the error and apply close-on-error.
            Err(_) => Ok(true),
        }
    }

    fn connection(&mut self) -> Result<&mut Connection> {
        self.conn.as_mut().ok_or(TransportError::NotStarted)
    }

    fn connect(&self) -> Result<TcpStream> {
        let connected = match self.config.connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(&self.addr, timeout),
            None => TcpStream::connect(self.addr),
        };
        connected.map_err(|source| TransportError::Connect {
            addr: self.addr,
            source,
        })
    }
}

impl Client for StreamClient {
    fn kind(&self) -> TransportKind {
        TransportKind::Stream
    }

    fn is_started(&self) -> bool {
        self.conn.is_some()
    }

    fn start(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Err(TransportError::AlreadyStarted);
        }

        let stream = self.connect()?;
        self.conn = Some(Connection::open(stream, &self.config)?);
        info!(endpoint = %self.endpoint, addr = %self.addr, "stream client connected");
        Ok(())
    }

    fn send(&mut self, payload: &[u8]) -> Result<()> {
        let result = self.connection()?.writer.send(payload);

        match result {
            Ok(()) => debug!(len = payload.len(), "stream frame sent"),
            Err(err) => {
                error!(addr = %self.addr, len = payload.len(), %err, "stream send failed");
                self.close();
            }
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<Bytes> {
        let result = self.connection()?.reader.read_frame();

        match result {
            Ok(payload) => {
                debug!(len = payload.len(), "stream frame received");
                Ok(payload)
            }
            Err(FrameError::ConnectionClosed) => {
                info!(addr = %self.addr, "stream peer closed");
                self.close();
                Ok(Bytes::new())
            }
            Err(err) => {
                warn!(addr = %self.addr, %err, "stream receive failed");
                self.close();
                Ok(Bytes::new())
            }
        }
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            // Shutdown reaches the peer even though the reader holds a cloned fd.
            let _ = conn.writer.get_ref().shutdown(Shutdown::Both);
            info!(addr = %self.addr, "stream client closed");
        }
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("endpoint", &self.endpoint)
            .field("addr", &self.addr)
            .field("started", &self.conn.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    use framelink_frame::{encode_frame, FrameReader, FrameWriter};

    use super::*;

    fn loopback_listener() -> (TcpListener, Endpoint) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, Endpoint::from(addr))
    }

    #[test]
    fn never_started_client_rejects_io() {
        let (_listener, endpoint) = loopback_listener();
        let mut client = StreamClient::new(endpoint).unwrap();

        assert!(!client.is_started());
        assert!(matches!(client.send(b"x"), Err(TransportError::NotStarted)));
        assert!(matches!(client.receive(), Err(TransportError::NotStarted)));
    }

    #[test]
    fn close_is_idempotent_and_safe_before_start() {
        let (listener, endpoint) = loopback_listener();
        let mut client = StreamClient::new(endpoint).unwrap();
        client.close();
        client.close();

        client.start().unwrap();
        let _server = listener.accept().unwrap();
        client.close();
        assert!(!client.is_started());
        client.close();
        assert!(!client.is_started());
    }

    #[test]
    fn start_against_closed_port_is_connect_error() {
        let (listener, endpoint) = loopback_listener();
        drop(listener);

        let mut client = StreamClient::new(endpoint).unwrap();
        assert!(matches!(
            client.start(),
            Err(TransportError::Connect { .. })
        ));
        assert!(!client.is_started());
    }

    #[test]
    fn second_start_is_rejected() {
        let (listener, endpoint) = loopback_listener();
        let mut client = StreamClient::new(endpoint).unwrap();
        client.start().unwrap();
        let _server = listener.accept().unwrap();

        assert!(matches!(client.start(), Err(TransportError::AlreadyStarted)));
        assert!(client.is_started());
    }

    #[test]
    fn send_writes_big_endian_length_prefix() {
        let (listener, endpoint) = loopback_listener();
        let mut client = StreamClient::new(endpoint).unwrap();
        client.start().unwrap();
        let (mut server, _) = listener.accept().unwrap();

        client.send(b"\xFF\xD8jpeg\xFF\xD9").unwrap();
        client.close();

        let mut wire = Vec::new();
        server.read_to_end(&mut wire).unwrap();
        assert_eq!(&wire[..4], &[0, 0, 0, 8]);
        assert_eq!(&wire[4..], b"\xFF\xD8jpeg\xFF\xD9");
    }

    #[test]
    fn receive_returns_framed_payloads_in_order() {
        let (listener, endpoint) = loopback_listener();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = FrameWriter::new(stream);
            writer.send(b"first").unwrap();
            writer.send(b"").unwrap();
            writer.send(&vec![7u8; 200_000]).unwrap();
        });

        let mut client = StreamClient::new(endpoint).unwrap();
        client.start().unwrap();

        assert_eq!(client.receive().unwrap().as_ref(), b"first");
        assert!(client.receive().unwrap().is_empty());
        assert!(client.is_started(), "zero-length frame must not close");
        assert_eq!(client.receive().unwrap().len(), 200_000);

        server.join().unwrap();
    }

    #[test]
    fn peer_close_yields_empty_and_closes() {
        let (listener, endpoint) = loopback_listener();
        let mut client = StreamClient::new(endpoint).unwrap();
        client.start().unwrap();
        let (server, _) = listener.accept().unwrap();
        drop(server);

        assert!(client.receive().unwrap().is_empty());
        assert!(!client.is_started());
        assert!(matches!(client.receive(), Err(TransportError::NotStarted)));
    }

    #[test]
    fn peer_close_mid_payload_yields_empty_and_closes() {
        let (listener, endpoint) = loopback_listener();
        let mut client = StreamClient::new(endpoint).unwrap();
        client.start().unwrap();

        let (mut server, _) = listener.accept().unwrap();
        let mut partial = bytes::BytesMut::new();
        encode_frame(b"truncated payload", &mut partial).unwrap();
        server.write_all(&partial[..10]).unwrap();
        drop(server);

        assert!(client.receive().unwrap().is_empty());
        assert!(!client.is_started());
    }

    #[test]
    fn oversized_header_closes_client() {
        let (listener, endpoint) = loopback_listener();
        let config = ClientConfig {
            max_payload_size: 8,
            ..ClientConfig::default()
        };
        let mut client = StreamClient::with_config(endpoint, config).unwrap();
        client.start().unwrap();

        let (server, _) = listener.accept().unwrap();
        let mut writer = FrameWriter::new(server);
        writer.send(b"way more than eight bytes").unwrap();

        assert!(client.receive().unwrap().is_empty());
        assert!(!client.is_started());
    }

    #[test]
    fn read_timeout_is_treated_as_failure() {
        let (listener, endpoint) = loopback_listener();
        let config = ClientConfig {
            read_timeout: Some(Duration::from_millis(50)),
            ..ClientConfig::default()
        };
        let mut client = StreamClient::with_config(endpoint, config).unwrap();
        client.start().unwrap();
        let _server = listener.accept().unwrap();

        assert!(client.receive().unwrap().is_empty());
        assert!(!client.is_started());
    }

    #[test]
    fn send_failure_closes_without_error() {
        let (listener, endpoint) = loopback_listener();
        let mut client = StreamClient::new(endpoint).unwrap();
        client.start().unwrap();
        let (server, _) = listener.accept().unwrap();
        drop(server);
        drop(listener);

        // The first writes may land in the kernel buffer before the reset is seen.
        let payload = vec![0u8; 64 * 1024];
        for _ in 0..64 {
            client.send(&payload).unwrap();
            if !client.is_started() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }

        assert!(!client.is_started());
        assert!(matches!(client.send(b"x"), Err(TransportError::NotStarted)));
    }

    #[test]
    fn restart_after_close_reconnects() {
        let (listener, endpoint) = loopback_listener();
        let mut client = StreamClient::new(endpoint).unwrap();

        client.start().unwrap();
        let _first = listener.accept().unwrap();
        client.close();

        client.start().unwrap();
        let (second, _) = listener.accept().unwrap();
        client.send(b"again").unwrap();

        let mut reader = FrameReader::new(second);
        assert_eq!(reader.read_frame().unwrap().as_ref(), b"again");
    }

    #[test]
    fn drop_closes_connection() {
        let (listener, endpoint) = loopback_listener();
        let mut client = StreamClient::new(endpoint).unwrap();
        client.start().unwrap();
        let (mut server, _) = listener.accept().unwrap();

        drop(client);

        let mut buf = [0u8; 1];
        assert_eq!(server.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn wait_readable_polls_without_consuming() {
        let (listener, endpoint) = loopback_listener();
        let mut client = StreamClient::new(endpoint).unwrap();
        client.start().unwrap();
        let (server, _) = listener.accept().unwrap();

        assert!(!client.wait_readable(Duration::from_millis(20)).unwrap());
        assert!(client.is_started());

        let mut writer = FrameWriter::new(server);
        writer.send(b"late").unwrap();
        assert!(client.wait_readable(Duration::from_secs(5)).unwrap());
        assert_eq!(client.receive().unwrap().as_ref(), b"late");

        drop(writer);
        assert!(client.wait_readable(Duration::from_secs(5)).unwrap());
        assert!(client.receive().unwrap().is_empty());
        assert!(matches!(
            client.wait_readable(Duration::from_millis(20)),
            Err(TransportError::NotStarted)
        ));
    }
}
