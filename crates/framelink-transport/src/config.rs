use std::time::Duration;

use framelink_frame::{FrameConfig, MAX_FRAME_PAYLOAD};

/// Socket options applied by [`Client::start`](crate::Client::start).
///
/// Everything here is set on the socket before `start` returns. A timeout
/// that later expires is an ordinary I/O error: the stream client closes,
/// the datagram client returns it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bound on the TCP handshake. `None` uses the OS default.
    pub connect_timeout: Option<Duration>,
    /// Read timeout. `None` blocks until data or peer close.
    pub read_timeout: Option<Duration>,
    /// Write timeout. `None` blocks until the kernel accepts the bytes.
    pub write_timeout: Option<Duration>,
    /// Disable Nagle's algorithm on stream sockets.
    pub nodelay: bool,
    /// Largest framed payload accepted on stream receive.
    pub max_payload_size: usize,
}

impl ClientConfig {
    pub(crate) fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_payload_size: self.max_payload_size,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
            nodelay: false,
            max_payload_size: MAX_FRAME_PAYLOAD,
        }
    }
}
