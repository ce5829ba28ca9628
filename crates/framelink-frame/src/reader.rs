use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::codec::{decode_header, FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Read exactly `n` bytes, or stop early if the peer closes.
///
/// Loops over partial reads until `n` bytes are gathered. A zero-byte read
/// before that point means the peer closed the stream, reported as
/// `Ok(None)`. The buffer grows one zeroed chunk at a time, and a chunk is
/// only extended once it has been filled, so a large `n` never allocates
/// ahead of the bytes actually received.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, n: usize) -> Result<Option<BytesMut>> {
    let mut buf = BytesMut::with_capacity(n.min(READ_CHUNK_SIZE));
    let mut filled = 0;

    while filled < n {
        if filled == buf.len() {
            let grow = (n - filled).min(READ_CHUNK_SIZE);
            buf.resize(filled + grow, 0);
        }

        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Ok(None),
            Ok(read) => filled += read,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(FrameError::Io(err)),
        }
    }

    Ok(Some(buf))
}

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete payloads.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next complete payload (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when the peer closes,
    /// whether between frames or in the middle of one.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        let header = read_exact_or_eof(&mut self.inner, HEADER_SIZE)?
            .ok_or(FrameError::ConnectionClosed)?;

        let mut raw = [0u8; HEADER_SIZE];
        raw.copy_from_slice(&header);
        let len = decode_header(raw);

        if len > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: len,
                max: self.config.max_payload_size,
            });
        }

        let payload =
            read_exact_or_eof(&mut self.inner, len)?.ok_or(FrameError::ConnectionClosed)?;
        trace!(len, "frame read");
        Ok(payload.freeze())
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
