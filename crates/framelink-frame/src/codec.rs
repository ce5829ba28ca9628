use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: payload length as a big-endian `u32`.
pub const HEADER_SIZE: usize = 4;

/// Largest payload the length header can describe.
pub const MAX_FRAME_PAYLOAD: usize = u32::MAX as usize;

/// Build the length header for a payload of `len` bytes.
pub fn encode_header(len: usize) -> Result<[u8; HEADER_SIZE]> {
    let len = u32::try_from(len).map_err(|_| FrameError::PayloadTooLarge {
        size: len,
        max: MAX_FRAME_PAYLOAD,
    })?;
    Ok(len.to_be_bytes())
}

/// Payload length carried by a header.
pub fn decode_header(header: [u8; HEADER_SIZE]) -> usize {
    u32::from_be_bytes(header) as usize
}

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────────┬──────────────────────┐
/// │ Length (4B BE)   │ Payload              │
/// │ u32              │ (Length bytes)       │
/// └──────────────────┴──────────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let header = encode_header(payload.len())?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&header);
    dst.put_slice(payload);
    Ok(())
}

/// Decode one frame from a buffer that may hold partial or several frames.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let mut header = [0u8; HEADER_SIZE];
    header.copy_from_slice(&src[..HEADER_SIZE]);
    let payload_len = decode_header(header);

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    if src.len() < HEADER_SIZE + payload_len {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    Ok(Some(src.split_to(payload_len).freeze()))
}

/// Configuration for frame readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest payload accepted on receive. Default: [`MAX_FRAME_PAYLOAD`],
    /// i.e. no cap beyond what the header can express.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_FRAME_PAYLOAD,
        }
    }
}
