//! Length-prefixed message framing for stream sockets.
//!
//! Every message on the wire is a 4-byte big-endian payload length followed
//! by exactly that many payload bytes. Nothing else: no magic, no channel,
//! no trailer.
//!
//! [`FrameReader`] and [`FrameWriter`] hide partial reads and short writes so
//! callers only ever see whole payloads.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, decode_header, encode_frame, encode_header, FrameConfig, HEADER_SIZE,
    MAX_FRAME_PAYLOAD,
};
pub use error::{FrameError, Result};
pub use reader::{read_exact_or_eof, FrameReader};
pub use writer::FrameWriter;
