//! Framed payload transport from a sensor device to a remote collector.
//!
//! framelink moves opaque binary payloads (JPEG frames, UTF-16 text) over
//! either a reliable TCP connection with 4-byte big-endian length framing or
//! a best-effort UDP socket with one payload per datagram.
//!
//! # Crate Structure
//!
//! - [`frame`]: Length-prefix codec, exact-read, frame reader/writer
//! - [`transport`]: The [`Client`](transport::Client) contract, stream and
//!   datagram clients, collector-side listeners

/// Re-export frame types.
pub mod frame {
    pub use framelink_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use framelink_transport::*;
}

pub use framelink_transport::{AnyClient, Client, ClientConfig, Endpoint, TransportKind};
