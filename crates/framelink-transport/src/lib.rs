//! Client transports for shipping payloads from a sensor device to a collector.
//!
//! Two transports sit behind the [`Client`] contract:
//! - [`StreamClient`]: TCP, every payload framed with a 4-byte big-endian length
//! - [`DatagramClient`]: UDP, one payload per datagram, no framing, no retry
//!
//! Both share the same lifecycle: construct, [`Client::start`], any number of
//! sends and receives, then [`Client::close`]. [`AnyClient`] picks one of the
//! two at runtime from a [`TransportKind`].

pub mod client;
pub mod config;
pub mod datagram;
pub mod endpoint;
pub mod error;
pub mod listener;
pub mod stream;
pub mod text;

pub use client::{AnyClient, Client, TransportKind};
pub use config::ClientConfig;
pub use datagram::{DatagramClient, MAX_DATAGRAM_SIZE};
pub use endpoint::Endpoint;
pub use error::{Result, TransportError};
pub use listener::{DatagramListener, StreamListener};
pub use stream::StreamClient;
pub use text::{decode_utf16, encode_utf16, TextError};
