//! Producer loop in the shape the camera pipeline uses: start once, send
//! encoded frames, close on the way out.
//!
//! Run with:
//!   cargo run --example frame-sender -- 127.0.0.1:5005 udp

use std::time::Duration;

use framelink::{AnyClient, Client, ClientConfig, Endpoint, TransportKind};

/// Stand-in for an encoded camera frame: JPEG SOI, a counter, JPEG EOI.
fn fake_jpeg(seq: u32) -> Vec<u8> {
    let mut frame = vec![0xFF, 0xD8, 0xFF, 0xE0];
    frame.extend_from_slice(&seq.to_be_bytes());
    frame.resize(4096, 0x80);
    frame.extend_from_slice(&[0xFF, 0xD9]);
    frame
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let endpoint: Endpoint = args.next().as_deref().unwrap_or("127.0.0.1:5005").parse()?;
    let kind: TransportKind = args.next().as_deref().unwrap_or("stream").parse()?;

    let mut client = AnyClient::new(kind, endpoint, ClientConfig::default())?;
    client.start()?;
    eprintln!("Streaming to {} over {}", client.endpoint(), client.kind());

    let result = (0..100).try_for_each(|seq| -> Result<(), Box<dyn std::error::Error>> {
        client.send(&fake_jpeg(seq))?;
        if !client.is_started() {
            return Err("connection lost".into());
        }
        std::thread::sleep(Duration::from_millis(33));
        Ok(())
    });

    client.close();
    result
}
