//! Minimal stream collector: accepts one sender and reports each payload.
//!
//! Run with:
//!   cargo run --example collector
//!
//! In another terminal:
//!   cargo run --features cli -- send --host 127.0.0.1 --port 5005 --text "héllo"

use framelink::transport::StreamListener;
use framelink::Client;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = StreamListener::bind("127.0.0.1:5005".parse()?)?;
    eprintln!("Listening on {}", listener.local_addr()?);

    let mut peer = listener.accept()?;
    eprintln!("Sender connected: {}", peer.peer_addr());

    loop {
        let payload = peer.receive()?;
        if payload.is_empty() && !peer.is_started() {
            eprintln!("Sender disconnected");
            break;
        }
        if payload.starts_with(&[0xFF, 0xD8, 0xFF]) {
            eprintln!("JPEG frame, {} bytes", payload.len());
        } else {
            match framelink::transport::decode_utf16(&payload) {
                Ok(text) => eprintln!("Text: {text}"),
                Err(_) => eprintln!("Binary payload, {} bytes", payload.len()),
            }
        }
    }

    Ok(())
}
