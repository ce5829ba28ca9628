use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use framelink_transport::{decode_utf16, TransportKind};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// How to render a payload preview.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadEncoding {
    /// UTF-8 when it decodes, otherwise a size summary.
    Auto,
    /// UTF-16 text as produced by `send_string`.
    Utf16,
}

/// One received payload, as reported to the operator.
pub struct Received<'a> {
    pub transport: TransportKind,
    pub peer: &'a str,
    pub seq: usize,
    pub payload: &'a [u8],
}

#[derive(Serialize)]
struct PayloadOutput<'a> {
    transport: &'a str,
    peer: &'a str,
    seq: usize,
    size: usize,
    content: &'a str,
    payload: String,
    timestamp: String,
}

pub fn print_payload(received: &Received<'_>, encoding: PayloadEncoding, format: OutputFormat) {
    let content = content_kind(received.payload, encoding);
    match format {
        OutputFormat::Json => {
            let out = PayloadOutput {
                transport: received.transport.as_str(),
                peer: received.peer,
                seq: received.seq,
                size: received.payload.len(),
                content,
                payload: payload_preview(received.payload, encoding),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SEQ", "TRANSPORT", "PEER", "SIZE", "CONTENT", "PAYLOAD"])
                .add_row(vec![
                    received.seq.to_string(),
                    received.transport.to_string(),
                    received.peer.to_string(),
                    received.payload.len().to_string(),
                    content.to_string(),
                    payload_preview(received.payload, encoding),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "#{} {} peer={} size={} content={} payload={}",
                received.seq,
                received.transport,
                received.peer,
                received.payload.len(),
                content,
                payload_preview(received.payload, encoding)
            );
        }
        OutputFormat::Raw => print_raw(received.payload),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Coarse content classification for the summary columns.
pub fn content_kind(payload: &[u8], encoding: PayloadEncoding) -> &'static str {
    if payload.is_empty() {
        "empty"
    } else if payload.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "jpeg"
    } else if encoding == PayloadEncoding::Utf16 {
        "utf-16"
    } else if std::str::from_utf8(payload).is_ok() {
        "utf-8"
    } else {
        "binary"
    }
}

pub fn payload_preview(payload: &[u8], encoding: PayloadEncoding) -> String {
    if payload.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return format!("<jpeg {} bytes>", payload.len());
    }
    match encoding {
        PayloadEncoding::Utf16 => decode_utf16(payload)
            .unwrap_or_else(|_| format!("<invalid utf-16 {} bytes>", payload.len())),
        PayloadEncoding::Auto => match std::str::from_utf8(payload) {
            Ok(text) => text.to_string(),
            Err(_) => format!("<binary {} bytes>", payload.len()),
        },
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
