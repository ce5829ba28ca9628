//! UTF-16 text payloads.
//!
//! Outgoing text is a little-endian byte-order mark followed by
//! little-endian code units. Incoming text honours whichever BOM is present
//! and falls back to little-endian without one.

const BOM_LE: [u8; 2] = [0xFF, 0xFE];
const BOM_BE: [u8; 2] = [0xFE, 0xFF];

/// Errors decoding a UTF-16 payload.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// UTF-16 needs an even number of bytes.
    #[error("odd payload length {0} for UTF-16 text")]
    OddLength(usize),

    /// The code units contain an unpaired surrogate.
    #[error("{0}")]
    InvalidUtf16(#[from] std::string::FromUtf16Error),
}

/// Encode text as BOM-prefixed little-endian UTF-16.
pub fn encode_utf16(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + text.len() * 2);
    out.extend_from_slice(&BOM_LE);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

/// Decode UTF-16 bytes, consuming a leading BOM if there is one.
pub fn decode_utf16(bytes: &[u8]) -> Result<String, TextError> {
    if bytes.len() % 2 != 0 {
        return Err(TextError::OddLength(bytes.len()));
    }

    let (body, big_endian) = match bytes.get(..2) {
        Some(bom) if bom == BOM_LE => (&bytes[2..], false),
        Some(bom) if bom == BOM_BE => (&bytes[2..], true),
        _ => (bytes, false),
    };

    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            let pair = [pair[0], pair[1]];
            if big_endian {
                u16::from_be_bytes(pair)
            } else {
                u16::from_le_bytes(pair)
            }
        })
        .collect();

    Ok(String::from_utf16(&units)?)
}
