//! Hex decoding for field data escapes and graphic payloads.
//!
//! Two forms appear in label source:
//!
//! - Field hex escapes: after `^FH`, an indicator character (default `_`)
//!   followed by two hex digits stands for one byte, e.g. `_24` for `$`.
//! - Graphic payloads: plain ASCII hex, two digits per byte, whitespace
//!   ignored.

use crate::error::EtiquetaError;

/// Default indicator character for field hex escapes.
pub const DEFAULT_INDICATOR: u8 = b'_';

/// Decode `indicator + XX` escapes in field data.
///
/// Invalid or truncated sequences are copied through unchanged. The decoded
/// bytes are interpreted as UTF-8, with invalid sequences replaced.
///
/// ```
/// use etiqueta::protocol::hex::decode_field_escapes;
///
/// assert_eq!(decode_field_escapes("Price:_20_2410", b'_'), "Price: $10");
/// ```
pub fn decode_field_escapes(content: &str, indicator: u8) -> String {
    let bytes = content.as_bytes();
    let mut output = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == indicator && i + 2 < bytes.len() {
            if let Some(byte) = hex_pair(bytes[i + 1], bytes[i + 2]) {
                output.push(byte);
                i += 3;
                continue;
            }
        }
        output.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&output).into_owned()
}

/// Decode an ASCII hex payload into bytes.
pub fn decode_hex_payload(data: &str) -> Result<Vec<u8>, EtiquetaError> {
    let digits: Vec<u8> = data
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    if digits.len() % 2 != 0 {
        return Err(EtiquetaError::Graphic(format!(
            "hex payload has odd digit count {}",
            digits.len()
        )));
    }

    digits
        .chunks_exact(2)
        .enumerate()
        .map(|(idx, pair)| {
            hex_pair(pair[0], pair[1]).ok_or_else(|| {
                EtiquetaError::Graphic(format!(
                    "invalid hex digits {:?} at byte {}",
                    String::from_utf8_lossy(pair),
                    idx
                ))
            })
        })
        .collect()
}

/// Convert two ASCII hex digits to a byte.
fn hex_pair(h1: u8, h2: u8) -> Option<u8> {
    Some((hex_digit_value(h1)? << 4) | hex_digit_value(h2)?)
}

fn hex_digit_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}
