//! # Symbol Encoding
//!
//! Turns a payload into a native-size symbol bitmap: one dot per module,
//! one row for 1D codes, one row per PDF417 row. Scaling happens later in
//! [`super::draw`].
//!
//! The shipped [`DefaultEncoder`] wraps `barcoders` (1D), `qrcode`,
//! `pdf417` and `datamatrix`.

use barcoders::sym::codabar::Codabar;
use barcoders::sym::code11::Code11;
use barcoders::sym::code128::Code128;
use barcoders::sym::code39::Code39;
use barcoders::sym::code93::Code93;
use barcoders::sym::ean8::EAN8;
use barcoders::sym::ean13::EAN13;
use barcoders::sym::tf::TF;
use pdf417::{PDF417, PDF417Encoder, START_PATTERN};
use qrcode::{EcLevel, QrCode};

use super::Symbology;
use crate::error::EtiquetaError;
use crate::render::bitmap::Bitmap;

/// Maximum number of codewords a PDF417 symbol can hold.
const PDF417_MAX_CODEWORDS: usize = 928;

/// Encoder hints drawn from the setup command and field data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodeHints {
    /// QR error correction level (`H`, `Q`, `M`, `L`)
    pub ecc: Option<char>,
    /// PDF417 security level (0–8)
    pub security: Option<u8>,
    pub columns: Option<u8>,
    pub rows: Option<u8>,
    /// PDF417 truncated (compact) form
    pub compact: bool,
    pub check_digit: bool,
    /// Data Matrix shape: `Some(true)` square, `Some(false)` rectangular
    pub square: Option<bool>,
}

/// Encode a payload into an unscaled symbol.
pub trait SymbolEncoder {
    fn encode(
        &self,
        symbology: Symbology,
        payload: &str,
        hints: &EncodeHints,
    ) -> Result<Bitmap, EtiquetaError>;
}

/// Encoder backed by `barcoders`, `qrcode`, `pdf417` and `datamatrix`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultEncoder;

impl SymbolEncoder for DefaultEncoder {
    fn encode(
        &self,
        symbology: Symbology,
        payload: &str,
        hints: &EncodeHints,
    ) -> Result<Bitmap, EtiquetaError> {
        if payload.is_empty() {
            return Err(EtiquetaError::Barcode(format!("{}: empty payload", symbology)));
        }
        match symbology {
            Symbology::Qr => encode_qr(payload, hints),
            Symbology::Pdf417 => encode_pdf417(payload, hints),
            Symbology::DataMatrix => encode_datamatrix(payload, hints),
            Symbology::UpcE => Err(EtiquetaError::Barcode(
                "UPC-E is not supported by the default encoder".to_string(),
            )),
            linear => {
                let modules = encode_linear(linear, payload, hints)?;
                Ok(Bitmap::from_fn(modules.len(), 1, |x, _| modules[x] == 1))
            }
        }
    }
}

// ============================================================================
// 1D
// ============================================================================

fn encode_linear(
    symbology: Symbology,
    payload: &str,
    hints: &EncodeHints,
) -> Result<Vec<u8>, EtiquetaError> {
    let encoded = match symbology {
        Symbology::Code39 => {
            let data = payload.to_uppercase();
            if hints.check_digit {
                Code39::with_checksum(&data).map(|c| c.encode())
            } else {
                Code39::new(&data).map(|c| c.encode())
            }
        }
        Symbology::Code93 => Code93::new(payload).map(|c| c.encode()),
        Symbology::Code11 => Code11::new(payload).map(|c| c.encode()),
        Symbology::Code128 => Code128::new(code128_data(payload)).map(|c| c.encode()),
        Symbology::Codabar => Codabar::new(payload).map(|c| c.encode()),
        Symbology::Ean13 => EAN13::new(fixed_digits(payload, 12)).map(|c| c.encode()),
        Symbology::UpcA => EAN13::new(format!("0{}", fixed_digits(payload, 11))).map(|c| c.encode()),
        Symbology::Ean8 => EAN8::new(fixed_digits(payload, 7)).map(|c| c.encode()),
        Symbology::Interleaved2of5 => {
            let data = if payload.len() % 2 == 1 {
                format!("0{}", payload)
            } else {
                payload.to_string()
            };
            TF::interleaved(data).map(|c| c.encode())
        }
        Symbology::Standard2of5 => TF::standard(payload).map(|c| c.encode()),
        other => {
            return Err(EtiquetaError::Barcode(format!("{} is not a linear symbology", other)));
        }
    };

    encoded.map_err(|e| EtiquetaError::Barcode(format!("{}: {}", symbology, e)))
}

/// Prefix a Code 128 character set: `C` for even-length digit strings, else `B`.
fn code128_data(payload: &str) -> String {
    let all_digits = payload.chars().all(|c| c.is_ascii_digit());
    if all_digits && payload.len() % 2 == 0 {
        format!("\u{0106}{}", payload)
    } else {
        format!("\u{0181}{}", payload)
    }
}

/// Fit a numeric payload to exactly `n` digits: left-pad with zeros, or drop
/// a trailing check digit. Non-numeric payloads pass through for the
/// encoder to reject.
fn fixed_digits(payload: &str, n: usize) -> String {
    if !payload.chars().all(|c| c.is_ascii_digit()) {
        return payload.to_string();
    }
    if payload.len() >= n {
        payload[..n].to_string()
    } else {
        format!("{:0>width$}", payload, width = n)
    }
}

// ============================================================================
// 2D
// ============================================================================

fn encode_qr(payload: &str, hints: &EncodeHints) -> Result<Bitmap, EtiquetaError> {
    let level = match hints.ecc {
        Some('H') => EcLevel::H,
        Some('Q') => EcLevel::Q,
        Some('L') => EcLevel::L,
        _ => EcLevel::M,
    };

    let code = QrCode::with_error_correction_level(payload, level)
        .map_err(|e| EtiquetaError::Barcode(format!("QR code generation failed: {}", e)))?;

    let width = code.width();
    Ok(Bitmap::from_fn(width, width, |x, y| {
        code[(x, y)] == qrcode::Color::Dark
    }))
}

/// Module width of a full PDF417 row:
/// start + left indicator + data columns + right indicator + end.
fn pdf417_width(columns: u8) -> usize {
    pdf417_truncated_width(columns) + 17 + pdf417::END_PATTERN.size() as usize
}

/// Module width of a truncated row before its one-module stop bar.
fn pdf417_truncated_width(columns: u8) -> usize {
    START_PATTERN.size() as usize + 17 + columns as usize * 17
}

fn pdf417_auto_columns(payload: &str) -> u8 {
    ((payload.len() as f32 / 6.0).sqrt().ceil() as u8).clamp(2, 30)
}

fn encode_pdf417(payload: &str, hints: &EncodeHints) -> Result<Bitmap, EtiquetaError> {
    let security = hints.security.unwrap_or(5).min(8);
    let columns = hints
        .columns
        .map(|c| c.clamp(1, 30))
        .unwrap_or_else(|| pdf417_auto_columns(payload));
    let candidates: Vec<u8> = match hints.rows {
        Some(rows) => vec![rows.clamp(3, 90)],
        None => (3..=90).collect(),
    };

    for rows in candidates {
        let capacity = rows as usize * columns as usize;
        if capacity > PDF417_MAX_CODEWORDS {
            break;
        }

        let mut codewords = vec![0u16; capacity];
        let Some((level, filled)) = PDF417Encoder::new(&mut codewords, false)
            .append_ascii(payload)
            .fit_seal()
        else {
            continue;
        };
        if level < security && hints.rows.is_none() {
            continue;
        }

        let symbol = PDF417::new(filled, rows, columns, level);
        let width = pdf417_width(columns);
        let mut bitmap = Bitmap::new(width, rows as usize);
        for (i, bit) in symbol.bits().enumerate() {
            if bit {
                bitmap.set(i % width, i / width, true);
            }
        }

        return Ok(if hints.compact {
            truncate_pdf417(&bitmap, columns)
        } else {
            bitmap
        });
    }

    Err(EtiquetaError::Barcode(format!(
        "PDF417: payload of {} bytes does not fit {} columns",
        payload.len(),
        columns
    )))
}

/// Drop the right row indicator and stop pattern, closing each row with a
/// single dark module.
fn truncate_pdf417(full: &Bitmap, columns: u8) -> Bitmap {
    let keep = pdf417_truncated_width(columns);
    Bitmap::from_fn(keep + 1, full.height(), |x, y| x == keep || full.get(x, y))
}

fn encode_datamatrix(payload: &str, hints: &EncodeHints) -> Result<Bitmap, EtiquetaError> {
    use datamatrix::{DataMatrix, SymbolList};

    let square = hints.square.or(match (hints.columns, hints.rows) {
        (Some(c), Some(r)) => Some(c == r),
        _ => None,
    });
    let symbols = match square {
        Some(true) => SymbolList::default().enforce_square(),
        Some(false) => SymbolList::default().enforce_rectangular(),
        None => SymbolList::default(),
    };

    let code = DataMatrix::encode(payload.as_bytes(), symbols)
        .map_err(|e| EtiquetaError::Barcode(format!("Data Matrix: {:?}", e)))?;
    let pixels = code.bitmap();

    let mut bitmap = Bitmap::new(pixels.width(), pixels.height());
    for (x, y) in pixels.pixels() {
        bitmap.set(x, y, true);
    }
    Ok(bitmap)
}

// ============================================================================
// TESTS
// ============================================================================
