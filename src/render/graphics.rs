//! # Downloaded Graphics
//!
//! `~DG` stores a named bitmap, `^XG` recalls it at the field origin, and
//! `^GF` draws an inline graphic directly. All three share one decoder.
//!
//! ## Payload Encodings
//!
//! ```text
//! :B64:<base64 image file>[:crc]   → image decoder
//! :Z64:<base64 zlib data>[:crc]    → inflate → image file, or packed 1bpp
//! <hex digits>                     → packed 1bpp
//! ```
//!
//! Packed data is row-major, `bytes_per_row × 8` pixels wide and
//! `total_bytes / bytes_per_row` rows tall, most significant bit first.
//! Rows past the end of the supplied data are blank and are not allocated.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::read::ZlibDecoder;
use log::{debug, warn};

use super::bitmap::Bitmap;
use super::options::MAX_PIXEL_DIMENSION;
use super::state::RenderState;
use super::surface::{Rect, Surface};
use crate::error::EtiquetaError;
use crate::protocol::hex::decode_hex_payload;
use crate::protocol::params::{field, int_field, split_params, split_params_n};

const BASE64_MARKER: &str = ":B64:";
const ZLIB_MARKER: &str = ":Z64:";

/// Largest packed graphic accepted: a full-size frame at one bit per pixel.
pub const MAX_GRAPHIC_BYTES: usize = (MAX_PIXEL_DIMENSION * MAX_PIXEL_DIMENSION / 8) as usize;

// ============================================================================
// STORE
// ============================================================================

/// Name-keyed table of decoded graphics.
///
/// Names are case-insensitive and a leading storage-device prefix
/// (`R:`, `E:`, ...) is ignored, so `~DGR:LOGO.GRF` and `^XGLOGO.GRF` match.
#[derive(Debug, Default, Clone)]
pub struct GraphicStore {
    entries: HashMap<String, Bitmap>,
}

impl GraphicStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bitmap`, returning the entry it replaced.
    pub fn insert(&mut self, name: &str, bitmap: Bitmap) -> Option<Bitmap> {
        self.entries.insert(normalize_name(name), bitmap)
    }

    pub fn get(&self, name: &str) -> Option<&Bitmap> {
        self.entries.get(&normalize_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&normalize_name(name))
    }

    /// For callers that reuse a store across renders.
    pub fn remove(&mut self, name: &str) -> Option<Bitmap> {
        self.entries.remove(&normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// For callers that reuse a store across renders.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Uppercase and drop a one-letter device prefix.
pub fn normalize_name(name: &str) -> String {
    let name = name.trim().to_uppercase();
    let bytes = name.as_bytes();
    if bytes.len() > 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        name[2..].to_string()
    } else {
        name
    }
}

// ============================================================================
// DECODE
// ============================================================================

/// Decode a graphic payload described by `total_bytes` and `bytes_per_row`.
pub fn decode_graphic(
    total_bytes: i32,
    bytes_per_row: i32,
    data: &str,
) -> Result<Bitmap, EtiquetaError> {
    let data = data.trim();

    if let Some(body) = strip_marker(data, BASE64_MARKER) {
        let bytes = decode_base64(body)?;
        return decode_image(&bytes);
    }

    if let Some(body) = strip_marker(data, ZLIB_MARKER) {
        let compressed = decode_base64(body)?;
        let mut inflated = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .take(MAX_GRAPHIC_BYTES as u64 + 1)
            .read_to_end(&mut inflated)
            .map_err(|e| EtiquetaError::Graphic(format!("zlib: {}", e)))?;
        if inflated.len() > MAX_GRAPHIC_BYTES {
            return Err(EtiquetaError::Graphic(format!(
                "inflated graphic exceeds {} bytes",
                MAX_GRAPHIC_BYTES
            )));
        }

        if image::guess_format(&inflated).is_ok() {
            return decode_image(&inflated);
        }
        return unpack(total_bytes, bytes_per_row, &inflated);
    }

    let bytes = decode_hex_payload(data)?;
    unpack(total_bytes, bytes_per_row, &bytes)
}

/// Decode an embedded image file, refusing frames larger than a label.
fn decode_image(bytes: &[u8]) -> Result<Bitmap, EtiquetaError> {
    let mut limits = image::Limits::default();
    limits.max_image_width = Some(MAX_PIXEL_DIMENSION as u32);
    limits.max_image_height = Some(MAX_PIXEL_DIMENSION as u32);

    let mut reader = image::ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    reader.limits(limits);
    let image = reader.decode()?;
    Ok(Bitmap::from_image(&image))
}

fn strip_marker<'a>(data: &'a str, marker: &str) -> Option<&'a str> {
    let head = data.get(..marker.len())?;
    head.eq_ignore_ascii_case(marker).then(|| &data[marker.len()..])
}

/// Base64 body with any trailing `:crc` removed.
fn decode_base64(body: &str) -> Result<Vec<u8>, EtiquetaError> {
    let body = body.split(':').next().unwrap_or_default();
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| EtiquetaError::Graphic(format!("base64: {}", e)))
}

fn unpack(total_bytes: i32, bytes_per_row: i32, bytes: &[u8]) -> Result<Bitmap, EtiquetaError> {
    if bytes_per_row <= 0 {
        return Err(EtiquetaError::Graphic(format!(
            "bytes per row must be positive, got {}",
            bytes_per_row
        )));
    }
    let row = bytes_per_row as usize;
    if row * 8 > MAX_PIXEL_DIMENSION as usize {
        return Err(EtiquetaError::Graphic(format!(
            "{} bytes per row is wider than {} dots",
            row, MAX_PIXEL_DIMENSION
        )));
    }
    let total = if total_bytes > 0 {
        total_bytes as usize
    } else {
        bytes.len()
    };
    if total > MAX_GRAPHIC_BYTES {
        return Err(EtiquetaError::Graphic(format!(
            "declared size {} exceeds {} bytes",
            total, MAX_GRAPHIC_BYTES
        )));
    }
    if total % row != 0 {
        warn!(
            "Graphic size {} is not a multiple of {} bytes per row",
            total, row
        );
    }
    let declared_rows = total / row;
    if declared_rows == 0 {
        return Err(EtiquetaError::Graphic(format!(
            "{} bytes is less than one {}-byte row",
            total, row
        )));
    }
    if declared_rows > MAX_PIXEL_DIMENSION as usize {
        return Err(EtiquetaError::Graphic(format!(
            "{} rows is taller than {} dots",
            declared_rows, MAX_PIXEL_DIMENSION
        )));
    }

    // Missing rows would be blank and only black pixels are drawn.
    let height = declared_rows.min(bytes.len().div_ceil(row)).max(1);
    if height < declared_rows {
        debug!(
            "Graphic data covers {} of {} rows, rest left blank",
            height, declared_rows
        );
    }
    Ok(Bitmap::from_packed(row, height, bytes))
}

// ============================================================================
// COMMANDS
// ============================================================================

/// `~DG name,total,bytes_per_row,data`. Returns the stored name.
pub fn download_graphic(
    store: &mut GraphicStore,
    parameters: &str,
) -> Result<String, EtiquetaError> {
    let fields = split_params_n(parameters, 4);
    let name = field(&fields, 0)
        .ok_or_else(|| EtiquetaError::Graphic("download without a name".to_string()))?;
    let total = int_field(&fields, 1, 0);
    let per_row = int_field(&fields, 2, 0);
    let data = fields.get(3).copied().unwrap_or_default();

    let bitmap = decode_graphic(total, per_row, data)?;
    debug!(
        "Stored graphic {} ({}x{})",
        name,
        bitmap.width(),
        bitmap.height()
    );
    store.insert(name, bitmap);
    Ok(normalize_name(name))
}

/// `^XG name,mx,my`: draw a stored graphic scaled by 1–10 on each axis.
pub fn recall_graphic(
    state: &mut RenderState,
    store: &GraphicStore,
    surface: &mut dyn Surface,
    parameters: &str,
) -> Result<(), EtiquetaError> {
    let fields = split_params(parameters);
    let name = field(&fields, 0)
        .ok_or_else(|| EtiquetaError::Graphic("recall without a name".to_string()))?;
    let bitmap = store
        .get(name)
        .ok_or_else(|| EtiquetaError::Graphic(format!("no stored graphic named {}", name)))?;

    let mx = int_field(&fields, 1, 1).clamp(1, 10) as f32;
    let my = int_field(&fields, 2, 1).clamp(1, 10) as f32;
    if state.reverse {
        warn!("Reverse is not supported for recalled graphics, ignoring");
    }

    let dest = Rect::new(
        state.cursor.x,
        state.cursor.y,
        bitmap.width() as f32 * mx,
        bitmap.height() as f32 * my,
    );
    surface.draw_bitmap(bitmap, dest);
    Ok(())
}

/// `^GF format,binary_bytes,total,bytes_per_row,data`: draw at 1:1.
pub fn graphic_field(
    state: &mut RenderState,
    surface: &mut dyn Surface,
    parameters: &str,
) -> Result<(), EtiquetaError> {
    let fields = split_params_n(parameters, 5);
    let total = int_field(&fields, 2, 0);
    let per_row = int_field(&fields, 3, 0);
    let data = fields.get(4).copied().unwrap_or_default();

    let bitmap = decode_graphic(total, per_row, data)?;
    if state.reverse {
        warn!("Reverse is not supported for graphic fields, ignoring");
    }
    let dest = Rect::new(
        state.cursor.x,
        state.cursor.y,
        bitmap.width() as f32,
        bitmap.height() as f32,
    );
    surface.draw_bitmap(&bitmap, dest);
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
