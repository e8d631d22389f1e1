//! # Barcode Placement
//!
//! Scales a native symbol to its printed size and draws it at the field
//! origin.
//!
//! ## Scaling
//!
//! | Family | Width | Height |
//! |--------|-------|--------|
//! | QR, Data Matrix | modules × magnification | modules × magnification |
//! | PDF417 | modules × module width | rows × row height |
//! | 1D | modules × module width | bar height |
//! | 1D two-width | narrow/wide runs per `^BY` ratio | bar height |
//!
//! Rotation pivots on the field origin and applies to the symbol only; the
//! interpretation line is drawn for unrotated 1D symbols only.

use log::warn;

use super::encode::{EncodeHints, SymbolEncoder};
use super::setup::{BarcodeDefaults, BarcodeSetup, SymbologyOptions};
use super::Symbology;
use crate::error::EtiquetaError;
use crate::fonts::FontSpec;
use crate::render::bitmap::Bitmap;
use crate::render::surface::{Point, Rect, Rotation, Surface, TextAlign, Tone};

/// Gap between the symbol top and an interpretation line printed above it.
const CAPTION_GAP: f32 = 2.0;

/// Interpretation-line glyph height for a field font height.
pub fn caption_height(font_height: f32) -> f32 {
    (font_height * 0.8).max(8.0)
}

/// Encode `data` per `setup`, scale it, and draw it at `origin`.
///
/// `caption` is the resolved interpretation-line font; when `None` the line
/// is skipped with a warning. Returns the symbol's unrotated bounds.
pub fn draw_barcode(
    surface: &mut dyn Surface,
    encoder: &dyn SymbolEncoder,
    setup: &BarcodeSetup,
    defaults: &BarcodeDefaults,
    origin: Point,
    data: &str,
    caption: Option<&FontSpec>,
) -> Result<Rect, EtiquetaError> {
    let (payload, hints) = prepare_payload(setup, data);
    let symbol = encoder.encode(setup.symbology, &payload, &hints)?;
    if symbol.is_empty() {
        return Err(EtiquetaError::Barcode(format!(
            "{}: encoder returned an empty symbol",
            setup.symbology
        )));
    }

    let (bitmap, size) = scale_symbol(setup, defaults, symbol);
    let dest = Rect::new(origin.x, origin.y, size.0, size.1);
    if dest.width <= 0.0 || dest.height <= 0.0 {
        return Err(EtiquetaError::Barcode(format!(
            "{}: degenerate size {}x{}",
            setup.symbology, dest.width, dest.height
        )));
    }

    if setup.orientation == Rotation::Normal {
        surface.draw_bitmap(&bitmap, dest);
    } else {
        surface.save_rotated(origin, setup.orientation);
        surface.draw_bitmap(&bitmap, dest);
        surface.restore();
    }

    if setup.prints_interpretation() && setup.orientation == Rotation::Normal {
        draw_caption(surface, setup, &dest, data, caption);
    }

    Ok(dest)
}

fn draw_caption(
    surface: &mut dyn Surface,
    setup: &BarcodeSetup,
    dest: &Rect,
    text: &str,
    caption: Option<&FontSpec>,
) {
    let Some(font) = caption else {
        warn!("No font available for {} interpretation line", setup.symbology);
        return;
    };
    let baseline = if setup.line_above {
        dest.y - CAPTION_GAP
    } else {
        dest.bottom() + font.height
    };
    let at = Point::new(dest.center().x, baseline);
    if let Err(e) = surface.draw_text(text, at, TextAlign::Center, font, Tone::Black) {
        warn!("{} interpretation line skipped: {}", setup.symbology, e);
    }
}

/// Payload and encoder hints for the field data.
///
/// QR data may begin with `<ecc><mode>,` which overrides the setup's error
/// correction level. Codabar data without start/stop characters gets the
/// setup's guards.
pub fn prepare_payload(setup: &BarcodeSetup, data: &str) -> (String, EncodeHints) {
    let mut hints = EncodeHints {
        check_digit: setup.check_digit,
        ..Default::default()
    };

    let payload = match &setup.options {
        SymbologyOptions::Qr { ecc, .. } => {
            let (level, body) = split_qr_prefix(data).unwrap_or((*ecc, data));
            hints.ecc = Some(level);
            body.to_string()
        }
        SymbologyOptions::Pdf417 {
            security,
            columns,
            rows,
            truncate,
        } => {
            hints.security = Some((*security).clamp(0, 8) as u8);
            hints.columns = columns.map(|c| c.clamp(1, 30) as u8);
            hints.rows = rows.map(|r| r.clamp(3, 90) as u8);
            hints.compact = *truncate;
            data.to_string()
        }
        SymbologyOptions::DataMatrix {
            columns,
            rows,
            square,
            ..
        } => {
            hints.columns = columns.map(|c| c.clamp(1, 255) as u8);
            hints.rows = rows.map(|r| r.clamp(1, 255) as u8);
            hints.square = *square;
            data.to_string()
        }
        SymbologyOptions::Codabar { start, stop } => {
            if is_codabar_guard(data.chars().next()) && is_codabar_guard(data.chars().last()) {
                data.to_string()
            } else {
                format!("{}{}{}", start, data, stop)
            }
        }
        SymbologyOptions::Linear => data.to_string(),
    };

    (payload, hints)
}

fn split_qr_prefix(data: &str) -> Option<(char, &str)> {
    let mut chars = data.chars();
    let ecc = chars.next()?.to_ascii_uppercase();
    let mode = chars.next()?.to_ascii_uppercase();
    let comma = chars.next()?;
    let valid = matches!(ecc, 'H' | 'Q' | 'M' | 'L') && matches!(mode, 'A' | 'M') && comma == ',';
    valid.then(|| (ecc, &data[3..]))
}

fn is_codabar_guard(c: Option<char>) -> bool {
    matches!(c.map(|c| c.to_ascii_uppercase()), Some('A'..='D'))
}

/// The bitmap to draw and its printed size in dots.
fn scale_symbol(
    setup: &BarcodeSetup,
    defaults: &BarcodeDefaults,
    symbol: Bitmap,
) -> (Bitmap, (f32, f32)) {
    let module = defaults.module_width.max(1);
    let bar_height = setup.bar_height(defaults) as f32;

    match (&setup.options, setup.symbology) {
        (SymbologyOptions::Qr { magnification, .. }, _) => {
            let m = *magnification as f32;
            let size = (symbol.width() as f32 * m, symbol.height() as f32 * m);
            (symbol, size)
        }
        (SymbologyOptions::DataMatrix { module: element, .. }, _) => {
            let m = element.unwrap_or(module) as f32;
            let size = (symbol.width() as f32 * m, symbol.height() as f32 * m);
            (symbol, size)
        }
        (_, Symbology::Pdf417) => {
            let size = (
                (symbol.width() as i32 * module) as f32,
                symbol.height() as f32 * bar_height,
            );
            (symbol, size)
        }
        (_, symbology) if symbology.is_two_width() => {
            let expanded = expand_runs(&symbol, module as usize, defaults.wide_width().max(1) as usize);
            let size = (expanded.width() as f32, bar_height);
            (expanded, size)
        }
        _ => {
            let size = ((symbol.width() as i32 * module) as f32, bar_height);
            (symbol, size)
        }
    }
}

/// Rebuild a one-row symbol with single-module runs as `narrow` dots and
/// longer runs as `wide` dots.
fn expand_runs(row: &Bitmap, narrow: usize, wide: usize) -> Bitmap {
    let mut bars: Vec<bool> = Vec::new();
    let mut x = 0;
    while x < row.width() {
        let dark = row.get(x, 0);
        let start = x;
        while x < row.width() && row.get(x, 0) == dark {
            x += 1;
        }
        let width = if x - start == 1 { narrow } else { wide };
        bars.extend(std::iter::repeat_n(dark, width));
    }
    Bitmap::from_fn(bars.len(), 1, |x, _| bars[x])
}

// ============================================================================
// TESTS
// ============================================================================
