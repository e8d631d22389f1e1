//! Test doubles: a surface that records draw calls, a fixed-output symbol
//! encoder, and an in-memory file probe.

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::bitmap::Bitmap;
use super::surface::{Point, Rect, Rotation, Surface, TextAlign, Tone};
use crate::barcode::{EncodeHints, Symbology, SymbolEncoder};
use crate::error::EtiquetaError;
use crate::fonts::{FileProbe, FontMap, FontResolver, FontSpec};

/// Path every test font map points at.
pub(crate) const TEST_FONT: &str = "/fonts/test.ttf";

/// Advance per character, as a fraction of the glyph width.
pub(crate) const ADVANCE: f32 = 0.5;

/// File probe over a fixed set of paths.
pub(crate) struct FakeProbe {
    existing: HashSet<PathBuf>,
}

impl FakeProbe {
    pub(crate) fn new(paths: &[&str]) -> Self {
        Self {
            existing: paths.iter().map(PathBuf::from).collect(),
        }
    }
}

impl FileProbe for FakeProbe {
    fn exists(&self, path: &Path) -> bool {
        self.existing.contains(path)
    }
}

/// Resolver where `0` and `DEFAULT` map to [`TEST_FONT`], which exists.
pub(crate) fn test_fonts() -> FontResolver {
    let mut map = FontMap::new();
    map.insert("0", TEST_FONT);
    map.insert("DEFAULT", TEST_FONT);
    FontResolver::with_map(map, None, Arc::new(FakeProbe::new(&[TEST_FONT])))
}

/// Resolver with nothing installed.
pub(crate) fn no_fonts() -> FontResolver {
    FontResolver::with_map(FontMap::new(), None, Arc::new(FakeProbe::new(&[])))
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Clear(Tone),
    FillRect {
        rect: Rect,
        radius: f32,
        tone: Tone,
    },
    StrokeRect {
        rect: Rect,
        radius: f32,
        thickness: f32,
        tone: Tone,
    },
    FillOval {
        bounds: Rect,
        tone: Tone,
    },
    StrokeOval {
        bounds: Rect,
        thickness: f32,
        tone: Tone,
    },
    Line {
        from: Point,
        to: Point,
        thickness: f32,
        tone: Tone,
    },
    Text {
        text: String,
        at: Point,
        align: TextAlign,
        height: f32,
        tone: Tone,
    },
    Bitmap {
        bitmap: Bitmap,
        dest: Rect,
    },
    SaveRotated {
        pivot: Point,
        rotation: Rotation,
    },
    Restore,
}

/// Records every call. Text measures `ADVANCE × width` per character.
pub(crate) struct RecordingSurface {
    width: u32,
    height: u32,
    pub(crate) calls: Vec<Call>,
}

impl RecordingSurface {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
        }
    }

    pub(crate) fn texts(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Text { .. }))
            .collect()
    }

    pub(crate) fn bitmaps(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Bitmap { .. }))
            .collect()
    }
}

pub(crate) fn text_width(text: &str, font: &FontSpec) -> f32 {
    text.chars().count() as f32 * font.width * ADVANCE
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, tone: Tone) {
        self.calls.push(Call::Clear(tone));
    }

    fn fill_rect(&mut self, rect: Rect, radius: f32, tone: Tone) {
        self.calls.push(Call::FillRect { rect, radius, tone });
    }

    fn stroke_rect(&mut self, rect: Rect, radius: f32, thickness: f32, tone: Tone) {
        self.calls.push(Call::StrokeRect {
            rect,
            radius,
            thickness,
            tone,
        });
    }

    fn fill_oval(&mut self, bounds: Rect, tone: Tone) {
        self.calls.push(Call::FillOval { bounds, tone });
    }

    fn stroke_oval(&mut self, bounds: Rect, thickness: f32, tone: Tone) {
        self.calls.push(Call::StrokeOval {
            bounds,
            thickness,
            tone,
        });
    }

    fn draw_line(&mut self, from: Point, to: Point, thickness: f32, tone: Tone) {
        self.calls.push(Call::Line {
            from,
            to,
            thickness,
            tone,
        });
    }

    fn measure_text(&mut self, text: &str, font: &FontSpec) -> Result<f32, EtiquetaError> {
        Ok(text_width(text, font))
    }

    fn draw_text(
        &mut self,
        text: &str,
        at: Point,
        align: TextAlign,
        font: &FontSpec,
        tone: Tone,
    ) -> Result<(), EtiquetaError> {
        self.calls.push(Call::Text {
            text: text.to_string(),
            at,
            align,
            height: font.height,
            tone,
        });
        Ok(())
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, dest: Rect) {
        self.calls.push(Call::Bitmap {
            bitmap: bitmap.clone(),
            dest,
        });
    }

    fn save_rotated(&mut self, pivot: Point, rotation: Rotation) {
        self.calls.push(Call::SaveRotated { pivot, rotation });
    }

    fn restore(&mut self) {
        self.calls.push(Call::Restore);
    }

    fn encode_png(&self) -> Result<Vec<u8>, EtiquetaError> {
        Ok(Vec::new())
    }
}

/// Returns a fixed symbol (or always fails) and records each request.
pub(crate) struct FakeEncoder {
    symbol: Option<Bitmap>,
    requests: RefCell<Vec<(Symbology, String, EncodeHints)>>,
}

impl FakeEncoder {
    pub(crate) fn new(symbol: Bitmap) -> Self {
        Self {
            symbol: Some(symbol),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            symbol: None,
            requests: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn last(&self) -> Option<(Symbology, String, EncodeHints)> {
        self.requests.borrow().last().cloned()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl SymbolEncoder for FakeEncoder {
    fn encode(
        &self,
        symbology: Symbology,
        payload: &str,
        hints: &EncodeHints,
    ) -> Result<Bitmap, EtiquetaError> {
        self.requests
            .borrow_mut()
            .push((symbology, payload.to_string(), hints.clone()));
        self.symbol
            .clone()
            .ok_or_else(|| EtiquetaError::Barcode("fake encoder failure".to_string()))
    }
}
