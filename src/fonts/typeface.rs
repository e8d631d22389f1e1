//! TTF/OTF glyph rendering for label text.
//!
//! Loads font files through ab_glyph and exposes the two things the raster
//! surface needs: advance-width measurement and per-pixel glyph coverage.
//! Label output is two-tone, so coverage is thresholded rather than dithered.

use std::collections::HashMap;

use ab_glyph::{Font, FontArc, FontVec, PxScale, ScaleFont, point};

use super::resolver::FontSource;
use crate::error::EtiquetaError;

/// Coverage at or above this value becomes ink.
pub const INK_THRESHOLD: f32 = 0.5;

/// Font file plus the pixel size to render it at.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub source: FontSource,
    /// Glyph height in dots
    pub height: f32,
    /// Glyph width in dots; equal to `height` for unscaled text
    pub width: f32,
}

impl FontSpec {
    pub fn new(source: FontSource, height: f32, width: f32) -> Self {
        Self {
            source,
            height,
            width: if width > 0.0 { width } else { height },
        }
    }

    fn scale(&self) -> PxScale {
        PxScale {
            x: self.width,
            y: self.height,
        }
    }
}

/// Loaded typefaces, keyed by file and collection index.
///
/// Each file is read at most once per cache; a failed load is remembered so
/// a missing or corrupt file is not retried for every field.
#[derive(Default)]
pub struct TypefaceCache {
    faces: HashMap<FontSource, Option<FontArc>>,
}

impl TypefaceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or load the typeface for `source`.
    pub fn load(&mut self, source: &FontSource) -> Result<FontArc, EtiquetaError> {
        let entry = self
            .faces
            .entry(source.clone())
            .or_insert_with(|| load_face(source).ok());
        entry
            .clone()
            .ok_or_else(|| EtiquetaError::Font(format!("cannot load typeface {}", source)))
    }
}

fn load_face(source: &FontSource) -> Result<FontArc, EtiquetaError> {
    let data = std::fs::read(&source.path)?;
    let face = FontVec::try_from_vec_and_index(data, source.index)
        .map_err(|e| EtiquetaError::Font(format!("{}: {}", source, e)))?;
    Ok(FontArc::new(face))
}

/// Advance width of `text` in dots.
pub fn measure(face: &FontArc, spec: &FontSpec, text: &str) -> f32 {
    let scaled = face.as_scaled(spec.scale());
    text.chars()
        .map(|ch| scaled.h_advance(face.glyph_id(ch)))
        .sum()
}

/// Rasterize `text` with its baseline starting at `(x, baseline)`.
///
/// `plot` is called once for every pixel whose coverage reaches
/// [`INK_THRESHOLD`], in the caller's (unrotated) coordinate space.
pub fn rasterize(
    face: &FontArc,
    spec: &FontSpec,
    text: &str,
    x: f32,
    baseline: f32,
    mut plot: impl FnMut(i32, i32),
) {
    let scale = spec.scale();
    let scaled = face.as_scaled(scale);
    let mut caret_x = x;

    for ch in text.chars() {
        let glyph_id = face.glyph_id(ch);
        let glyph = glyph_id.with_scale_and_position(scale, point(caret_x, baseline));
        caret_x += scaled.h_advance(glyph_id);

        if let Some(outlined) = face.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                if coverage >= INK_THRESHOLD {
                    plot(px as i32 + bounds.min.x as i32, py as i32 + bounds.min.y as i32);
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_font_spec_width_defaults_to_height() {
        let source = FontSource::parse("/x.ttf");
        assert_eq!(FontSpec::new(source.clone(), 30.0, 0.0).width, 30.0);
        assert_eq!(FontSpec::new(source, 30.0, 20.0).width, 20.0);
    }

    #[test]
    fn test_missing_face_is_error_and_cached() {
        let mut cache = TypefaceCache::new();
        let source = FontSource {
            path: PathBuf::from("/definitely/not/here.ttf"),
            index: 0,
        };
        assert!(cache.load(&source).is_err());
        assert!(cache.load(&source).is_err());
        assert_eq!(cache.faces.len(), 1);
    }
}
