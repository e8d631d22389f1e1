//! # Rendering Module
//!
//! Turns label source into one two-tone raster frame.
//!
//! ## Modules
//!
//! - [`surface`]: the drawing-surface capability and geometry types
//! - [`raster`]: [`RasterSurface`], the `GrayImage` implementation
//! - [`state`]: cursor, font, field block, and reverse/hex flags
//! - [`interpreter`]: the dispatch loop and barcode protocol
//! - [`layout`]: block word wrap
//! - [`primitives`]: boxes, circles, ellipses, diagonals
//! - [`graphics`]: graphic store and payload decoding
//! - [`options`]: render inputs, validation, and results
//!
//! ## Pipeline
//!
//! ```text
//! RenderOptions ──validate──► (width, height, target path)
//!        │
//!        ▼
//! RasterSurface ◄── Interpreter ◄── commands(code)
//!        │
//!        ▼
//!    PNG bytes ──► RenderResult (and file, in file mode)
//! ```
//!
//! ## Usage Example
//!
//! ```no_run
//! use etiqueta::render::{RenderOptions, render};
//!
//! let result = render(&RenderOptions::new("^XA^FO20,20^GB200,100,4^FS^XZ"));
//! assert!(result.success);
//! let png = result.image.unwrap();
//! ```

pub mod bitmap;
pub mod graphics;
pub mod interpreter;
pub mod layout;
pub mod options;
pub mod primitives;
pub mod raster;
pub mod state;
pub mod surface;

#[cfg(test)]
pub(crate) mod testing;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};

pub use bitmap::Bitmap;
pub use graphics::GraphicStore;
pub use interpreter::{BarcodeSlot, Interpreter};
use interpreter::panic_message;
pub use options::{OutputMode, RenderOptions, RenderResult};
pub use raster::RasterSurface;
pub use state::RenderState;
pub use surface::{Point, Rect, Rotation, Surface, TextAlign, Tone};

use crate::barcode::{DefaultEncoder, SymbolEncoder};
use crate::error::EtiquetaError;
use crate::fonts::{FileProbe, FontMap, FontResolver, Platform, StdFileProbe};

/// Renders label source with a configurable encoder and font probe.
pub struct Renderer {
    encoder: Box<dyn SymbolEncoder>,
    probe: Arc<dyn FileProbe>,
    platform: Platform,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            encoder: Box::new(DefaultEncoder),
            probe: Arc::new(StdFileProbe),
            platform: Platform::current(),
        }
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoder(mut self, encoder: Box<dyn SymbolEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn FileProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// The font resolver a render with these overrides would use.
    pub fn fonts(&self, overrides: Option<&FontMap>) -> FontResolver {
        FontResolver::probe(self.platform, overrides, Arc::clone(&self.probe))
    }

    /// Render with a fresh graphic store.
    pub fn render(&self, options: &RenderOptions) -> RenderResult {
        let mut store = GraphicStore::new();
        self.render_with_store(options, &mut store)
    }

    /// Render, reading and adding to a caller-owned graphic store.
    pub fn render_with_store(&self, options: &RenderOptions, store: &mut GraphicStore) -> RenderResult {
        let ((width, height), target) = match options.validate() {
            Ok(checked) => checked,
            Err(e) => {
                warn!("Render rejected: {}", e);
                return RenderResult::failure(e, None);
            }
        };

        info!(
            "Rendering {}x{} dots at {} dpi ({} bytes of source)",
            width,
            height,
            options.dpi,
            options.code.len()
        );
        let fonts = self.fonts(options.font_map.as_ref());
        let state = RenderState::new(fonts);

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let mut surface = RasterSurface::new(width, height);
            surface.clear(Tone::White);
            let mut interpreter = Interpreter::new(state, store, self.encoder.as_ref());
            interpreter.run(&options.code, &mut surface);
            surface.encode_png()
        }));

        let png = match outcome {
            Ok(Ok(png)) => png,
            Ok(Err(e)) => return RenderResult::failure(e, None),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("Render aborted: {}", message);
                return RenderResult::failure(format!("render aborted: {}", message), None);
            }
        };
        debug!("Encoded {} PNG bytes", png.len());

        match target {
            None => RenderResult::ok(png, None),
            Some(path) => match write_output(&path, &png) {
                Ok(()) => {
                    info!("Saved label to {}", path.display());
                    RenderResult::ok(png, Some(path))
                }
                Err(e) => RenderResult::failure(e, Some(png)),
            },
        }
    }
}

fn write_output(path: &Path, png: &[u8]) -> Result<(), EtiquetaError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, png)?;
    Ok(())
}

/// Render with the default encoder and system fonts.
pub fn render(options: &RenderOptions) -> RenderResult {
    Renderer::default().render(options)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode::{EncodeHints, Symbology};
    use crate::render::testing::FakeProbe;
    use pretty_assertions::assert_eq;

    struct PanickingEncoder;

    impl SymbolEncoder for PanickingEncoder {
        fn encode(&self, _: Symbology, _: &str, _: &EncodeHints) -> Result<Bitmap, EtiquetaError> {
            panic!("encoder exploded")
        }
    }

    fn renderer() -> Renderer {
        Renderer::new()
            .with_probe(Arc::new(FakeProbe::new(&[])))
            .with_platform(Platform::Linux)
    }

    fn decode(png: &[u8]) -> image::GrayImage {
        image::load_from_memory(png).unwrap().to_luma8()
    }

    #[test]
    fn test_render_box_to_png() {
        let options = RenderOptions::new("^XA^FO10,10^GB50,20,0^FS^XZ").with_size(1.0, 1.0);
        let result = renderer().render(&options);
        assert!(result.success, "{:?}", result.error);
        let image = decode(&result.image.unwrap());
        assert_eq!(image.dimensions(), (203, 203));
        assert_eq!(image.get_pixel(30, 20)[0], 0);
        assert_eq!(image.get_pixel(5, 5)[0], 255);
    }

    #[test]
    fn test_validation_failure_has_no_image() {
        let result = renderer().render(&RenderOptions::new(""));
        assert!(!result.success);
        assert!(result.image.is_none());
        assert!(result.error.unwrap().contains("empty"));
    }

    #[test]
    fn test_encoder_panic_skips_only_that_field() {
        let renderer = renderer().with_encoder(Box::new(PanickingEncoder));
        let options =
            RenderOptions::new("^XA^BCN,50^FD123^FS^FO0,0^GB5,5,0^FS^XZ").with_size(1.0, 1.0);
        let result = renderer.render(&options);
        assert!(result.success, "{:?}", result.error);
        let image = decode(&result.image.unwrap());
        assert_eq!(image.get_pixel(2, 2)[0], 0);
        assert_eq!(image.get_pixel(10, 10)[0], 255);
    }

    #[test]
    fn test_store_reused_across_calls() {
        let renderer = renderer();
        let mut store = GraphicStore::new();
        let download = RenderOptions::new("~DGBAR.GRF,2,1,FFFF").with_size(1.0, 1.0);
        assert!(renderer.render_with_store(&download, &mut store).success);
        assert_eq!(store.len(), 1);

        let recall = RenderOptions::new("^XA^FO0,0^XGBAR.GRF,4,4^FS^XZ").with_size(1.0, 1.0);
        let result = renderer.render_with_store(&recall, &mut store);
        let image = decode(&result.image.unwrap());
        assert_eq!(image.get_pixel(31, 7)[0], 0);
        assert_eq!(image.get_pixel(32, 8)[0], 255);
    }

    #[test]
    fn test_cleared_store_forgets_downloads() {
        let renderer = renderer();
        let mut store = GraphicStore::new();
        let download = RenderOptions::new("~DGDOT.GRF,1,1,80").with_size(1.0, 1.0);
        assert!(renderer.render_with_store(&download, &mut store).success);
        store.clear();
        assert!(store.is_empty());

        let recall = RenderOptions::new("^XA^FO0,0^XGDOT.GRF^FS^XZ").with_size(1.0, 1.0);
        let result = renderer.render_with_store(&recall, &mut store);
        assert!(result.success);
        let image = decode(&result.image.unwrap());
        assert_eq!(image.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_fonts_layer_overrides() {
        let mut overrides = FontMap::new();
        overrides.insert("Z", "/fonts/z.ttf");
        let fonts = renderer().fonts(Some(&overrides));
        assert_eq!(fonts.map().get("z"), Some("/fonts/z.ttf"));
        assert_eq!(fonts.fallback(), None);
    }
}
