//! # Render Tests
//!
//! End-to-end renders through the real raster surface and default barcode
//! encoder. Output PNGs are decoded and checked pixel by pixel.
//!
//! Font lookups go through a probe that finds nothing, so results do not
//! depend on which fonts the machine has installed.

use etiqueta::fonts::{FileProbe, Platform};
use etiqueta::render::{GraphicStore, RenderOptions, RenderResult, Renderer};
use image::GrayImage;
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

struct NoFonts;

impl FileProbe for NoFonts {
    fn exists(&self, _: &Path) -> bool {
        false
    }
}

fn renderer() -> Renderer {
    Renderer::new()
        .with_probe(Arc::new(NoFonts))
        .with_platform(Platform::Linux)
}

/// Render a 1x1 inch label at 203 dpi.
fn render_small(code: &str) -> RenderResult {
    renderer().render(&RenderOptions::new(code).with_size(1.0, 1.0))
}

fn decode(result: &RenderResult) -> GrayImage {
    assert!(result.success, "render failed: {:?}", result.error);
    let png = result.image.as_ref().expect("image bytes");
    image::load_from_memory(png).expect("valid PNG").to_luma8()
}

fn is_black(image: &GrayImage, x: u32, y: u32) -> bool {
    image.get_pixel(x, y)[0] < 128
}

fn black_count(image: &GrayImage) -> usize {
    image.pixels().filter(|p| p[0] < 128).count()
}

/// Bounding box `(x0, y0, x1, y1)` of black pixels, inclusive.
fn ink_bounds(image: &GrayImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, p) in image.enumerate_pixels() {
        if p[0] >= 128 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds
}

// ============================================================================
// PRIMITIVES
// ============================================================================

#[test]
fn test_blank_label_is_white() {
    let image = decode(&render_small("^XA^XZ"));
    assert_eq!(image.dimensions(), (203, 203));
    assert_eq!(black_count(&image), 0);
}

#[test]
fn test_filled_box_exact_pixels() {
    let image = decode(&render_small("^XA^FO10,10^GB5,5,0^FS^XZ"));
    assert_eq!(black_count(&image), 25);
    assert_eq!(ink_bounds(&image), Some((10, 10, 14, 14)));
}

#[test]
fn test_stroked_box_is_hollow() {
    let image = decode(&render_small("^XA^FO20,20^GB100,60,4^FS^XZ"));
    assert!(is_black(&image, 20, 20));
    assert!(is_black(&image, 23, 50));
    assert!(!is_black(&image, 24, 50));
    assert!(!is_black(&image, 70, 50));
    assert_eq!(ink_bounds(&image), Some((20, 20, 119, 79)));
}

#[test]
fn test_reverse_box_knocks_out() {
    let image = decode(&render_small(
        "^XA^FO0,0^GB100,100,0^FS^FO25,25^FR^GB50,50,0^FS^FO150,150^GB10,10,0^FS^XZ",
    ));
    assert!(is_black(&image, 10, 10));
    assert!(!is_black(&image, 50, 50));
    // Reverse applied to one draw only
    assert!(is_black(&image, 155, 155));
}

#[test]
fn test_label_home_offsets_everything() {
    let image = decode(&render_small("^XA^LH30,40^FO0,0^GB2,2,0^FS^XZ"));
    assert_eq!(ink_bounds(&image), Some((30, 40, 31, 41)));
}

#[test]
fn test_circle_center_filled() {
    let image = decode(&render_small("^XA^FO50,50^GC40,0^FS^XZ"));
    assert!(is_black(&image, 70, 70));
    assert!(!is_black(&image, 51, 51));
}

// ============================================================================
// GRAPHICS
// ============================================================================

#[test]
fn test_inline_graphic_field() {
    let image = decode(&render_small("^XA^FO5,5^GFA,2,2,1,FF80^FS^XZ"));
    assert_eq!(black_count(&image), 9);
    assert!(is_black(&image, 12, 5));
    assert!(is_black(&image, 5, 6));
    assert!(!is_black(&image, 6, 6));
}

#[test]
fn test_download_and_recall_scaled() {
    let image = decode(&render_small(
        "~DGR:SQ.GRF,2,1,C0C0^XA^FO10,10^XGR:SQ.GRF,3,3^FS^XZ",
    ));
    assert_eq!(ink_bounds(&image), Some((10, 10, 15, 15)));
    assert_eq!(black_count(&image), 36);
}

#[test]
fn test_graphics_persist_in_caller_store() {
    let renderer = renderer();
    let mut store = GraphicStore::new();
    let options = |code: &str| RenderOptions::new(code).with_size(1.0, 1.0);

    renderer.render_with_store(&options("~DGDOT.GRF,1,1,80"), &mut store);
    let result = renderer.render_with_store(&options("^XA^FO3,3^XGR:DOT.GRF^FS^XZ"), &mut store);
    let image = decode(&result);
    assert_eq!(ink_bounds(&image), Some((3, 3, 3, 3)));
}

// ============================================================================
// BARCODES
// ============================================================================

#[test]
fn test_code128_bars_within_height() {
    let image = decode(&render_small("^XA^BY2^FO20,20^BCN,60,N^FD12345678^FS^XZ"));
    let (x0, y0, x1, y1) = ink_bounds(&image).expect("barcode ink");
    assert!(x0 >= 20);
    assert_eq!((y0, y1), (20, 79));
    assert!(x1 > 60);
    // Every column is solid or empty for the whole bar height
    for x in x0..=x1 {
        assert_eq!(is_black(&image, x, 20), is_black(&image, x, 79), "column {}", x);
    }
}

#[test]
fn test_barcode_cancelled_by_other_command() {
    let image = decode(&render_small("^XA^BCN,50^FO10,10^GB5,5,0^FS^XZ"));
    assert_eq!(black_count(&image), 25);
}

#[test]
fn test_qr_is_square() {
    let image = decode(&render_small("^XA^FO10,10^BQN,2,3^FDMA,HELLO^FS^XZ"));
    let (x0, y0, x1, y1) = ink_bounds(&image).expect("qr ink");
    assert!(x0 >= 10 && y0 >= 10);
    assert_eq!(x1 - x0, y1 - y0);
    // Smallest symbol is 21 modules
    assert!(x1 - x0 + 1 >= 21 * 3);
}

#[test]
fn test_unsupported_symbol_skipped() {
    let image = decode(&render_small("^XA^FO10,10^B9N,50^FD123456^FS^FO0,0^GB1,1,0^FS^XZ"));
    assert_eq!(black_count(&image), 1);
}

#[test]
fn test_text_without_fonts_is_skipped() {
    let image = decode(&render_small("^XA^FO10,10^A0N,30^FDHello^FS^XZ"));
    assert_eq!(black_count(&image), 0);
}

// ============================================================================
// OUTPUT
// ============================================================================

#[test]
fn test_save_to_file_inside_allowed_dir() {
    let dir = tempfile::tempdir().unwrap();
    let options = RenderOptions::new("^XA^FO0,0^GB10,10,0^FS^XZ")
        .with_size(1.0, 1.0)
        .save_to("nested/label.png")
        .with_allowed_dir(dir.path());

    let result = renderer().render(&options);
    assert!(result.success, "{:?}", result.error);
    let written = dir.path().join("nested/label.png");
    assert_eq!(result.path.as_deref(), Some(written.as_path()));
    assert_eq!(std::fs::read(&written).unwrap(), result.image.unwrap());
}

#[test]
fn test_save_outside_allowed_dir_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let allowed = dir.path().join("labels");
    let options = RenderOptions::new("^XA^XZ")
        .save_to("../escape.png")
        .with_allowed_dir(&allowed);

    let result = renderer().render(&options);
    assert!(!result.success);
    assert!(result.image.is_none());
    assert!(!dir.path().join("escape.png").exists());
}

#[test]
fn test_invalid_options_rejected_before_render() {
    for options in [
        RenderOptions::new(""),
        RenderOptions::new("^XA^XZ").with_dpi(-203.0),
        RenderOptions::new("^XA^XZ").with_size(0.0, 1.0),
        RenderOptions::new("^XA^XZ").with_size(200.0, 1.0),
    ] {
        let result = renderer().render(&options);
        assert!(!result.success, "{:?}", options);
        assert!(result.error.is_some());
        assert!(result.image.is_none());
    }
}
