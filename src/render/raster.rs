//! # Raster Surface
//!
//! A two-tone [`Surface`] backed by an 8-bit `image::GrayImage`.
//!
//! ## Pixel Model
//!
//! Every shape is rasterized by testing pixel centers `(x + 0.5, y + 0.5)`
//! against the shape, so adjacent shapes tile without gaps or overlap.
//!
//! ## Rotation
//!
//! Only quarter turns are supported. [`Surface::save_rotated`] composes a
//! rotation about a pivot onto the current transform; every plotted pixel
//! is mapped through it, so rotated output is exact on the pixel grid.

use ab_glyph::FontArc;
use image::{GrayImage, Luma};

use super::bitmap::Bitmap;
use super::surface::{Point, Rect, Rotation, Surface, TextAlign, Tone};
use crate::error::EtiquetaError;
use crate::fonts::typeface::{self, FontSpec, TypefaceCache};

/// Affine transform restricted to quarter-turn rotations and translation.
///
/// Maps `(x, y)` to `(a*x + b*y + tx, c*x + d*y + ty)`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Transform {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    tx: f32,
    ty: f32,
}

impl Transform {
    const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Clockwise rotation about `pivot` (y axis pointing down).
    fn rotation(pivot: Point, rotation: Rotation) -> Self {
        let (a, b, c, d) = match rotation {
            Rotation::Normal => (1.0, 0.0, 0.0, 1.0),
            Rotation::Rotated => (0.0, -1.0, 1.0, 0.0),
            Rotation::Inverted => (-1.0, 0.0, 0.0, -1.0),
            Rotation::Bottom => (0.0, 1.0, -1.0, 0.0),
        };
        Self {
            a,
            b,
            c,
            d,
            tx: pivot.x - (a * pivot.x + b * pivot.y),
            ty: pivot.y - (c * pivot.x + d * pivot.y),
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.b * y + self.tx,
            self.c * x + self.d * y + self.ty,
        )
    }

    /// `self` applied after `inner`.
    fn after(&self, inner: &Self) -> Self {
        Self {
            a: self.a * inner.a + self.b * inner.c,
            b: self.a * inner.b + self.b * inner.d,
            c: self.c * inner.a + self.d * inner.c,
            d: self.c * inner.b + self.d * inner.d,
            tx: self.a * inner.tx + self.b * inner.ty + self.tx,
            ty: self.c * inner.tx + self.d * inner.ty + self.ty,
        }
    }

    /// Inverse of a rotation-plus-translation (the linear part is orthonormal).
    fn inverse(&self) -> Self {
        Self {
            a: self.a,
            b: self.c,
            c: self.b,
            d: self.d,
            tx: -(self.a * self.tx + self.c * self.ty),
            ty: -(self.b * self.tx + self.d * self.ty),
        }
    }
}

/// Two-tone raster frame.
pub struct RasterSurface {
    image: GrayImage,
    transform: Transform,
    saved: Vec<Transform>,
    faces: TypefaceCache,
}

impl RasterSurface {
    /// A white frame of `width` × `height` dots.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::from_pixel(width, height, Luma([Tone::White.luma()])),
            transform: Transform::IDENTITY,
            saved: Vec::new(),
            faces: TypefaceCache::new(),
        }
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }

    /// Whether the device pixel at `(x, y)` is black.
    pub fn is_black(&self, x: u32, y: u32) -> bool {
        x < self.image.width() && y < self.image.height() && self.image.get_pixel(x, y)[0] < 128
    }

    /// Plot user-space pixel `(x, y)` through the current transform.
    fn plot(&mut self, x: i64, y: i64, tone: Tone) {
        let (dx, dy) = self.transform.apply(x as f32 + 0.5, y as f32 + 0.5);
        let (px, py) = (dx.floor(), dy.floor());
        if px < 0.0 || py < 0.0 {
            return;
        }
        let (px, py) = (px as u32, py as u32);
        if px < self.image.width() && py < self.image.height() {
            self.image.put_pixel(px, py, Luma([tone.luma()]));
        }
    }

    /// User-space pixel range covering `bounds`, clipped to what is visible
    /// through the current transform. Returns `(x0, y0, x1, y1)`, exclusive end.
    fn pixel_range(&self, bounds: Rect) -> (i64, i64, i64, i64) {
        let inverse = self.transform.inverse();
        let (w, h) = (self.image.width() as f32, self.image.height() as f32);
        let corners = [
            inverse.apply(0.0, 0.0),
            inverse.apply(w, 0.0),
            inverse.apply(0.0, h),
            inverse.apply(w, h),
        ];
        let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max);

        let x0 = bounds.x.max(min_x).floor() as i64;
        let y0 = bounds.y.max(min_y).floor() as i64;
        let x1 = bounds.right().min(max_x).ceil() as i64;
        let y1 = bounds.bottom().min(max_y).ceil() as i64;
        (x0, y0, x1.max(x0), y1.max(y0))
    }

    /// Plot every pixel in `bounds` whose center satisfies `inside`.
    fn fill_where(&mut self, bounds: Rect, tone: Tone, inside: impl Fn(f32, f32) -> bool) {
        let (x0, y0, x1, y1) = self.pixel_range(bounds);
        for y in y0..y1 {
            for x in x0..x1 {
                if inside(x as f32 + 0.5, y as f32 + 0.5) {
                    self.plot(x, y, tone);
                }
            }
        }
    }

    fn face(&mut self, font: &FontSpec) -> Result<FontArc, EtiquetaError> {
        self.faces.load(&font.source)
    }
}

// ============================================================================
// SHAPE TESTS
// ============================================================================

fn in_round_rect(px: f32, py: f32, rect: &Rect, radius: f32) -> bool {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return false;
    }
    if px < rect.x || px > rect.right() || py < rect.y || py > rect.bottom() {
        return false;
    }
    let radius = radius.min(rect.width / 2.0).min(rect.height / 2.0);
    if radius <= 0.0 {
        return true;
    }
    let cx = px.clamp(rect.x + radius, rect.right() - radius);
    let cy = py.clamp(rect.y + radius, rect.bottom() - radius);
    (px - cx).powi(2) + (py - cy).powi(2) <= radius * radius
}

fn in_oval(px: f32, py: f32, bounds: &Rect) -> bool {
    let rx = bounds.width / 2.0;
    let ry = bounds.height / 2.0;
    if rx <= 0.0 || ry <= 0.0 {
        return false;
    }
    let c = bounds.center();
    ((px - c.x) / rx).powi(2) + ((py - c.y) / ry).powi(2) <= 1.0
}

fn distance_to_segment(px: f32, py: f32, from: Point, to: Point) -> f32 {
    let (vx, vy) = (to.x - from.x, to.y - from.y);
    let len_sq = vx * vx + vy * vy;
    let t = if len_sq > 0.0 {
        (((px - from.x) * vx + (py - from.y) * vy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (nx, ny) = (from.x + t * vx, from.y + t * vy);
    ((px - nx).powi(2) + (py - ny).powi(2)).sqrt()
}

// ============================================================================
// SURFACE IMPLEMENTATION
// ============================================================================

impl Surface for RasterSurface {
    fn size(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    fn clear(&mut self, tone: Tone) {
        for px in self.image.pixels_mut() {
            *px = Luma([tone.luma()]);
        }
    }

    fn fill_rect(&mut self, rect: Rect, radius: f32, tone: Tone) {
        self.fill_where(rect, tone, |x, y| in_round_rect(x, y, &rect, radius));
    }

    fn stroke_rect(&mut self, rect: Rect, radius: f32, thickness: f32, tone: Tone) {
        let half = thickness / 2.0;
        let outer = rect.inset(-half);
        let outer_radius = if radius > 0.0 { radius + half } else { 0.0 };
        let inner = rect.inset(half);
        let inner_radius = (radius - half).max(0.0);
        self.fill_where(outer, tone, |x, y| {
            in_round_rect(x, y, &outer, outer_radius) && !in_round_rect(x, y, &inner, inner_radius)
        });
    }

    fn fill_oval(&mut self, bounds: Rect, tone: Tone) {
        self.fill_where(bounds, tone, |x, y| in_oval(x, y, &bounds));
    }

    fn stroke_oval(&mut self, bounds: Rect, thickness: f32, tone: Tone) {
        let half = thickness / 2.0;
        let outer = bounds.inset(-half);
        let inner = bounds.inset(half);
        self.fill_where(outer, tone, |x, y| in_oval(x, y, &outer) && !in_oval(x, y, &inner));
    }

    fn draw_line(&mut self, from: Point, to: Point, thickness: f32, tone: Tone) {
        let half = thickness.max(1.0) / 2.0;
        let bounds = Rect::new(
            from.x.min(to.x) - half,
            from.y.min(to.y) - half,
            (from.x - to.x).abs() + half * 2.0,
            (from.y - to.y).abs() + half * 2.0,
        );
        self.fill_where(bounds, tone, |x, y| distance_to_segment(x, y, from, to) <= half);
    }

    fn measure_text(&mut self, text: &str, font: &FontSpec) -> Result<f32, EtiquetaError> {
        let face = self.face(font)?;
        Ok(typeface::measure(&face, font, text))
    }

    fn draw_text(
        &mut self,
        text: &str,
        at: Point,
        align: TextAlign,
        font: &FontSpec,
        tone: Tone,
    ) -> Result<(), EtiquetaError> {
        let face = self.face(font)?;
        let width = typeface::measure(&face, font, text);
        let x = match align {
            TextAlign::Left => at.x,
            TextAlign::Center => at.x - width / 2.0,
            TextAlign::Right => at.x - width,
        };

        let mut ink = Vec::new();
        typeface::rasterize(&face, font, text, x, at.y, |px, py| ink.push((px, py)));
        for (px, py) in ink {
            self.plot(px as i64, py as i64, tone);
        }
        Ok(())
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, dest: Rect) {
        if bitmap.is_empty() {
            return;
        }
        let x0 = dest.x.round() as i64;
        let y0 = dest.y.round() as i64;
        let w = dest.width.round() as i64;
        let h = dest.height.round() as i64;
        if w <= 0 || h <= 0 {
            return;
        }

        let (bw, bh) = (bitmap.width() as i64, bitmap.height() as i64);
        let (cx0, cy0, cx1, cy1) = self.pixel_range(Rect::new(x0 as f32, y0 as f32, w as f32, h as f32));
        for y in cy0..cy1 {
            let sy = ((y - y0) * bh / h) as usize;
            for x in cx0..cx1 {
                let sx = ((x - x0) * bw / w) as usize;
                if bitmap.get(sx, sy) {
                    self.plot(x, y, Tone::Black);
                }
            }
        }
    }

    fn save_rotated(&mut self, pivot: Point, rotation: Rotation) {
        self.saved.push(self.transform);
        self.transform = self.transform.after(&Transform::rotation(pivot, rotation));
    }

    fn restore(&mut self) {
        if let Some(previous) = self.saved.pop() {
            self.transform = previous;
        }
    }

    fn encode_png(&self) -> Result<Vec<u8>, EtiquetaError> {
        use image::ImageEncoder;

        let mut png_bytes = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(
                self.image.as_raw(),
                self.image.width(),
                self.image.height(),
                image::ExtendedColorType::L8,
            )
            .map_err(|e: image::ImageError| EtiquetaError::Encode(e.to_string()))?;

        Ok(png_bytes)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn black_count(surface: &RasterSurface) -> usize {
        surface.image().pixels().filter(|p| p[0] < 128).count()
    }

    #[test]
    fn test_new_surface_is_white() {
        let surface = RasterSurface::new(20, 10);
        assert_eq!(surface.size(), (20, 10));
        assert_eq!(black_count(&surface), 0);
    }

    #[test]
    fn test_fill_rect_exact_coverage() {
        let mut surface = RasterSurface::new(50, 50);
        surface.fill_rect(Rect::new(10.0, 5.0, 20.0, 10.0), 0.0, Tone::Black);
        assert_eq!(black_count(&surface), 200);
        assert!(surface.is_black(10, 5));
        assert!(surface.is_black(29, 14));
        assert!(!surface.is_black(30, 14));
        assert!(!surface.is_black(9, 5));
    }

    #[test]
    fn test_rounded_rect_clears_corners() {
        let mut surface = RasterSurface::new(50, 50);
        surface.fill_rect(Rect::new(0.0, 0.0, 40.0, 40.0), 10.0, Tone::Black);
        assert!(!surface.is_black(0, 0));
        assert!(surface.is_black(20, 0));
        assert!(surface.is_black(20, 20));
    }

    #[test]
    fn test_stroke_rect_leaves_hole() {
        let mut surface = RasterSurface::new(50, 50);
        // Centered stroke: edges at 10 and 30, thickness 4 → ink from 8..12
        surface.stroke_rect(Rect::new(10.0, 10.0, 20.0, 20.0), 0.0, 4.0, Tone::Black);
        assert!(surface.is_black(8, 20));
        assert!(surface.is_black(11, 20));
        assert!(!surface.is_black(12, 20));
        assert!(!surface.is_black(20, 20));
        assert!(!surface.is_black(7, 20));
    }

    #[test]
    fn test_fill_oval() {
        let mut surface = RasterSurface::new(40, 40);
        surface.fill_oval(Rect::new(0.0, 0.0, 40.0, 20.0), Tone::Black);
        assert!(surface.is_black(20, 10));
        assert!(!surface.is_black(0, 0));
        assert!(!surface.is_black(20, 25));
    }

    #[test]
    fn test_stroke_oval_ring() {
        let mut surface = RasterSurface::new(40, 40);
        surface.stroke_oval(Rect::new(5.0, 5.0, 30.0, 30.0), 2.0, Tone::Black);
        assert!(!surface.is_black(20, 20));
        assert!(surface.is_black(20, 5));
    }

    #[test]
    fn test_draw_line_diagonal() {
        let mut surface = RasterSurface::new(20, 20);
        surface.draw_line(Point::new(0.0, 0.0), Point::new(20.0, 20.0), 2.0, Tone::Black);
        assert!(surface.is_black(10, 10));
        assert!(!surface.is_black(18, 2));
    }

    #[test]
    fn test_white_over_black() {
        let mut surface = RasterSurface::new(20, 20);
        surface.fill_rect(Rect::new(0.0, 0.0, 20.0, 20.0), 0.0, Tone::Black);
        surface.fill_rect(Rect::new(5.0, 5.0, 5.0, 5.0), 0.0, Tone::White);
        assert!(!surface.is_black(7, 7));
        assert!(surface.is_black(2, 2));
    }

    #[test]
    fn test_rotation_about_pivot() {
        let mut surface = RasterSurface::new(100, 100);
        surface.save_rotated(Point::new(50.0, 50.0), Rotation::Rotated);
        // A bar to the right of the pivot lands below it after 90° clockwise.
        surface.fill_rect(Rect::new(50.0, 50.0, 20.0, 2.0), 0.0, Tone::Black);
        surface.restore();

        assert!(surface.is_black(49, 60));
        assert!(!surface.is_black(60, 50));
        assert_eq!(black_count(&surface), 40);
    }

    #[test]
    fn test_restore_returns_to_identity() {
        let mut surface = RasterSurface::new(100, 100);
        surface.save_rotated(Point::new(10.0, 10.0), Rotation::Inverted);
        surface.restore();
        surface.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), 0.0, Tone::Black);
        assert!(surface.is_black(0, 0));
        // Unbalanced restore is harmless.
        surface.restore();
    }

    #[test]
    fn test_nested_rotations_compose() {
        let mut surface = RasterSurface::new(100, 100);
        surface.save_rotated(Point::new(50.0, 50.0), Rotation::Rotated);
        surface.save_rotated(Point::new(50.0, 50.0), Rotation::Rotated);
        surface.fill_rect(Rect::new(50.0, 50.0, 10.0, 1.0), 0.0, Tone::Black);
        // Two quarter turns: the bar points left of the pivot.
        assert!(surface.is_black(45, 49));
    }

    #[test]
    fn test_draw_bitmap_scaled() {
        let mut surface = RasterSurface::new(20, 20);
        let bitmap = Bitmap::from_fn(2, 2, |x, y| x == y);
        surface.draw_bitmap(&bitmap, Rect::new(0.0, 0.0, 8.0, 8.0));
        assert!(surface.is_black(0, 0));
        assert!(surface.is_black(3, 3));
        assert!(!surface.is_black(5, 2));
        assert!(surface.is_black(7, 7));
        assert_eq!(black_count(&surface), 32);
    }

    #[test]
    fn test_offscreen_shapes_are_clipped() {
        let mut surface = RasterSurface::new(10, 10);
        surface.fill_rect(Rect::new(-1.0e7, -1.0e7, 2.0e7, 2.0e7), 0.0, Tone::Black);
        assert_eq!(black_count(&surface), 100);
    }

    #[test]
    fn test_missing_font_is_error() {
        let mut surface = RasterSurface::new(10, 10);
        let spec = FontSpec::new(crate::fonts::FontSource::parse("/nope/missing.ttf"), 20.0, 0.0);
        assert!(surface.measure_text("x", &spec).is_err());
        assert!(
            surface
                .draw_text("x", Point::new(0.0, 0.0), TextAlign::Left, &spec, Tone::Black)
                .is_err()
        );
    }

    #[test]
    fn test_encode_png() {
        let surface = RasterSurface::new(8, 4);
        let png = surface.encode_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }
}
