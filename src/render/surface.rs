//! # Drawing Surface
//!
//! The capability the interpreter draws through. [`RasterSurface`] is the
//! shipped implementation; tests use a recording surface.
//!
//! ## Coordinates
//!
//! Dots, origin top-left, y growing downward. Strokes are centered on the
//! shape outline: a rectangle stroked with thickness `t` covers `t/2` on
//! either side of its edges.
//!
//! [`RasterSurface`]: super::raster::RasterSurface

use crate::error::EtiquetaError;
use crate::fonts::FontSpec;

use super::bitmap::Bitmap;

/// Two-tone ink model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Black,
    White,
}

impl Tone {
    /// Color selector used by graphic commands: `W` is white, anything else black.
    pub fn from_code(code: Option<char>) -> Self {
        match code {
            Some('W') => Tone::White,
            _ => Tone::Black,
        }
    }

    pub fn inverted(self) -> Self {
        match self {
            Tone::Black => Tone::White,
            Tone::White => Tone::Black,
        }
    }

    /// Gray level written to an 8-bit raster.
    pub fn luma(self) -> u8 {
        match self {
            Tone::Black => 0,
            Tone::White => 255,
        }
    }
}

/// Quarter-turn rotation, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// `N`: normal
    #[default]
    Normal,
    /// `R`: 90° clockwise
    Rotated,
    /// `I`: 180°
    Inverted,
    /// `B`: 270° clockwise (read from bottom up)
    Bottom,
}

impl Rotation {
    /// Parse an orientation code; unknown codes yield `None`.
    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'N' => Some(Rotation::Normal),
            'R' => Some(Rotation::Rotated),
            'I' => Some(Rotation::Inverted),
            'B' => Some(Rotation::Bottom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Shrink every side by `amount` (negative grows).
    pub fn inset(&self, amount: f32) -> Self {
        Self {
            x: self.x + amount,
            y: self.y + amount,
            width: self.width - amount * 2.0,
            height: self.height - amount * 2.0,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Horizontal anchor for text: where `at.x` sits relative to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Drawing operations consumed by the interpreter.
pub trait Surface {
    /// Frame size in dots.
    fn size(&self) -> (u32, u32);

    fn clear(&mut self, tone: Tone);

    fn fill_rect(&mut self, rect: Rect, radius: f32, tone: Tone);

    fn stroke_rect(&mut self, rect: Rect, radius: f32, thickness: f32, tone: Tone);

    fn fill_oval(&mut self, bounds: Rect, tone: Tone);

    fn stroke_oval(&mut self, bounds: Rect, thickness: f32, tone: Tone);

    fn draw_line(&mut self, from: Point, to: Point, thickness: f32, tone: Tone);

    /// Advance width of `text` in dots.
    fn measure_text(&mut self, text: &str, font: &FontSpec) -> Result<f32, EtiquetaError>;

    /// Draw a single line of text with its baseline at `at.y`.
    fn draw_text(
        &mut self,
        text: &str,
        at: Point,
        align: TextAlign,
        font: &FontSpec,
        tone: Tone,
    ) -> Result<(), EtiquetaError>;

    /// Paint the black pixels of `bitmap`, scaled to fill `dest`.
    fn draw_bitmap(&mut self, bitmap: &Bitmap, dest: Rect);

    /// Push the current transform and rotate subsequent draws about `pivot`.
    fn save_rotated(&mut self, pivot: Point, rotation: Rotation);

    /// Pop the transform pushed by the matching [`Surface::save_rotated`].
    fn restore(&mut self);

    /// Encode the frame as PNG.
    fn encode_png(&self) -> Result<Vec<u8>, EtiquetaError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_codes() {
        assert_eq!(Tone::from_code(Some('W')), Tone::White);
        assert_eq!(Tone::from_code(Some('B')), Tone::Black);
        assert_eq!(Tone::from_code(None), Tone::Black);
        assert_eq!(Tone::Black.inverted(), Tone::White);
        assert_eq!(Tone::White.inverted().inverted(), Tone::White);
    }

    #[test]
    fn test_rotation_codes() {
        assert_eq!(Rotation::from_code('r'), Some(Rotation::Rotated));
        assert_eq!(Rotation::from_code('B'), Some(Rotation::Bottom));
        assert_eq!(Rotation::from_code('X'), None);
    }

    #[test]
    fn test_rect_inset() {
        let rect = Rect::new(10.0, 10.0, 100.0, 50.0).inset(5.0);
        assert_eq!(rect, Rect::new(15.0, 15.0, 90.0, 40.0));
        assert_eq!(rect.right(), 105.0);
        assert_eq!(rect.center(), Point::new(60.0, 35.0));
    }
}
