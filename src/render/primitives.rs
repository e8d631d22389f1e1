//! # Graphic Primitives
//!
//! Boxes (`^GB`), circles (`^GC`), ellipses (`^GE`) and diagonal lines
//! (`^GD`), drawn with their top-left corner at the field origin.
//!
//! ## Fill and Stroke
//!
//! Thickness ≤ 0 fills the shape. A positive thickness strokes an outline
//! whose outer edge sits on the requested bounds; an outline thick enough
//! to meet itself is drawn filled.
//!
//! The reverse flag inverts the color of the next successful draw and is
//! then cleared. A degenerate shape is rejected before it touches the flag.

use super::state::RenderState;
use super::surface::{Point, Rect, Surface, Tone};
use crate::error::EtiquetaError;
use crate::protocol::params::{char_field, parse_integers, split_params};

/// Box corner rounding steps (0–8).
const MAX_ROUNDING: i32 = 8;

fn color_at(parameters: &str, index: usize) -> Tone {
    Tone::from_code(char_field(&split_params(parameters), index))
}

fn degenerate(shape: &str, detail: String) -> EtiquetaError {
    EtiquetaError::Draw(format!("{} skipped: {}", shape, detail))
}

/// Whether an outline of `thickness` closes the shape of the given extent.
fn is_solid(thickness: i32, min_dimension: i32) -> bool {
    thickness <= 0 || thickness * 2 >= min_dimension
}

/// Corner radius for a rounding step: `r/8` of half the smaller side.
pub fn corner_radius(rounding: i32, width: f32, height: f32) -> f32 {
    let half = width.min(height) / 2.0;
    (rounding.clamp(0, MAX_ROUNDING) as f32 / MAX_ROUNDING as f32 * half).min(half)
}

/// `^GB w,h,t,c,r`
pub fn draw_box(
    state: &mut RenderState,
    surface: &mut dyn Surface,
    parameters: &str,
) -> Result<(), EtiquetaError> {
    let dims = parse_integers(parameters, 3, &[1, 1, 1]);
    let (mut width, mut height, thickness) = (dims[0], dims[1], dims[2]);
    // A side shorter than the line is raised to it, so `^GB400,0,3` is a rule.
    if thickness > 0 {
        width = width.max(thickness);
        height = height.max(thickness);
    }
    let rounding = parse_integers(parameters, 5, &[0, 0, 0, 0, 0])[4];
    if width <= 0 || height <= 0 {
        return Err(degenerate("Box", format!("{}x{}", width, height)));
    }

    let bounds = Rect::new(state.cursor.x, state.cursor.y, width as f32, height as f32);
    let radius = corner_radius(rounding, bounds.width, bounds.height);
    let tone = state.take_tone(color_at(parameters, 3));

    if is_solid(thickness, width.min(height)) {
        surface.fill_rect(bounds, radius, tone);
    } else {
        let t = thickness as f32;
        surface.stroke_rect(bounds.inset(t / 2.0), (radius - t / 2.0).max(0.0), t, tone);
    }
    Ok(())
}

/// `^GC d,t,c`
pub fn draw_circle(
    state: &mut RenderState,
    surface: &mut dyn Surface,
    parameters: &str,
) -> Result<(), EtiquetaError> {
    let dims = parse_integers(parameters, 2, &[3, 1]);
    let (diameter, thickness) = (dims[0], dims[1]);
    if diameter <= 0 {
        return Err(degenerate("Circle", format!("diameter {}", diameter)));
    }
    let bounds = Rect::new(state.cursor.x, state.cursor.y, diameter as f32, diameter as f32);
    let tone = state.take_tone(color_at(parameters, 2));
    draw_oval(surface, bounds, thickness, diameter, tone);
    Ok(())
}

/// `^GE w,h,t,c`
pub fn draw_ellipse(
    state: &mut RenderState,
    surface: &mut dyn Surface,
    parameters: &str,
) -> Result<(), EtiquetaError> {
    let dims = parse_integers(parameters, 3, &[3, 3, 1]);
    let (width, height, thickness) = (dims[0], dims[1], dims[2]);
    if width <= 0 || height <= 0 {
        return Err(degenerate("Ellipse", format!("{}x{}", width, height)));
    }
    let bounds = Rect::new(state.cursor.x, state.cursor.y, width as f32, height as f32);
    let tone = state.take_tone(color_at(parameters, 3));
    draw_oval(surface, bounds, thickness, width.min(height), tone);
    Ok(())
}

fn draw_oval(surface: &mut dyn Surface, bounds: Rect, thickness: i32, min_dimension: i32, tone: Tone) {
    if is_solid(thickness, min_dimension) {
        surface.fill_oval(bounds, tone);
    } else {
        let t = thickness as f32;
        surface.stroke_oval(bounds.inset(t / 2.0), t, tone);
    }
}

/// `^GD w,h,t,c,o`: `R` leans right (`/`), `L` leans left (`\`).
pub fn draw_diagonal(
    state: &mut RenderState,
    surface: &mut dyn Surface,
    parameters: &str,
) -> Result<(), EtiquetaError> {
    let dims = parse_integers(parameters, 3, &[3, 3, 1]);
    let (width, height, thickness) = (dims[0], dims[1], dims[2]);
    if width <= 0 || height <= 0 || thickness <= 0 {
        return Err(degenerate(
            "Diagonal",
            format!("{}x{} thickness {}", width, height, thickness),
        ));
    }

    let fields = split_params(parameters);
    let leans_left = char_field(&fields, 4) == Some('L');
    let tone = state.take_tone(Tone::from_code(char_field(&fields, 3)));

    let t = thickness as f32;
    let (x, y) = (state.cursor.x, state.cursor.y);
    let (left, right) = (x + t / 2.0, x + width as f32 - t / 2.0);
    let (top, bottom) = (y, y + height as f32);
    let (from, to) = if leans_left {
        (Point::new(left, top), Point::new(right, bottom))
    } else {
        (Point::new(left, bottom), Point::new(right, top))
    };
    surface.draw_line(from, to, t, tone);
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
