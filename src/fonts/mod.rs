//! # Fonts
//!
//! Font identifier resolution and typeface rendering.
//!
//! - [`resolver`]: identifier → font file, with the `DEFAULT` / fallback chain
//! - [`typeface`]: ab_glyph loading, measurement, and glyph rasterization

pub mod resolver;
pub mod typeface;

pub use resolver::{FileProbe, FontMap, FontResolver, FontSource, Platform, StdFileProbe};
pub use typeface::{FontSpec, TypefaceCache};
