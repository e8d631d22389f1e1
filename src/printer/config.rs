//! # Printer Configuration
//!
//! This module defines print-head resolutions for label printers.
//!
//! ## Supported Resolutions
//!
//! | Preset | Dots/mm | DPI |
//! |--------|---------|-----|
//! | `DPMM_6` | 6 | 152 |
//! | `DPMM_8` | 8 | 203 |
//! | `DPMM_12` | 12 | 300 |
//! | `DPMM_24` | 24 | 600 |
//!
//! ## Usage
//!
//! ```
//! use etiqueta::printer::PrinterConfig;
//!
//! let config = PrinterConfig::DPMM_8;
//! assert_eq!(config.pixel_dimensions(4.0, 6.0), (812, 1218));
//! ```

/// # Printer Configuration
///
/// Describes the print head of a label printer. Label commands address the
/// print head in dots, so the resolution is all that is needed to size the
/// output frame.
///
/// ## Calculations
///
/// ```text
/// dots_per_mm = dpi / 25.4
/// width_dots  = round(width_in * dpi)
///
/// For 203 DPI and a 4x6 inch label:
///   width_dots  = 812
///   height_dots = 1218
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrinterConfig {
    /// Human-readable preset name
    pub name: &'static str,

    /// Resolution in dots per inch
    pub dpi: f32,
}

impl PrinterConfig {
    /// 6 dots/mm print head (152 DPI)
    pub const DPMM_6: Self = Self {
        name: "6 dpmm (152 dpi)",
        dpi: 152.0,
    };

    /// 8 dots/mm print head (203 DPI), the most common desktop resolution
    pub const DPMM_8: Self = Self {
        name: "8 dpmm (203 dpi)",
        dpi: 203.0,
    };

    /// 12 dots/mm print head (300 DPI)
    pub const DPMM_12: Self = Self {
        name: "12 dpmm (300 dpi)",
        dpi: 300.0,
    };

    /// 24 dots/mm print head (600 DPI)
    pub const DPMM_24: Self = Self {
        name: "24 dpmm (600 dpi)",
        dpi: 600.0,
    };

    /// All built-in presets, lowest resolution first.
    pub const BUILT_IN: [Self; 4] = [Self::DPMM_6, Self::DPMM_8, Self::DPMM_12, Self::DPMM_24];

    /// Find the built-in preset with exactly this DPI.
    pub fn by_dpi(dpi: f32) -> Option<Self> {
        Self::BUILT_IN
            .into_iter()
            .find(|config| (config.dpi - dpi).abs() < f32::EPSILON)
    }

    /// Calculate dots per millimeter
    #[inline]
    pub fn dots_per_mm(&self) -> f32 {
        self.dpi / 25.4
    }

    /// Convert inches to dots, rounding to the nearest dot.
    #[inline]
    pub fn inches_to_dots(&self, inches: f32) -> i64 {
        (inches * self.dpi).round() as i64
    }

    /// Frame size in dots for a label of the given physical size.
    ///
    /// Returns signed values so callers can reject non-positive results
    /// instead of wrapping.
    pub fn pixel_dimensions(&self, width_in: f32, height_in: f32) -> (i64, i64) {
        (self.inches_to_dots(width_in), self.inches_to_dots(height_in))
    }

    /// A configuration for an arbitrary resolution.
    pub fn custom(dpi: f32) -> Self {
        Self::by_dpi(dpi).unwrap_or(Self {
            name: "custom",
            dpi,
        })
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::DPMM_8
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dots_per_mm() {
        let dpmm = PrinterConfig::DPMM_8.dots_per_mm();
        // 203 DPI ≈ 8 dots/mm
        assert!((dpmm - 8.0).abs() < 0.1);
        let dpmm = PrinterConfig::DPMM_12.dots_per_mm();
        assert!((dpmm - 12.0).abs() < 0.2);
    }

    #[test]
    fn test_pixel_dimensions() {
        assert_eq!(PrinterConfig::DPMM_8.pixel_dimensions(4.0, 6.0), (812, 1218));
        assert_eq!(PrinterConfig::DPMM_12.pixel_dimensions(2.0, 1.0), (600, 300));
    }

    #[test]
    fn test_pixel_dimensions_non_positive() {
        let (w, h) = PrinterConfig::DPMM_8.pixel_dimensions(0.001, -1.0);
        assert_eq!(w, 0);
        assert!(h < 0);
    }

    #[test]
    fn test_by_dpi() {
        assert_eq!(PrinterConfig::by_dpi(300.0), Some(PrinterConfig::DPMM_12));
        assert_eq!(PrinterConfig::by_dpi(250.0), None);
        assert_eq!(PrinterConfig::custom(250.0).name, "custom");
    }

    #[test]
    fn test_default_is_203_dpi() {
        assert_eq!(PrinterConfig::default(), PrinterConfig::DPMM_8);
    }
}
