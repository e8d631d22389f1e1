//! # Barcode Setup Parameters
//!
//! A setup command (`^BC`, `^BQ`, ...) carries a symbology-specific list of
//! comma-separated fields. Each layout is parsed into a [`BarcodeSetup`];
//! any missing or malformed field takes its documented default.
//!
//! | Code | Layout |
//! |------|--------|
//! | `BC`, `BE`, `B8`, `BU`, `B9`, `B2`, `BJ`, `BA` | `o,h,f,g` |
//! | `B3`, `B1` | `o,e,h,f,g` |
//! | `BK` | `o,e,h,f,g,k,l` |
//! | `BQ` | `o,model,magnification,ecc` |
//! | `B7` | `o,h,security,columns,rows,truncate` |
//! | `BX` | `o,h,quality,columns,rows,format,escape,aspect` |
//!
//! `o` orientation, `e` check digit, `h` height, `f` interpretation line,
//! `g` interpretation line above.

use super::Symbology;
use crate::protocol::params::{
    char_field, float_field, opt_int_field, split_params, yes_no_field,
};
use crate::render::surface::Rotation;

/// Field defaults set by `^BY`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarcodeDefaults {
    /// Narrow module width in dots (1–10)
    pub module_width: i32,
    /// Wide-to-narrow ratio (2.0–3.0)
    pub ratio: f32,
    /// Bar height in dots
    pub height: i32,
}

impl Default for BarcodeDefaults {
    fn default() -> Self {
        Self {
            module_width: 2,
            ratio: 3.0,
            height: 10,
        }
    }
}

impl BarcodeDefaults {
    /// Apply a `^BY` command; absent fields keep their current value.
    pub fn apply(&mut self, parameters: &str) {
        let fields = split_params(parameters);
        if let Some(width) = opt_int_field(&fields, 0) {
            self.module_width = width.clamp(1, 10);
        }
        self.ratio = float_field(&fields, 1, self.ratio).clamp(2.0, 3.0);
        if let Some(height) = opt_int_field(&fields, 2) {
            self.height = height;
        }
    }

    /// Wide element width in dots for two-width symbologies.
    pub fn wide_width(&self) -> i32 {
        (self.module_width as f32 * self.ratio).round() as i32
    }
}

/// Symbology-specific setup fields.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbologyOptions {
    Linear,
    Codabar {
        start: char,
        stop: char,
    },
    Qr {
        /// Module magnification (1–10)
        magnification: i32,
        /// Error correction level: `H`, `Q`, `M` or `L`
        ecc: char,
    },
    Pdf417 {
        /// Security level (0–8)
        security: i32,
        columns: Option<i32>,
        rows: Option<i32>,
        truncate: bool,
    },
    DataMatrix {
        /// Element size in dots
        module: Option<i32>,
        columns: Option<i32>,
        rows: Option<i32>,
        /// `Some(true)` square, `Some(false)` rectangular
        square: Option<bool>,
    },
}

/// A parsed barcode setup command, held while the barcode is pending.
#[derive(Debug, Clone, PartialEq)]
pub struct BarcodeSetup {
    pub symbology: Symbology,
    pub orientation: Rotation,
    /// Bar (or PDF417 row) height; `None` uses `^BY` height
    pub height: Option<i32>,
    pub interpretation: bool,
    pub line_above: bool,
    pub check_digit: bool,
    pub options: SymbologyOptions,
}

impl BarcodeSetup {
    /// Parse the parameters of the setup command for `symbology`.
    pub fn parse(symbology: Symbology, parameters: &str) -> Self {
        let fields = split_params(parameters);
        let orientation = char_field(&fields, 0)
            .and_then(Rotation::from_code)
            .unwrap_or_default();

        let mut setup = Self {
            symbology,
            orientation,
            height: None,
            interpretation: true,
            line_above: false,
            check_digit: false,
            options: SymbologyOptions::Linear,
        };

        match symbology {
            Symbology::Code39 | Symbology::Code11 | Symbology::Codabar => {
                setup.check_digit = yes_no_field(&fields, 1, false);
                setup.height = positive(opt_int_field(&fields, 2));
                setup.interpretation = yes_no_field(&fields, 3, true);
                setup.line_above = yes_no_field(&fields, 4, false);
                if symbology == Symbology::Codabar {
                    setup.options = SymbologyOptions::Codabar {
                        start: codabar_guard(char_field(&fields, 5)),
                        stop: codabar_guard(char_field(&fields, 6)),
                    };
                }
            }
            Symbology::Qr => {
                let magnification = opt_int_field(&fields, 2).unwrap_or(3).clamp(1, 10);
                let ecc = match char_field(&fields, 3) {
                    Some(c @ ('H' | 'Q' | 'M' | 'L')) => c,
                    _ => 'M',
                };
                setup.interpretation = false;
                setup.options = SymbologyOptions::Qr { magnification, ecc };
            }
            Symbology::Pdf417 => {
                setup.height = positive(opt_int_field(&fields, 1));
                setup.interpretation = false;
                setup.options = SymbologyOptions::Pdf417 {
                    security: opt_int_field(&fields, 2).unwrap_or(5).clamp(0, 8),
                    columns: positive(opt_int_field(&fields, 3)),
                    rows: positive(opt_int_field(&fields, 4)),
                    truncate: yes_no_field(&fields, 5, false),
                };
            }
            Symbology::DataMatrix => {
                setup.interpretation = false;
                setup.options = SymbologyOptions::DataMatrix {
                    module: positive(opt_int_field(&fields, 1)),
                    columns: positive(opt_int_field(&fields, 3)),
                    rows: positive(opt_int_field(&fields, 4)),
                    square: match opt_int_field(&fields, 7) {
                        Some(1) => Some(true),
                        Some(2) => Some(false),
                        _ => None,
                    },
                };
            }
            _ => {
                setup.height = positive(opt_int_field(&fields, 1));
                setup.interpretation = yes_no_field(&fields, 2, true);
                setup.line_above = yes_no_field(&fields, 3, false);
            }
        }

        setup
    }

    /// Bar height in dots, falling back to the `^BY` height.
    pub fn bar_height(&self, defaults: &BarcodeDefaults) -> i32 {
        self.height.unwrap_or(defaults.height)
    }

    /// Whether a human-readable line is printed with the symbol.
    pub fn prints_interpretation(&self) -> bool {
        self.interpretation && self.symbology.is_linear()
    }
}

fn positive(value: Option<i32>) -> Option<i32> {
    value.filter(|v| *v > 0)
}

fn codabar_guard(value: Option<char>) -> char {
    match value {
        Some(c @ ('A'..='D')) => c,
        _ => 'A',
    }
}
