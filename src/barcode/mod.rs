//! # Barcodes
//!
//! Symbology table, per-symbology setup parameters, the encoder capability,
//! and the scaling/drawing step that places a symbol on a label.
//!
//! ## Flow
//!
//! ```text
//! ^BC setup ──► BarcodeSetup (pending)
//!                    │
//! ^FD data ─────────►├─► SymbolEncoder::encode  (native modules, 1 dot each)
//!                    ├─► scale (magnification / module width + ratio / height)
//!                    └─► Surface::draw_bitmap (+ interpretation line)
//! ```
//!
//! ## Modules
//!
//! - [`setup`]: setup-command parameter layouts and `^BY` defaults
//! - [`encode`]: [`SymbolEncoder`] trait and the crate's [`DefaultEncoder`]
//! - [`draw`]: target size computation and drawing

pub mod draw;
pub mod encode;
pub mod setup;

use std::fmt;

pub use draw::draw_barcode;
pub use encode::{DefaultEncoder, EncodeHints, SymbolEncoder};
pub use setup::{BarcodeDefaults, BarcodeSetup, SymbologyOptions};

/// Barcode symbologies reachable from a setup command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbology {
    Code11,
    Interleaved2of5,
    Code39,
    Pdf417,
    Ean8,
    UpcE,
    Code93,
    Code128,
    Ean13,
    Standard2of5,
    Codabar,
    Qr,
    UpcA,
    DataMatrix,
}

impl Symbology {
    /// Every supported symbology, in setup-code order.
    pub const ALL: [Symbology; 14] = [
        Symbology::Code11,
        Symbology::Interleaved2of5,
        Symbology::Code39,
        Symbology::Pdf417,
        Symbology::Ean8,
        Symbology::UpcE,
        Symbology::Code93,
        Symbology::Code128,
        Symbology::Ean13,
        Symbology::Standard2of5,
        Symbology::Codabar,
        Symbology::Qr,
        Symbology::UpcA,
        Symbology::DataMatrix,
    ];

    /// Map a two-character setup code (`BC`, `BQ`, ...) to its symbology.
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code.to_ascii_uppercase().as_str() {
            "B1" => Symbology::Code11,
            "B2" => Symbology::Interleaved2of5,
            "B3" => Symbology::Code39,
            "B7" => Symbology::Pdf417,
            "B8" => Symbology::Ean8,
            "B9" => Symbology::UpcE,
            "BA" => Symbology::Code93,
            "BC" => Symbology::Code128,
            "BE" => Symbology::Ean13,
            "BJ" => Symbology::Standard2of5,
            "BK" => Symbology::Codabar,
            "BQ" => Symbology::Qr,
            "BU" => Symbology::UpcA,
            "BX" => Symbology::DataMatrix,
            _ => return None,
        })
    }

    pub fn code(self) -> &'static str {
        match self {
            Symbology::Code11 => "B1",
            Symbology::Interleaved2of5 => "B2",
            Symbology::Code39 => "B3",
            Symbology::Pdf417 => "B7",
            Symbology::Ean8 => "B8",
            Symbology::UpcE => "B9",
            Symbology::Code93 => "BA",
            Symbology::Code128 => "BC",
            Symbology::Ean13 => "BE",
            Symbology::Standard2of5 => "BJ",
            Symbology::Codabar => "BK",
            Symbology::Qr => "BQ",
            Symbology::UpcA => "BU",
            Symbology::DataMatrix => "BX",
        }
    }

    /// 2D matrix codes, scaled by a magnification factor on both axes.
    pub fn is_matrix(self) -> bool {
        matches!(self, Symbology::Qr | Symbology::DataMatrix)
    }

    /// 1D codes (including the EAN/UPC family). PDF417 is stacked, not linear.
    pub fn is_linear(self) -> bool {
        !self.is_matrix() && self != Symbology::Pdf417
    }

    /// 1D codes built from narrow and wide elements, where `^BY`'s ratio applies.
    pub fn is_two_width(self) -> bool {
        matches!(
            self,
            Symbology::Code11
                | Symbology::Code39
                | Symbology::Codabar
                | Symbology::Interleaved2of5
                | Symbology::Standard2of5
        )
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Symbology::Code11 => "Code 11",
            Symbology::Interleaved2of5 => "Interleaved 2 of 5",
            Symbology::Code39 => "Code 39",
            Symbology::Pdf417 => "PDF417",
            Symbology::Ean8 => "EAN-8",
            Symbology::UpcE => "UPC-E",
            Symbology::Code93 => "Code 93",
            Symbology::Code128 => "Code 128",
            Symbology::Ean13 => "EAN-13",
            Symbology::Standard2of5 => "Standard 2 of 5",
            Symbology::Codabar => "Codabar",
            Symbology::Qr => "QR",
            Symbology::UpcA => "UPC-A",
            Symbology::DataMatrix => "Data Matrix",
        };
        f.write_str(name)
    }
}
