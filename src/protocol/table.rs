//! # Command Table
//!
//! The fixed set of command codes the interpreter understands. Lookup is by
//! the two-character code alone; the prefix (`^` or `~`) does not change
//! meaning.
//!
//! | Codes | Kind |
//! |-------|------|
//! | `XA` `XZ` | format start / end |
//! | `LH` `FO` | label home, field origin |
//! | `CF` `A0`–`AZ` `A@` | fonts |
//! | `BY` `B1`…`BX` | barcode defaults and setups |
//! | `FB` `FR` `FH` `FD` `FV` `FS` | field block, reverse, hex, data, separator |
//! | `GB` `GC` `GE` `GD` | box, circle, ellipse, diagonal |
//! | `DG` `XG` `GF` | download, recall, inline graphic |

use crate::barcode::Symbology;

/// What a command code does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    FormatStart,
    FormatEnd,
    LabelHome,
    FieldOrigin,
    ChangeDefaultFont,
    /// `^Af`: the character after `A` (`0`–`9`, `A`–`Z`, or `@` for a path)
    SelectFont(char),
    BarcodeDefaults,
    BarcodeSetup(Symbology),
    FieldBlock,
    FieldReverse,
    FieldHex,
    /// `^FD` and its alias `^FV`
    FieldData,
    FieldSeparator,
    Comment,
    GraphicBox,
    GraphicCircle,
    GraphicEllipse,
    GraphicDiagonal,
    DownloadGraphic,
    RecallGraphic,
    GraphicField,
}

impl CommandKind {
    /// Look up a two-character code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.to_ascii_uppercase();
        let kind = match code.as_str() {
            "XA" => CommandKind::FormatStart,
            "XZ" => CommandKind::FormatEnd,
            "LH" => CommandKind::LabelHome,
            "FO" => CommandKind::FieldOrigin,
            "CF" => CommandKind::ChangeDefaultFont,
            "BY" => CommandKind::BarcodeDefaults,
            "FB" => CommandKind::FieldBlock,
            "FR" => CommandKind::FieldReverse,
            "FH" => CommandKind::FieldHex,
            "FD" | "FV" => CommandKind::FieldData,
            "FS" => CommandKind::FieldSeparator,
            "FX" => CommandKind::Comment,
            "GB" => CommandKind::GraphicBox,
            "GC" => CommandKind::GraphicCircle,
            "GE" => CommandKind::GraphicEllipse,
            "GD" => CommandKind::GraphicDiagonal,
            "DG" => CommandKind::DownloadGraphic,
            "XG" => CommandKind::RecallGraphic,
            "GF" => CommandKind::GraphicField,
            _ => return Self::font_or_barcode(&code),
        };
        Some(kind)
    }

    fn font_or_barcode(code: &str) -> Option<Self> {
        let mut chars = code.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some('A'), Some(font @ ('0'..='9' | 'A'..='Z' | '@')), None) => {
                Some(CommandKind::SelectFont(font))
            }
            _ => Symbology::from_code(code).map(CommandKind::BarcodeSetup),
        }
    }
}
