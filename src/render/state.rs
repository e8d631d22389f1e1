//! # Render State
//!
//! All mutable interpreter state for one rendering pass: origin and cursor,
//! the current font, `^BY` barcode defaults, the pending field block, and
//! the field-scoped reverse and hex-escape flags.
//!
//! ## Field Lifecycle
//!
//! ```text
//! ^FB / ^FR / ^FH ──► apply to the next field's data
//! ^FS ──────────────► end_field(): reverse off, block off, hex off
//! ```
//!
//! A field block with width 0 is "no block", never a zero-width block.

use log::warn;

use crate::barcode::BarcodeDefaults;
use crate::fonts::{FontResolver, FontSource, FontSpec};
use crate::protocol::hex::DEFAULT_INDICATOR;
use crate::protocol::params::{char_field, field, int_field, opt_int_field, split_params};

use super::surface::{Point, Rotation, Tone};

/// Font height in dots before any font command.
pub const DEFAULT_FONT_HEIGHT: i32 = 30;

/// Block text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justification {
    #[default]
    Left,
    Right,
    Center,
    /// Laid out as [`Justification::Left`]
    Justified,
}

impl Justification {
    /// Parse `L`, `R`, `C` or `J`; anything else is `Left`.
    pub fn from_code(code: Option<char>) -> Self {
        match code {
            Some('R') => Justification::Right,
            Some('C') => Justification::Center,
            Some('J') => Justification::Justified,
            Some('L') | None => Justification::Left,
            Some(other) => {
                warn!("Invalid block justification {:?}, using L", other);
                Justification::Left
            }
        }
    }
}

/// `^FB` parameters for the next field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldBlock {
    /// Block width in dots; 0 means no block
    pub width: i32,
    pub max_lines: i32,
    /// Extra dots between lines
    pub line_spacing: i32,
    pub justification: Justification,
    /// Indent of the first line of each paragraph
    pub hanging_indent: i32,
}

impl Default for FieldBlock {
    fn default() -> Self {
        Self {
            width: 0,
            max_lines: 1,
            line_spacing: 0,
            justification: Justification::Left,
            hanging_indent: 0,
        }
    }
}

impl FieldBlock {
    /// Parse `^FB w,l,s,j,h`; each field has its own default.
    pub fn parse(parameters: &str) -> Self {
        let fields = split_params(parameters);
        Self {
            width: int_field(&fields, 0, 0).max(0),
            max_lines: int_field(&fields, 1, 1).max(1),
            line_spacing: int_field(&fields, 2, 0),
            justification: Justification::from_code(char_field(&fields, 3)),
            hanging_indent: int_field(&fields, 4, 0).max(0),
        }
    }

    pub fn is_active(&self) -> bool {
        self.width > 0
    }
}

/// Current font selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontState {
    /// Map identifier (`0`, `A`, `E:ARIAL.TTF`, or a file path)
    pub identifier: String,
    pub height: i32,
    /// 0 means proportional to height
    pub width: i32,
    pub rotation: Rotation,
}

impl Default for FontState {
    fn default() -> Self {
        Self {
            identifier: "0".to_string(),
            height: DEFAULT_FONT_HEIGHT,
            width: 0,
            rotation: Rotation::Normal,
        }
    }
}

impl FontState {
    /// Apply `h,w` fields: a height without width resets width to proportional.
    fn apply_size(&mut self, height: Option<i32>, width: Option<i32>) {
        match (height.filter(|h| *h > 0), width.filter(|w| *w >= 0)) {
            (Some(h), w) => {
                self.height = h;
                self.width = w.unwrap_or(0);
            }
            (None, Some(w)) => self.width = w,
            (None, None) => {}
        }
    }
}

/// Mutable state for one render call.
#[derive(Debug)]
pub struct RenderState {
    /// `^LH` origin
    pub home: Point,
    /// `^FO` position, already offset by `home`
    pub cursor: Point,
    pub font: FontState,
    pub fonts: FontResolver,
    pub barcode: BarcodeDefaults,
    pub block: FieldBlock,
    pub reverse: bool,
    /// `^FH` indicator for the current field
    pub hex_indicator: Option<u8>,
}

impl RenderState {
    pub fn new(fonts: FontResolver) -> Self {
        Self {
            home: Point::default(),
            cursor: Point::default(),
            font: FontState::default(),
            fonts,
            barcode: BarcodeDefaults::default(),
            block: FieldBlock::default(),
            reverse: false,
            hex_indicator: None,
        }
    }

    /// `^LH x,y`
    pub fn set_home(&mut self, parameters: &str) {
        let fields = split_params(parameters);
        self.home = Point::new(
            int_field(&fields, 0, self.home.x as i32) as f32,
            int_field(&fields, 1, self.home.y as i32) as f32,
        );
    }

    /// `^FO x,y`, relative to the label home.
    pub fn set_origin(&mut self, parameters: &str) {
        let fields = split_params(parameters);
        let x = int_field(&fields, 0, 0) as f32;
        let y = int_field(&fields, 1, 0) as f32;
        self.cursor = Point::new(self.home.x + x, self.home.y + y);
    }

    /// `^CF f,h,w`: default font; the identifier collapses to one character
    /// unless it names a path.
    pub fn set_default_font(&mut self, parameters: &str) {
        let fields = split_params(parameters);
        if let Some(id) = field(&fields, 0) {
            let is_path = id.contains([':', '/', '\\']);
            self.font.identifier = if is_path {
                id.to_string()
            } else {
                id.chars().take(1).collect::<String>().to_uppercase()
            };
        }
        self.font
            .apply_size(opt_int_field(&fields, 1), opt_int_field(&fields, 2));
    }

    /// `^Af o,h,w` (single-character font) and `^A@o,h,w,path`.
    pub fn select_font(&mut self, font: char, parameters: &str) {
        let fields = split_params(parameters);
        if font == '@' {
            match field(&fields, 3) {
                Some(path) => self.font.identifier = path.to_string(),
                None => warn!("^A@ without a font path, keeping {:?}", self.font.identifier),
            }
        } else {
            self.font.identifier = font.to_ascii_uppercase().to_string();
        }
        if let Some(rotation) = char_field(&fields, 0).and_then(Rotation::from_code) {
            self.font.rotation = rotation;
        }
        self.font
            .apply_size(opt_int_field(&fields, 1), opt_int_field(&fields, 2));
    }

    /// `^FH`: enable hex escapes for the current field.
    pub fn set_hex_indicator(&mut self, parameters: &str) {
        let indicator = parameters
            .trim()
            .bytes()
            .next()
            .unwrap_or(DEFAULT_INDICATOR);
        self.hex_indicator = Some(indicator);
    }

    /// Resolve a font identifier through the fallback chain.
    pub fn resolve_font(&self, identifier: &str) -> Option<FontSource> {
        self.fonts.resolve(identifier)
    }

    /// The current font at its configured size, if any typeface resolves.
    pub fn font_spec(&self) -> Option<FontSpec> {
        self.font_spec_sized(self.font.height as f32, self.font.width as f32)
    }

    /// The current font at an explicit size.
    pub fn font_spec_sized(&self, height: f32, width: f32) -> Option<FontSpec> {
        self.resolve_font(&self.font.identifier)
            .map(|source| FontSpec::new(source, height, width))
    }

    /// `^FR`
    pub fn toggle_reverse(&mut self) {
        self.reverse = !self.reverse;
    }

    /// Apply and consume the reverse flag for one draw.
    pub fn take_tone(&mut self, tone: Tone) -> Tone {
        if std::mem::take(&mut self.reverse) {
            tone.inverted()
        } else {
            tone
        }
    }

    /// Deactivate the block after its field's data.
    pub fn end_block(&mut self) {
        self.block.width = 0;
    }

    /// `^FS`: clear field-scoped state.
    pub fn end_field(&mut self) {
        self.reverse = false;
        self.end_block();
        self.hex_indicator = None;
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::{TEST_FONT, no_fonts, test_fonts};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn state() -> RenderState {
        RenderState::new(test_fonts())
    }

    #[test]
    fn test_field_block_parse() {
        let block = FieldBlock::parse("500,5,10,C,15");
        assert_eq!(
            block,
            FieldBlock {
                width: 500,
                max_lines: 5,
                line_spacing: 10,
                justification: Justification::Center,
                hanging_indent: 15,
            }
        );
        assert!(block.is_active());
    }

    #[test]
    fn test_field_block_defaults_per_field() {
        let block = FieldBlock::parse("300,,x,Q");
        assert_eq!(block.width, 300);
        assert_eq!(block.max_lines, 1);
        assert_eq!(block.line_spacing, 0);
        assert_eq!(block.justification, Justification::Left);
        assert!(!FieldBlock::parse("").is_active());
    }

    #[test]
    fn test_origin_is_relative_to_home() {
        let mut s = state();
        s.set_home("30,40");
        s.set_origin("10,20");
        assert_eq!(s.cursor, Point::new(40.0, 60.0));
        s.set_origin("x,5");
        assert_eq!(s.cursor, Point::new(30.0, 45.0));
    }

    #[test]
    fn test_default_font_collapses_identifier() {
        let mut s = state();
        s.set_default_font("AB,50");
        assert_eq!(s.font.identifier, "A");
        assert_eq!(s.font.height, 50);

        s.set_default_font("E:ARIAL.TTF,20,10");
        assert_eq!(s.font.identifier, "E:ARIAL.TTF");
        assert_eq!((s.font.height, s.font.width), (20, 10));

        // Height only: width goes back to proportional
        s.set_default_font(",25");
        assert_eq!(s.font.identifier, "E:ARIAL.TTF");
        assert_eq!((s.font.height, s.font.width), (25, 0));
    }

    #[test]
    fn test_select_font_forms() {
        let mut s = state();
        s.select_font('d', "R,40,30");
        assert_eq!(s.font.identifier, "D");
        assert_eq!(s.font.rotation, Rotation::Rotated);
        assert_eq!((s.font.height, s.font.width), (40, 30));

        s.select_font('@', "N,20,20,/fonts/custom.ttf");
        assert_eq!(s.font.identifier, "/fonts/custom.ttf");
        assert_eq!(s.font.rotation, Rotation::Normal);

        // Unknown rotation keeps the current one
        s.select_font('0', "Z,10");
        assert_eq!(s.font.rotation, Rotation::Normal);
        assert_eq!(s.font.height, 10);
    }

    #[test]
    fn test_font_spec_resolves_through_chain() {
        let mut s = state();
        s.select_font('Q', "N,40");
        let spec = s.font_spec().unwrap();
        assert_eq!(spec.source.path, PathBuf::from(TEST_FONT));
        assert_eq!((spec.height, spec.width), (40.0, 40.0));

        let s = RenderState::new(no_fonts());
        assert_eq!(s.font_spec(), None);
    }

    #[test]
    fn test_reverse_toggles_and_is_consumed() {
        let mut s = state();
        s.toggle_reverse();
        s.toggle_reverse();
        assert_eq!(s.take_tone(Tone::Black), Tone::Black);

        s.toggle_reverse();
        assert_eq!(s.take_tone(Tone::Black), Tone::White);
        assert_eq!(s.take_tone(Tone::Black), Tone::Black);
    }

    #[test]
    fn test_end_field_clears_field_scope() {
        let mut s = state();
        s.block = FieldBlock::parse("200,3");
        s.toggle_reverse();
        s.set_hex_indicator("");
        assert_eq!(s.hex_indicator, Some(b'_'));

        s.end_field();
        assert!(!s.block.is_active());
        assert!(!s.reverse);
        assert_eq!(s.hex_indicator, None);
        // Other block settings are left for the next ^FB to overwrite.
        assert_eq!(s.block.max_lines, 3);
    }

    #[test]
    fn test_hex_indicator_custom() {
        let mut s = state();
        s.set_hex_indicator("#");
        assert_eq!(s.hex_indicator, Some(b'#'));
    }
}
