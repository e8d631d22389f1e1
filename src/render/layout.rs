//! # Block Layout
//!
//! Greedy word wrap for text inside a `^FB` field block.
//!
//! ```text
//! "Line one\&Second paragraph wraps here"
//!      │
//!      ├─ split on \&  → paragraphs
//!      ├─ strip \(     (soft hyphen)
//!      └─ split on ' ' → words, packed greedily per line
//!
//!  ┌──────────── block width ────────────┐
//!  │<indent>first line of paragraph      │
//!  │continuation lines use full width    │
//!  └─────────────────────────────────────┘
//! ```
//!
//! The hanging indent narrows and offsets only the first line of each
//! paragraph. Packing stops at the block's line limit, even mid-paragraph.

use log::{debug, warn};

use super::state::{FieldBlock, Justification};
use crate::error::EtiquetaError;

/// Literal line-break escape in field data.
pub const LINE_BREAK: &str = "\\&";

/// Literal soft-hyphen escape in field data; removed before wrapping.
pub const SOFT_HYPHEN: &str = "\\(";

/// One laid-out line, positioned relative to the block's top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidLine {
    pub text: String,
    /// Left edge offset within the block
    pub x: f32,
    /// Line offset from the first line, in dots
    pub y: f32,
    pub width: f32,
}

/// Wrap `text` into lines within `block`.
///
/// `line_height` is the font pixel size; `measure` returns a run's width.
pub fn layout_block(
    text: &str,
    block: &FieldBlock,
    line_height: f32,
    mut measure: impl FnMut(&str) -> Result<f32, EtiquetaError>,
) -> Result<Vec<LaidLine>, EtiquetaError> {
    if block.justification == Justification::Justified {
        warn!("Justified block text is laid out left-aligned");
    }

    let mut layout = BlockLayout {
        block,
        advance: line_height + block.line_spacing as f32,
        max_lines: block.max_lines.max(1) as usize,
        lines: Vec::new(),
    };

    for paragraph in text.split(LINE_BREAK) {
        let paragraph = paragraph.replace(SOFT_HYPHEN, "");
        let mut first_line = true;
        let mut current = String::new();

        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{} {}", current, word);
            if measure(&candidate)? <= layout.available(first_line) {
                current = candidate;
                continue;
            }

            let width = measure(&current)?;
            layout.push(std::mem::take(&mut current), width, first_line);
            if layout.is_full() {
                return Ok(layout.lines);
            }
            first_line = false;
            current.push_str(word);
        }

        let width = measure(&current)?;
        layout.push(current, width, first_line);
        if layout.is_full() {
            break;
        }
    }

    Ok(layout.lines)
}

struct BlockLayout<'a> {
    block: &'a FieldBlock,
    advance: f32,
    max_lines: usize,
    lines: Vec<LaidLine>,
}

impl BlockLayout<'_> {
    fn indent(&self, first_line: bool) -> f32 {
        if first_line {
            self.block.hanging_indent as f32
        } else {
            0.0
        }
    }

    fn available(&self, first_line: bool) -> f32 {
        self.block.width as f32 - self.indent(first_line)
    }

    fn is_full(&self) -> bool {
        self.lines.len() >= self.max_lines
    }

    fn push(&mut self, text: String, width: f32, first_line: bool) {
        if width > self.available(first_line) {
            debug!("Word {:?} is wider than its block line, placed alone", text);
        }

        let block_width = self.block.width as f32;
        let shift = match self.block.justification {
            Justification::Center => (block_width - width) / 2.0,
            Justification::Right => block_width - width,
            Justification::Left | Justification::Justified => 0.0,
        };

        let y = self.lines.len() as f32 * self.advance;
        self.lines.push(LaidLine {
            text,
            x: self.indent(first_line) + shift.max(0.0),
            y,
            width,
        });
    }
}

// ============================================================================
// TESTS
// ============================================================================
