//! # Command Tokenizer
//!
//! Splits label source text into individual commands and parses each one into
//! its prefix, two-character code, and raw parameter string.
//!
//! ## Segmentation
//!
//! The source is trimmed, then split immediately *before* every `^` or `~`:
//!
//! ```text
//! ^XA^FO20,20^FDHello^FS^XZ
//! └─┘└──────┘└──────┘└─┘└─┘
//! ```
//!
//! A `^` or `~` inside field data is not distinguished from a command start.
//! The label language has no escaping for it, so a payload containing either
//! character is cut at that point.
//!
//! ## Example
//!
//! ```
//! use etiqueta::protocol::command::{Prefix, commands};
//!
//! let parsed = commands("^XA^FO20,30^FDHi^FS^XZ");
//! assert_eq!(parsed.len(), 5);
//! assert_eq!(parsed[1].prefix, Some(Prefix::Caret));
//! assert_eq!(parsed[1].code, "FO");
//! assert_eq!(parsed[1].parameters, "20,30");
//! ```

use log::debug;

/// Code of the comment command; its segments never reach the interpreter.
pub const COMMENT_CODE: &str = "FX";

/// Command leader character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    /// `^` format command
    Caret,
    /// `~` control command
    Tilde,
}

impl Prefix {
    /// Classify a leader character.
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '^' => Some(Prefix::Caret),
            '~' => Some(Prefix::Tilde),
            _ => None,
        }
    }

    /// The leader character itself.
    pub fn as_char(self) -> char {
        match self {
            Prefix::Caret => '^',
            Prefix::Tilde => '~',
        }
    }
}

/// A single parsed command.
///
/// Segments too short to carry a code, or lacking a leader, parse to an
/// invalid command (`prefix == None`) that the interpreter skips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Leader, or `None` for an invalid segment
    pub prefix: Option<Prefix>,
    /// Two-character code, uppercased
    pub code: String,
    /// Everything after the code
    pub parameters: String,
    /// Original segment text
    pub raw: String,
}

impl Command {
    /// Parse a single segment.
    ///
    /// ```
    /// use etiqueta::protocol::command::Command;
    ///
    /// let cmd = Command::parse("^fo10,20");
    /// assert_eq!(cmd.code, "FO");
    /// assert!(!Command::parse("^F").is_valid());
    /// ```
    pub fn parse(segment: &str) -> Self {
        let trimmed = segment.trim();
        let mut chars = trimmed.chars();

        let prefix = chars.next().and_then(Prefix::from_char);
        let code: String = chars.by_ref().take(2).collect();

        match prefix {
            Some(prefix) if code.chars().count() == 2 => Self {
                prefix: Some(prefix),
                code: code.to_uppercase(),
                parameters: chars.as_str().to_string(),
                raw: trimmed.to_string(),
            },
            _ => Self::invalid(trimmed),
        }
    }

    /// The sentinel command produced for malformed segments.
    pub fn invalid(raw: &str) -> Self {
        Self {
            prefix: None,
            code: String::new(),
            parameters: String::new(),
            raw: raw.to_string(),
        }
    }

    /// Whether the segment parsed into a real command.
    pub fn is_valid(&self) -> bool {
        self.prefix.is_some()
    }
}

/// Split source text into command segments.
///
/// Each returned segment is trimmed and starts with `^` or `~`. Empty
/// segments, segments without a leader, and comment segments are dropped.
pub fn split_segments(source: &str) -> Vec<&str> {
    let source = source.trim();
    let mut segments = Vec::new();
    let mut start = 0;

    for (idx, ch) in source.char_indices() {
        if idx > start && Prefix::from_char(ch).is_some() {
            push_segment(&mut segments, &source[start..idx]);
            start = idx;
        }
    }
    push_segment(&mut segments, &source[start..]);

    segments
}

fn push_segment<'a>(segments: &mut Vec<&'a str>, segment: &'a str) {
    let segment = segment.trim();
    if segment.is_empty() {
        return;
    }

    let mut chars = segment.chars();
    if chars.next().and_then(Prefix::from_char).is_none() {
        debug!("Skipping segment without command prefix: {:?}", segment);
        return;
    }

    let code: String = chars.take(2).collect();
    if code.eq_ignore_ascii_case(COMMENT_CODE) {
        debug!("Dropping comment: {:?}", segment);
        return;
    }

    segments.push(segment);
}

/// Tokenize source text into parsed commands, in source order.
pub fn commands(source: &str) -> Vec<Command> {
    split_segments(source)
        .into_iter()
        .map(Command::parse)
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_basic_label() {
        let segments = split_segments("^XA^FO20,20^FDHello^FS^XZ");
        assert_eq!(segments, vec!["^XA", "^FO20,20", "^FDHello", "^FS", "^XZ"]);
    }

    #[test]
    fn test_split_trims_segments_and_newlines() {
        let source = "\n  ^XA\n^FO10,10\r\n^FD Text \n^FS\n^XZ  \n";
        let segments = split_segments(source);
        assert_eq!(segments, vec!["^XA", "^FO10,10", "^FD Text", "^FS", "^XZ"]);
    }

    #[test]
    fn test_split_drops_leading_garbage() {
        let segments = split_segments("hello ^XA^XZ");
        assert_eq!(segments, vec!["^XA", "^XZ"]);
    }

    #[test]
    fn test_split_tilde_commands() {
        let segments = split_segments("~DGR:A.GRF,2,1,FF00^XA^XGR:A.GRF^FS^XZ");
        assert_eq!(segments[0], "~DGR:A.GRF,2,1,FF00");
        assert_eq!(segments[1], "^XA");
    }

    #[test]
    fn test_comment_never_emitted() {
        let parsed = commands("^XA^FXthis is a comment^fx lower too^FO1,2^XZ");
        let codes: Vec<&str> = parsed.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["XA", "FO", "XZ"]);
    }

    #[test]
    fn test_rejoin_is_lossless_modulo_whitespace() {
        let source = "^XA ^FO5,5\n^GB10,10,1^FS ^XZ";
        let rejoined: String = split_segments(source).concat();
        let stripped: String = source.chars().filter(|c| !c.is_whitespace()).collect();
        assert_eq!(rejoined, stripped);
    }

    #[test]
    fn test_caret_inside_data_splits() {
        // No escaping exists for a leader inside field data.
        let parsed = commands("^FDa^b^FS");
        let codes: Vec<&str> = parsed.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(parsed[0].parameters, "a");
        assert!(!parsed[1].is_valid());
        assert_eq!(codes[2], "FS");
    }

    #[test]
    fn test_parse_command() {
        let cmd = Command::parse("^a0n,30,20");
        assert_eq!(cmd.prefix, Some(Prefix::Caret));
        assert_eq!(cmd.code, "A0");
        assert_eq!(cmd.parameters, "n,30,20");
        assert_eq!(cmd.raw, "^a0n,30,20");
    }

    #[test]
    fn test_parse_no_parameters() {
        let cmd = Command::parse("^FS");
        assert!(cmd.is_valid());
        assert_eq!(cmd.parameters, "");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(!Command::parse("^F").is_valid());
        assert!(!Command::parse("FO10,10").is_valid());
        assert!(!Command::parse("").is_valid());
        assert_eq!(Command::parse(" ^X ").raw, "^X");
    }

    #[test]
    fn test_parse_multibyte_parameters() {
        let cmd = Command::parse("^FDÜber ✓");
        assert_eq!(cmd.code, "FD");
        assert_eq!(cmd.parameters, "Über ✓");
    }

    #[test]
    fn test_prefix_roundtrip() {
        assert_eq!(Prefix::from_char('~').map(Prefix::as_char), Some('~'));
        assert_eq!(Prefix::from_char('x'), None);
    }
}
