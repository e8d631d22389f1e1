//! # Parameter Parsing
//!
//! Command parameters are comma-separated. Every numeric field is parsed
//! independently: an empty or unparsable field keeps its default and never
//! fails the whole command.
//!
//! ```
//! use etiqueta::protocol::params::parse_integers;
//!
//! assert_eq!(parse_integers("10,,30", 3, &[1, 2, 3]), vec![10, 2, 30]);
//! assert_eq!(parse_integers("x,5", 2, &[0, 0]), vec![0, 5]);
//! ```

/// Parse up to `expected_count` integers from a comma-separated parameter string.
///
/// Missing, empty, or unparsable parts keep the corresponding default (0 when
/// `defaults` is shorter than `expected_count`). Excess parts are ignored.
pub fn parse_integers(parameters: &str, expected_count: usize, defaults: &[i32]) -> Vec<i32> {
    let mut values: Vec<i32> = (0..expected_count)
        .map(|i| defaults.get(i).copied().unwrap_or(0))
        .collect();

    for (slot, part) in values.iter_mut().zip(parameters.split(',')) {
        if let Ok(parsed) = part.trim().parse::<i32>() {
            *slot = parsed;
        }
    }

    values
}

/// Split a parameter string into trimmed fields.
pub fn split_params(parameters: &str) -> Vec<&str> {
    parameters.split(',').map(str::trim).collect()
}

/// Split into at most `n` fields; the last field keeps any further commas.
///
/// Used for commands whose final field is a payload (graphic data, font paths).
pub fn split_params_n(parameters: &str, n: usize) -> Vec<&str> {
    parameters.splitn(n, ',').map(str::trim).collect()
}

/// The field at `index`, or `None` when absent or empty.
pub fn field<'a>(fields: &[&'a str], index: usize) -> Option<&'a str> {
    fields.get(index).copied().filter(|f| !f.is_empty())
}

/// Integer field at `index`, or `default` when absent or unparsable.
pub fn int_field(fields: &[&str], index: usize, default: i32) -> i32 {
    field(fields, index)
        .and_then(|f| f.parse().ok())
        .unwrap_or(default)
}

/// Optional integer field: `None` when absent, empty, or unparsable.
pub fn opt_int_field(fields: &[&str], index: usize) -> Option<i32> {
    field(fields, index).and_then(|f| f.parse().ok())
}

/// Float field at `index`, or `default` when absent or unparsable.
pub fn float_field(fields: &[&str], index: usize, default: f32) -> f32 {
    field(fields, index)
        .and_then(|f| f.parse().ok())
        .unwrap_or(default)
}

/// First character of the field at `index`, uppercased.
pub fn char_field(fields: &[&str], index: usize) -> Option<char> {
    field(fields, index)
        .and_then(|f| f.chars().next())
        .map(|c| c.to_ascii_uppercase())
}

/// `Y`/`N` flag at `index`; anything else keeps `default`.
pub fn yes_no_field(fields: &[&str], index: usize, default: bool) -> bool {
    match char_field(fields, index) {
        Some('Y') => true,
        Some('N') => false,
        _ => default,
    }
}

// ============================================================================
// TESTS
// ============================================================================
