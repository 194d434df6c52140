//! Text canonicalization for similarity scoring and query checks.
//!
//! The flattener keeps catalog text verbatim; matchers that compare raw
//! strings run both sides through [`canonicalize_for_similarity`] so that
//! "Café  Bot" and "cafe\u{301} bot" compare equal.
//!
//! # Processing Pipeline
//!
//! 1. **Unicode NFC normalization** - "café" (decomposed) → "café" (composed)
//! 2. **Lowercasing** - Unicode-aware, not ASCII-only
//! 3. **Whitespace normalization** - Collapse runs, trim

use unicode_normalization::UnicodeNormalization;

/// Canonical form used by the scored-similarity matcher.
pub fn canonicalize_for_similarity(text: &str) -> String {
    let normalized: String = text.nfc().collect();
    normalize_whitespace(&normalized.to_lowercase())
}

/// Case-fold for substring comparison; NFC first so composed and
/// decomposed forms agree.
pub fn fold_case(text: &str) -> String {
    text.nfc().collect::<String>().to_lowercase()
}

/// True when the query has nothing to search for.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Normalize whitespace: collapse runs, trim.
pub fn normalize_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_whitespace = true; // Start as true to trim leading

    for c in text.chars() {
        if c.is_whitespace() {
            if !prev_whitespace {
                result.push(' ');
                prev_whitespace = true;
            }
        } else {
            result.push(c);
            prev_whitespace = false;
        }
    }

    if result.ends_with(' ') {
        result.pop();
    }
    result
}
