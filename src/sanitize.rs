//! Text normalization utilities for extracted order-sheet lines.
//!
//! All functions here are pure. Two entry points compose them:
//!
//! - [`sanitize_line`] (NFKC + bidi-control stripping + whitespace
//!   collapse) prepares a line for classification.
//! - [`soft_normalize`] (punctuation + whitespace only) prepares text for
//!   fuzzy matching against external catalogs, where full Unicode
//!   composition could break exact-match lookups.

use unicode_normalization::UnicodeNormalization;

/// The shekel sign, the only currency glyph the table grammar recognizes.
pub const CURRENCY_GLYPH: char = '₪';

/// Bidi-control and invisible code points stripped from extracted text.
///
/// Scanned-sheet generators pepper Hebrew runs with directional marks and
/// zero-width characters that would otherwise defeat anchored regexes.
const BIDI_CONTROLS: &[char] = &[
    '\u{200E}', // left-to-right mark
    '\u{200F}', // right-to-left mark
    '\u{202A}', // left-to-right embedding
    '\u{202B}', // right-to-left embedding
    '\u{202C}', // pop directional formatting
    '\u{202D}', // left-to-right override
    '\u{202E}', // right-to-left override
    '\u{2066}', // left-to-right isolate
    '\u{2067}', // right-to-left isolate
    '\u{2068}', // first strong isolate
    '\u{2069}', // pop directional isolate
    '\u{200B}', // zero-width space
    '\u{200C}', // zero-width non-joiner
    '\u{200D}', // zero-width joiner
    '\u{FEFF}', // zero-width no-break space / BOM
    '\u{00AD}', // soft hyphen
];

/// Apply Unicode NFKC normalization.
pub fn normalize_unicode(input: &str) -> String {
    input.nfkc().collect()
}

/// Remove bidi-control and invisible code points.
pub fn strip_bidi_controls(input: &str) -> String {
    input.chars().filter(|c| !BIDI_CONTROLS.contains(c)).collect()
}

/// Convert tabs to spaces, collapse whitespace runs, and trim.
///
/// Idempotent: `normalize_whitespace(normalize_whitespace(s)) ==
/// normalize_whitespace(s)`.
pub fn normalize_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_was_space && !out.is_empty() {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Map typographic punctuation to ASCII/base forms.
///
/// Covers curly quotes, the Hebrew geresh and gershayim, en/em dashes, and
/// the Hebrew maqaf.
pub fn normalize_punctuation(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{05F3}' => '\'', // curly single quotes, geresh
            '\u{201C}' | '\u{201D}' | '\u{05F4}' => '"',  // curly double quotes, gershayim
            '\u{2013}' | '\u{2014}' | '\u{05BE}' => '-',  // en dash, em dash, maqaf
            other => other,
        })
        .collect()
}

/// Rewrite the literal "ILS" to the currency glyph and collapse doubled
/// glyphs left behind by fragment joins.
pub fn normalize_currency(input: &str) -> String {
    let mut out = input.replace("ILS", "₪");
    loop {
        let next = out.replace("₪₪", "₪");
        if next == out {
            break;
        }
        out = next;
    }
    out
}

/// Full sanitization for lines destined for classification: NFKC, then
/// bidi-control stripping, then whitespace normalization.
pub fn sanitize_line(input: &str) -> String {
    normalize_whitespace(&strip_bidi_controls(&normalize_unicode(input)))
}

/// Soft normalization for fuzzy external matching: punctuation and
/// whitespace only, leaving Unicode composition untouched.
pub fn soft_normalize(input: &str) -> String {
    normalize_whitespace(&normalize_punctuation(input))
}
