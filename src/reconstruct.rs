//! Reading-order line reconstruction from positioned fragments.
//!
//! Fragments are grouped into rows by Y proximity with first-fit greedy
//! bucketing, rows are ordered top-to-bottom (descending Y; the PDF origin
//! is bottom-left), and fragments within a row are ordered right-to-left
//! (descending X) for Hebrew reading order.
//!
//! Known limitation of the first-fit bucketing: fragments straddling the
//! tolerance boundary within a visually single line can land in separate
//! rows. The fixed sheet template keeps rows far enough apart that this
//! does not occur in practice.

use crate::decode::TextFragment;
use crate::sanitize::{normalize_whitespace, CURRENCY_GLYPH};
use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;

/// Maximum Y distance between a fragment and a row's anchor for the
/// fragment to join that row.
pub const ROW_Y_TOLERANCE: f32 = 3.0;

lazy_static! {
    /// A decimal number split across fragments and re-joined in visual
    /// (reversed) order: `<fraction> SP . SP <integer>`
    static ref RE_SPLIT_DECIMAL: Regex = Regex::new(r"(\d+) \. (\d+)").unwrap();
}

struct RowGroup {
    anchor_y: f32,
    members: Vec<TextFragment>,
}

/// Reconstruct one page's fragments into ordered logical lines.
///
/// Empty fragments are dropped before grouping; lines that are empty after
/// joining and trimming are omitted.
pub fn reconstruct_page(fragments: Vec<TextFragment>) -> Vec<String> {
    let mut groups: Vec<RowGroup> = Vec::new();

    for frag in fragments {
        if frag.text.trim().is_empty() {
            continue;
        }
        // first fit: a fragment joins the first group within tolerance
        match groups
            .iter_mut()
            .find(|g| (g.anchor_y - frag.y).abs() <= ROW_Y_TOLERANCE)
        {
            Some(group) => group.members.push(frag),
            None => groups.push(RowGroup {
                anchor_y: frag.y,
                members: vec![frag],
            }),
        }
    }

    // Top of page first
    groups.sort_by(|a, b| b.anchor_y.partial_cmp(&a.anchor_y).unwrap_or(Ordering::Equal));

    groups
        .into_iter()
        .filter_map(|mut group| {
            // Hebrew reading order: rightmost fragment first
            group
                .members
                .sort_by(|a, b| b.x.partial_cmp(&a.x).unwrap_or(Ordering::Equal));
            let joined = group
                .members
                .iter()
                .map(|f| f.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let line = repair_split_decimals(&normalize_whitespace(&joined));
            if line.is_empty() {
                None
            } else {
                Some(line)
            }
        })
        .collect()
}

/// Repair decimal numbers whose fragments were reversed by RTL ordering.
///
/// On currency-bearing lines, `"59 . 135 ₪"` is the visual split of
/// `135.59`: the fraction fragment sits right of the integer fragment, so
/// descending-X joining reverses the operands. The rewrite swaps them back.
pub fn repair_split_decimals(line: &str) -> String {
    if !line.contains(CURRENCY_GLYPH) && !line.contains("ILS") {
        return line.to_string();
    }
    RE_SPLIT_DECIMAL.replace_all(line, "${2}.${1}").to_string()
}
