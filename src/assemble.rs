//! Bottom-up assembly of classified rows into item records.
//!
//! The sheet template prints a product's title above its price row but its
//! free-text note below it, and some variants split the title onto its own
//! row above a bare quantity/price row. A single bottom-up pass resolves
//! each price anchor before the rows that depend on it, so no lookahead or
//! backtracking is needed.
//!
//! Rows live in an indexable arena of `{text, kind}` records; consuming a
//! row advances its kind in place to `Used` or `UsedNote`. The pass
//! mutates those tags, so it runs exactly once per document.

use crate::classify::{classify, row_qty, text_qty_parts, LineKind};
use indexmap::IndexMap;

/// One item parsed from one document. Title is raw, uncanonicalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedItem {
    /// Product title as printed on the sheet
    pub title: String,
    /// Ordered quantity, always at least 1
    pub qty: u32,
}

/// Items and per-title notes assembled from one document.
#[derive(Debug, Default)]
pub struct AssemblyOutput {
    /// Items in top-to-bottom sheet order
    pub items: Vec<ParsedItem>,
    /// Free-text note per product title; titles without notes are absent
    pub notes: IndexMap<String, String>,
}

struct Row {
    text: String,
    kind: LineKind,
}

/// Assemble items from the table-body lines (the working sequence after
/// the header, or the whole sequence when no header was found).
///
/// Incomplete anchors (a bare price row with no free-text title above it,
/// or a free-text run that exhausts the sequence without reaching an
/// anchor) are dropped without error. An anchor whose title index falls
/// outside the scanned range gets a placeholder title carrying the
/// anchor's row index so the record stays traceable.
pub fn assemble_items(body: &[String]) -> AssemblyOutput {
    let mut rows: Vec<Row> = body
        .iter()
        .map(|line| Row {
            text: line.clone(),
            kind: classify(line),
        })
        .filter(|row| !matches!(row.kind, LineKind::Header | LineKind::Noise))
        .collect();

    let mut items: Vec<ParsedItem> = Vec::new();
    let mut notes: IndexMap<String, String> = IndexMap::new();

    let mut i = rows.len() as isize - 1;
    while i >= 0 {
        let idx = i as usize;
        match rows[idx].kind {
            LineKind::Used | LineKind::UsedNote => {
                i -= 1;
            }
            LineKind::TextQtyPrice => {
                if let Some((title, qty)) = text_qty_parts(&rows[idx].text) {
                    push_item(&mut items, title, qty);
                }
                rows[idx].kind = LineKind::Used;
                i -= 1;
            }
            LineKind::QtyPriceOnly => {
                i = consume_bare_anchor(&mut rows, idx, &mut items, &mut notes);
            }
            LineKind::TextOnly => {
                i = consume_text_run(&mut rows, idx, &mut items, &mut notes);
            }
            // header/noise rows were filtered out above
            LineKind::Header | LineKind::Noise => {
                i -= 1;
            }
        }
    }

    // restore natural top-to-bottom order
    items.reverse();
    notes.reverse();
    AssemblyOutput { items, notes }
}

/// A bare quantity/price row reached directly: its title must sit on the
/// row immediately above. Returns the next loop index.
fn consume_bare_anchor(
    rows: &mut [Row],
    idx: usize,
    items: &mut Vec<ParsedItem>,
    notes: &mut IndexMap<String, String>,
) -> isize {
    let qty = row_qty(&rows[idx].text).unwrap_or(1);

    if idx > 0 && rows[idx - 1].kind == LineKind::TextOnly {
        let title = rows[idx - 1].text.clone();
        // the row just below the price row may be this item's note
        if idx + 1 < rows.len() && rows[idx + 1].kind == LineKind::TextOnly {
            notes.insert(title.clone(), rows[idx + 1].text.clone());
            rows[idx + 1].kind = LineKind::UsedNote;
        }
        rows[idx - 1].kind = LineKind::Used;
        rows[idx].kind = LineKind::Used;
        push_item(items, title, qty);
        idx as isize - 2
    } else {
        // no free-text title above: never guess, drop the anchor
        log::debug!("dropping bare price row {} with no title above", idx);
        idx as isize - 1
    }
}

/// A free-text row: collect the upward run of consecutive free-text rows
/// and resolve it against the first boundary row above. Returns the next
/// loop index.
fn consume_text_run(
    rows: &mut [Row],
    idx: usize,
    items: &mut Vec<ParsedItem>,
    notes: &mut IndexMap<String, String>,
) -> isize {
    let mut j = idx as isize;
    let mut block: Vec<String> = Vec::new();
    while j >= 0 && rows[j as usize].kind == LineKind::TextOnly {
        block.push(rows[j as usize].text.clone());
        j -= 1;
    }
    block.reverse(); // document order

    if j < 0 {
        // ran off the top without an anchor
        log::debug!("discarding unanchored note block of {} line(s)", block.len());
        return -1;
    }

    let b = j as usize;
    match rows[b].kind {
        LineKind::TextQtyPrice => {
            if let Some((title, qty)) = text_qty_parts(&rows[b].text) {
                let note = block.join(" ");
                if !note.is_empty() {
                    notes.insert(title.clone(), note);
                }
                push_item(items, title, qty);
            }
            for row in rows.iter_mut().take(idx + 1).skip(b + 1) {
                row.kind = LineKind::UsedNote;
            }
            rows[b].kind = LineKind::Used;
            b as isize - 1
        }
        LineKind::QtyPriceOnly => {
            let qty = row_qty(&rows[b].text).unwrap_or(1);
            if b == 0 {
                // anchor at the top edge: no room for a title row
                let title = placeholder_title(b);
                log::warn!("synthesized placeholder title for anchor row {}", b);
                finish_anchored_block(rows, b, idx, None, block, title, qty, items, notes);
                -1
            } else if rows[b - 1].kind == LineKind::TextOnly {
                // When the note block is long enough and another free-text
                // row sits two above the anchor, the row directly above is
                // one more note line and the title is the row above that.
                let (title_idx, extra_note) =
                    if block.len() >= 2 && b >= 2 && rows[b - 2].kind == LineKind::TextOnly {
                        (b - 2, Some(b - 1))
                    } else {
                        (b - 1, None)
                    };
                let title = rows[title_idx].text.clone();
                finish_anchored_block(rows, b, idx, extra_note, block, title, qty, items, notes);
                rows[title_idx].kind = LineKind::Used;
                title_idx as isize - 1
            } else {
                // boundary has no usable title row above it
                log::debug!(
                    "discarding note block of {} line(s): anchor row {} has no title",
                    block.len(),
                    b
                );
                b as isize - 1
            }
        }
        _ => {
            // consumed boundary: nothing left to attach the block to
            log::debug!("discarding note block of {} line(s) at consumed row", block.len());
            b as isize
        }
    }
}

/// Emit an item for a bare anchor that closes a note block, marking the
/// anchor, the block, and any extra note row as consumed.
#[allow(clippy::too_many_arguments)]
fn finish_anchored_block(
    rows: &mut [Row],
    anchor: usize,
    block_end: usize,
    extra_note: Option<usize>,
    block: Vec<String>,
    title: String,
    qty: u32,
    items: &mut Vec<ParsedItem>,
    notes: &mut IndexMap<String, String>,
) {
    let mut full = Vec::new();
    if let Some(extra) = extra_note {
        full.push(rows[extra].text.clone());
        rows[extra].kind = LineKind::UsedNote;
    }
    full.extend(block);
    let note = full.join(" ");
    if !note.is_empty() {
        notes.insert(title.clone(), note);
    }
    rows[anchor].kind = LineKind::Used;
    for row in rows.iter_mut().take(block_end + 1).skip(anchor + 1) {
        row.kind = LineKind::UsedNote;
    }
    push_item(items, title, qty);
}

/// Traceable stand-in title for an anchor whose title row is out of range.
fn placeholder_title(anchor_idx: usize) -> String {
    format!("מוצר לא מזוהה (שורה {})", anchor_idx + 1)
}

fn push_item(items: &mut Vec<ParsedItem>, title: String, qty: u32) {
    if qty == 0 {
        log::debug!("skipping zero-quantity row for {:?}", title);
        return;
    }
    items.push(ParsedItem { title, qty });
}
