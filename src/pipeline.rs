//! Per-document extraction pipeline.
//!
//! ```text
//! PDF buffer
//!     ↓
//! [decode]       content streams → positioned fragments, page order
//!     ↓
//! [reconstruct]  fragments → ordered logical lines per page
//!     ↓
//! [sanitize]     NFKC + bidi strip + whitespace + currency glyph
//!     ↓
//! working line sequence (pages concatenated, trailing footer trimmed)
//!     ↓
//! [classify] → [assemble]     line-item table → items + notes
//! [metadata]                  page-1 lines → client + event date
//!     ↓
//! SheetExtract
//! ```
//!
//! The pipeline holds no cross-call state; each invocation is independent
//! and side-effect-free beyond its return value.

use chrono::{Datelike, Local, NaiveDate};
use indexmap::IndexMap;

use crate::assemble::{assemble_items, ParsedItem};
use crate::classify::{classify, LineKind};
use crate::decode::decode_document;
use crate::error::Result;
use crate::metadata::{extract_client, extract_event_date, CLIENT_PLACEHOLDER};
use crate::reconstruct::reconstruct_page;
use crate::sanitize::{normalize_currency, sanitize_line};

/// Number of boilerplate lines the template prints at the bottom of every
/// sheet, dropped from the end of the concatenated line sequence.
pub const TRAILING_FOOTER_LINES: usize = 7;

/// Everything extracted from one order-sheet document.
#[derive(Debug, Clone)]
pub struct SheetExtract {
    /// The working line sequence (sanitized, footer-trimmed)
    pub lines: Vec<String>,
    /// Client name, or the sentinel placeholder when unmatched
    pub client: String,
    /// Event date, `None` when no valid date was found
    pub event_date: Option<NaiveDate>,
    /// The line the event date was read from
    pub date_line: Option<String>,
    /// Items in sheet order, every quantity at least 1
    pub items: Vec<ParsedItem>,
    /// Free-text note per product title
    pub notes: IndexMap<String, String>,
}

/// Run the full extraction pipeline over one PDF buffer.
///
/// Decode failure is a hard error for the document. A missing table
/// header is not: the whole sequence is treated as table body. A missing
/// client line yields the sentinel placeholder and a missing date yields
/// `None`; both are operator-facing values, not errors.
pub fn extract_sheet(buffer: &[u8]) -> Result<SheetExtract> {
    extract_sheet_for_year(buffer, Local::now().year())
}

/// As [`extract_sheet`], with the calendar year injected.
///
/// Sheets print day and month only; the public entry point supplies the
/// current year.
pub fn extract_sheet_for_year(buffer: &[u8], year: i32) -> Result<SheetExtract> {
    let pages = decode_document(buffer)?;
    let page_lines: Vec<Vec<String>> = pages.into_iter().map(reconstruct_page).collect();
    Ok(sheet_from_page_lines(page_lines, year))
}

/// Line-level pipeline stage: sanitize per-page lines, build the working
/// sequence, and run classification, assembly, and metadata extraction.
pub fn sheet_from_page_lines(page_lines: Vec<Vec<String>>, year: i32) -> SheetExtract {
    let mut lines: Vec<String> = Vec::new();
    let mut page1_len = 0usize;
    for (page_no, raw_lines) in page_lines.into_iter().enumerate() {
        let mut sanitized: Vec<String> = raw_lines
            .iter()
            .map(|line| normalize_currency(&sanitize_line(line)))
            .filter(|line| !line.is_empty())
            .collect();
        if page_no == 0 {
            page1_len = sanitized.len();
        }
        lines.append(&mut sanitized);
    }

    let kept = lines.len().saturating_sub(TRAILING_FOOTER_LINES);
    log::debug!("trimming {} trailing footer line(s)", lines.len() - kept);
    lines.truncate(kept);

    let header_idx = lines.iter().position(|line| classify(line) == LineKind::Header);
    if header_idx.is_none() {
        log::debug!("no table header found; treating whole sequence as table body");
    }

    let body = match header_idx {
        Some(h) => &lines[h + 1..],
        None => &lines[..],
    };
    let assembled = assemble_items(body);

    let page1_end = page1_len.min(lines.len());
    let page1 = &lines[..page1_end];
    let client = extract_client(page1).unwrap_or_else(|| CLIENT_PLACEHOLDER.to_string());
    let header_in_page1 = header_idx.filter(|&h| h < page1_end);
    let (event_date, date_line) = extract_event_date(page1, header_in_page1, year);

    log::debug!(
        "extracted {} item(s), {} note(s) for client {:?}",
        assembled.items.len(),
        assembled.notes.len(),
        client
    );

    SheetExtract {
        lines,
        client,
        event_date,
        date_line,
        items: assembled.items,
        notes: assembled.notes,
    }
}
