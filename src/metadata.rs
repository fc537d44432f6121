//! Client-name and event-date extraction from page-1 header text.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

/// Operator-facing stand-in when no client line matches the template.
pub const CLIENT_PLACEHOLDER: &str = "לקוח לא מזוהה";

/// The fixed business name closing the addressee line.
pub const SUPPLIER_NAME: &str = "מאפיית השקד";

lazy_static! {
    /// addressee template: "לכבוד: <client> <supplier>"
    static ref RE_CLIENT_LINE: Regex =
        Regex::new(r"לכבוד:\s*(?P<name>.+?)\s*מאפיית השקד").unwrap();

    /// a DD/MM or DD.MM token pair
    static ref RE_DATE_TOKEN: Regex = Regex::new(r"\b(\d{1,2})[./](\d{1,2})\b").unwrap();
}

/// Scan page-1 lines in original order for the addressee template; the
/// first match wins. Returns `None` when no line matches.
pub fn extract_client(page1: &[String]) -> Option<String> {
    page1.iter().find_map(|line| {
        RE_CLIENT_LINE
            .captures(line)
            .map(|caps| caps["name"].trim().to_string())
            .filter(|name| !name.is_empty())
    })
}

/// Extract the event date from page-1 lines.
///
/// The date is expected on the line immediately preceding the table header
/// (`header_idx`, when the header sits on page 1). If that line yields no
/// valid date, every page-1 line above the header is scanned in order
/// (or all of page 1 when no header was found) and the first token pair
/// that validates as a real calendar date wins.
///
/// `year` is supplied by the caller (sheets print day and month only).
/// Returns the date and the line it was found on.
pub fn extract_event_date(
    page1: &[String],
    header_idx: Option<usize>,
    year: i32,
) -> (Option<NaiveDate>, Option<String>) {
    if let Some(h) = header_idx {
        if h > 0 && h <= page1.len() {
            let line = &page1[h - 1];
            if let Some(date) = parse_date_in_line(line, year) {
                return (Some(date), Some(line.clone()));
            }
        }
    }

    let scan_end = header_idx.unwrap_or(page1.len()).min(page1.len());
    for line in &page1[..scan_end] {
        if let Some(date) = parse_date_in_line(line, year) {
            return (Some(date), Some(line.clone()));
        }
    }

    (None, None)
}

/// First token pair in the line that forms a valid calendar date.
///
/// Disambiguation for a pair `a/b`, each in 1..=31: a value over 12 must
/// be the day; when both could be months, `a` is taken as the day.
/// Candidates that fail calendar validation (e.g. 31/02) are skipped and
/// the scan continues.
fn parse_date_in_line(line: &str, year: i32) -> Option<NaiveDate> {
    for caps in RE_DATE_TOKEN.captures_iter(line) {
        let a: u32 = match caps[1].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        let b: u32 = match caps[2].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        if !(1..=31).contains(&a) || !(1..=31).contains(&b) {
            continue;
        }
        let (day, month) = if a > 12 && b <= 12 {
            (a, b)
        } else if b > 12 && a <= 12 {
            (b, a)
        } else {
            (a, b)
        };
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }
    None
}
