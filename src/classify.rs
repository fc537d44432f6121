//! Table-row classification for sanitized order-sheet lines.
//!
//! [`classify`] tags each line with one [`LineKind`] through an ordered
//! predicate cascade: the table header, the price-bearing row grammars,
//! the invoice-boilerplate noise list, and a free-text fallback. Two
//! post-checks run on grammar matches: a reserved financial-summary
//! keyword in the leading-text position reclassifies the row as noise, and
//! any price classification on a line with no currency glyph is downgraded
//! to free text.
//!
//! Header and noise matching tolerates both the gershayim (״) and ASCII
//! quote spellings, since classification runs before punctuation
//! normalization.

use crate::sanitize::CURRENCY_GLYPH;
use lazy_static::lazy_static;
use regex::Regex;

/// The "product" word of the header phrase pair; a line carrying both it
/// and the "total" token is the table header.
pub const HEADER_PRODUCT_TOKEN: &str = "מוצר";

/// Role of one reconstructed line.
///
/// `classify` returns one of the first five variants. `Used` and
/// `UsedNote` are transient markers the assembler applies in place while
/// consuming rows; they are never produced by classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// The table-header line opening the line-item table
    Header,
    /// Invoice boilerplate with no order content
    Noise,
    /// Free text: a product title or a note
    TextOnly,
    /// Title, quantity, and price on one row
    TextQtyPrice,
    /// Quantity and price with no leading title
    QtyPriceOnly,
    /// Consumed as a title or anchor during assembly
    Used,
    /// Consumed as a note line during assembly
    UsedNote,
}

lazy_static! {
    /// "total" token of the header phrase pair, either quote spelling
    static ref RE_HEADER_TOTAL_TOKEN: Regex = Regex::new(r#"סה["״]כ"#).unwrap();

    /// title + integer qty + decimal unit price + decimal total price
    static ref RE_TEXT_QTY_PRICE: Regex =
        Regex::new(r"^(?P<title>.+?)\s+(?P<qty>\d+)\s+(?P<unit>\d+\.\d+)\s+(?P<total>\d+\.\d+)\s*₪?\s*$")
            .unwrap();

    /// integer qty + decimal unit price + decimal total price, no title
    static ref RE_QTY_PRICE_ONLY: Regex =
        Regex::new(r"^(?P<qty>\d+)\s+(?P<unit>\d+\.\d+)\s+(?P<total>\d+\.\d+)\s*₪?\s*$").unwrap();

    /// a lone decimal price
    static ref RE_LONE_PRICE: Regex = Regex::new(r"^(?P<total>\d+\.\d+)\s*₪?\s*$").unwrap();

    /// title + a lone decimal price, no per-unit breakdown
    static ref RE_TEXT_LONE_PRICE: Regex =
        Regex::new(r"^(?P<title>.+?)\s+(?P<total>\d+\.\d+)\s*₪?\s*$").unwrap();

    /// financial-summary keywords reserved from the title position
    static ref RE_RESERVED_TITLE: Regex =
        Regex::new(r#"^(?:(?:דמי\s+)?משלוח|הובלה|סה["״]כ(?:\s+לתשלום)?|הנחה):?$"#).unwrap();

    /// fixed invoice-boilerplate phrase list
    static ref NOISE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r#"סה["״]כ"#).unwrap(),       // totals block
        Regex::new(r#"מע["״]מ"#).unwrap(),       // VAT
        Regex::new("חתימה").unwrap(),             // signature line
        Regex::new("תנאי תשלום").unwrap(),        // payment terms
        Regex::new("העברה בנקאית").unwrap(),      // bank-transfer instructions
        Regex::new(r"עמוד \d+").unwrap(),         // page number
        Regex::new(r"\d+ מתוך \d+").unwrap(),     // page N of M
        Regex::new("דמי משלוח").unwrap(),         // delivery fee
        Regex::new("הנחה").unwrap(),              // discount
        Regex::new("תודה על הזמנתכם").unwrap(),   // thank-you footer
    ];
}

struct Analysis {
    kind: LineKind,
    title: Option<String>,
    qty: Option<u32>,
}

impl Analysis {
    fn bare(kind: LineKind) -> Self {
        Analysis {
            kind,
            title: None,
            qty: None,
        }
    }
}

/// Classify one sanitized line. Total: every input maps to exactly one
/// [`LineKind`], never `Used`/`UsedNote`.
pub fn classify(line: &str) -> LineKind {
    analyze(line).kind
}

/// Title and quantity of a [`LineKind::TextQtyPrice`] row.
pub fn text_qty_parts(line: &str) -> Option<(String, u32)> {
    let analysis = analyze(line);
    if analysis.kind == LineKind::TextQtyPrice {
        Some((analysis.title?, analysis.qty?))
    } else {
        None
    }
}

/// Quantity carried by an anchor row (either price-bearing kind).
pub fn row_qty(line: &str) -> Option<u32> {
    let analysis = analyze(line);
    match analysis.kind {
        LineKind::TextQtyPrice | LineKind::QtyPriceOnly => analysis.qty,
        _ => None,
    }
}

fn analyze(line: &str) -> Analysis {
    if line.contains(HEADER_PRODUCT_TOKEN) && RE_HEADER_TOTAL_TOKEN.is_match(line) {
        return Analysis::bare(LineKind::Header);
    }

    if let Some(caps) = RE_TEXT_QTY_PRICE.captures(line) {
        let title = caps["title"].trim().to_string();
        if RE_RESERVED_TITLE.is_match(&title) {
            return Analysis::bare(LineKind::Noise);
        }
        if !line.contains(CURRENCY_GLYPH) {
            return Analysis::bare(LineKind::TextOnly);
        }
        let qty = caps["qty"].parse::<u32>().ok();
        return Analysis {
            kind: LineKind::TextQtyPrice,
            title: Some(title),
            qty,
        };
    }

    if let Some(caps) = RE_QTY_PRICE_ONLY.captures(line) {
        if !line.contains(CURRENCY_GLYPH) {
            return Analysis::bare(LineKind::TextOnly);
        }
        let qty = caps["qty"].parse::<u32>().ok();
        return Analysis {
            kind: LineKind::QtyPriceOnly,
            title: None,
            qty,
        };
    }

    if RE_LONE_PRICE.is_match(line) {
        if !line.contains(CURRENCY_GLYPH) {
            return Analysis::bare(LineKind::TextOnly);
        }
        // implicit single unit
        return Analysis {
            kind: LineKind::QtyPriceOnly,
            title: None,
            qty: Some(1),
        };
    }

    if let Some(caps) = RE_TEXT_LONE_PRICE.captures(line) {
        let title = caps["title"].trim().to_string();
        if RE_RESERVED_TITLE.is_match(&title) {
            return Analysis::bare(LineKind::Noise);
        }
        if !line.contains(CURRENCY_GLYPH) {
            return Analysis::bare(LineKind::TextOnly);
        }
        return Analysis {
            kind: LineKind::TextQtyPrice,
            title: Some(title),
            qty: Some(1),
        };
    }

    if NOISE_PATTERNS.iter().any(|re| re.is_match(line)) {
        return Analysis::bare(LineKind::Noise);
    }

    Analysis::bare(LineKind::TextOnly)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_needs_both_tokens() {
        assert_eq!(classify("מוצר כמות מחיר סה\"כ"), LineKind::Header);
        assert_eq!(classify("מוצר כמות מחיר סה״כ"), LineKind::Header);
        assert_eq!(classify("מוצר כמות מחיר"), LineKind::TextOnly);
    }

    #[test]
    fn test_text_qty_price() {
        let line = "עוגת שוקולד 3 45.00 135.00₪";
        assert_eq!(classify(line), LineKind::TextQtyPrice);
        assert_eq!(
            text_qty_parts(line),
            Some(("עוגת שוקולד".to_string(), 3))
        );
        assert_eq!(row_qty(line), Some(3));
    }

    #[test]
    fn test_title_with_trailing_digits() {
        let line = "חלה 500 גרם 2 12.00 24.00 ₪";
        assert_eq!(classify(line), LineKind::TextQtyPrice);
        assert_eq!(text_qty_parts(line), Some(("חלה 500 גרם".to_string(), 2)));
    }

    #[test]
    fn test_qty_price_only() {
        let line = "2 45.00 90.00 ₪";
        assert_eq!(classify(line), LineKind::QtyPriceOnly);
        assert_eq!(row_qty(line), Some(2));
        assert_eq!(text_qty_parts(line), None);
    }

    #[test]
    fn test_lone_price_implies_single_unit() {
        let line = "90.00 ₪";
        assert_eq!(classify(line), LineKind::QtyPriceOnly);
        assert_eq!(row_qty(line), Some(1));
    }

    #[test]
    fn test_text_lone_price_implies_single_unit() {
        let line = "עוגת גבינה 90.00 ₪";
        assert_eq!(classify(line), LineKind::TextQtyPrice);
        assert_eq!(text_qty_parts(line), Some(("עוגת גבינה".to_string(), 1)));
    }

    #[test]
    fn test_reserved_title_is_noise() {
        assert_eq!(classify("משלוח 1 20.00 20.00₪"), LineKind::Noise);
        assert_eq!(classify("דמי משלוח 20.00 ₪"), LineKind::Noise);
        assert_eq!(classify("הנחה 15.00 ₪"), LineKind::Noise);
    }

    #[test]
    fn test_currency_guard_downgrades() {
        // numeric-looking running text without the glyph stays free text
        assert_eq!(classify("רחוב הרצל 12.50"), LineKind::TextOnly);
        assert_eq!(classify("2 45.00 90.00"), LineKind::TextOnly);
        assert_eq!(classify("45.00"), LineKind::TextOnly);
    }

    #[test]
    fn test_noise_phrases() {
        assert_eq!(classify("סה\"כ לתשלום"), LineKind::Noise);
        assert_eq!(classify("מחיר כולל מע״מ"), LineKind::Noise);
        assert_eq!(classify("חתימה:"), LineKind::Noise);
        assert_eq!(classify("עמוד 2"), LineKind::Noise);
        assert_eq!(classify("תודה על הזמנתכם!"), LineKind::Noise);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(classify("בלי אגוזים"), LineKind::TextOnly);
        assert_eq!(classify("עוגת שוקולד"), LineKind::TextOnly);
    }

    #[test]
    fn test_classify_total_over_arbitrary_input() {
        for line in ["", " ", "123", "א", "٣ ٣", "a b c 1.2.3 ₪₪"] {
            // must not panic, must return a non-transient kind
            let kind = classify(line);
            assert!(!matches!(kind, LineKind::Used | LineKind::UsedNote));
        }
    }
}
