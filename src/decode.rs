//! PDF page decoding into positioned text fragments.
//!
//! Walks each page's content stream and emits one [`TextFragment`] per
//! text-showing operator, carrying the current text-space origin. Layout
//! reconstruction happens later; this module only tracks enough text state
//! (matrix and font size) to position fragments.
//!
//! Pages are decoded in increasing page-number order. Page 1 drives
//! client/date extraction downstream, so this ordering is load-bearing.

use crate::error::{Error, Result};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

/// A positioned run of text from a page's content stream.
///
/// Ephemeral: consumed by line reconstruction and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    /// Decoded text of the run
    pub text: String,
    /// X origin in text space
    pub x: f32,
    /// Y origin in text space (PDF origin is bottom-left)
    pub y: f32,
}

/// Decode a PDF buffer into per-page fragment lists.
///
/// The outer vector is ordered by increasing page number. Any failure to
/// load the document or decode a page is a hard error for the whole
/// document.
pub fn decode_document(buffer: &[u8]) -> Result<Vec<Vec<TextFragment>>> {
    let doc = Document::load_mem(buffer)?;
    let mut pages = Vec::new();
    for (page_num, page_id) in doc.get_pages() {
        let fragments = decode_page(&doc, page_id, page_num)?;
        log::debug!("page {}: {} text fragments", page_num, fragments.len());
        pages.push(fragments);
    }
    Ok(pages)
}

/// Decode one page's content stream into text fragments.
fn decode_page(doc: &Document, page_id: ObjectId, page_num: u32) -> Result<Vec<TextFragment>> {
    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();

    let content_data = doc.get_page_content(page_id).map_err(|e| Error::PageDecode {
        page: page_num,
        reason: e.to_string(),
    })?;
    let content = Content::decode(&content_data).map_err(|e| Error::PageDecode {
        page: page_num,
        reason: e.to_string(),
    })?;

    let mut fragments = Vec::new();

    // Text state
    let mut current_font = String::new();
    let mut current_font_size: f32 = 12.0;
    let mut text_matrix = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut line_matrix = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut in_text_block = false;

    for op in &content.operations {
        match op.operator.as_str() {
            "BT" => {
                in_text_block = true;
                text_matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
                line_matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
            }
            "ET" => {
                in_text_block = false;
            }
            "Tf" => {
                if op.operands.len() >= 2 {
                    if let Ok(name) = op.operands[0].as_name() {
                        current_font = String::from_utf8_lossy(name).to_string();
                    }
                    if let Some(size) = as_number(&op.operands[1]) {
                        current_font_size = size;
                    }
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    let tx = as_number(&op.operands[0]).unwrap_or(0.0);
                    let ty = as_number(&op.operands[1]).unwrap_or(0.0);
                    line_matrix[4] += tx;
                    line_matrix[5] += ty;
                    text_matrix = line_matrix;
                }
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    for (i, operand) in op.operands.iter().take(6).enumerate() {
                        text_matrix[i] =
                            as_number(operand).unwrap_or(if i == 0 || i == 3 { 1.0 } else { 0.0 });
                    }
                    line_matrix = text_matrix;
                }
            }
            "T*" => {
                line_matrix[5] -= current_font_size * 1.2;
                text_matrix = line_matrix;
            }
            "Tj" => {
                if in_text_block && !op.operands.is_empty() {
                    if let Some(text) =
                        decode_text_operand(&op.operands[0], doc, &fonts, &current_font)
                    {
                        push_fragment(&mut fragments, text, &text_matrix);
                    }
                }
            }
            "TJ" => {
                if in_text_block && !op.operands.is_empty() {
                    if let Ok(array) = op.operands[0].as_array() {
                        let mut combined = String::new();
                        for item in array {
                            if let Some(text) =
                                decode_text_operand(item, doc, &fonts, &current_font)
                            {
                                combined.push_str(&text);
                            }
                        }
                        push_fragment(&mut fragments, combined, &text_matrix);
                    }
                }
            }
            "'" => {
                line_matrix[5] -= current_font_size * 1.2;
                text_matrix = line_matrix;
                if !op.operands.is_empty() {
                    if let Some(text) =
                        decode_text_operand(&op.operands[0], doc, &fonts, &current_font)
                    {
                        push_fragment(&mut fragments, text, &text_matrix);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(fragments)
}

/// Append a fragment unless its text is empty after trimming.
fn push_fragment(fragments: &mut Vec<TextFragment>, text: String, matrix: &[f32; 6]) {
    if !text.trim().is_empty() {
        fragments.push(TextFragment {
            text,
            x: matrix[4],
            y: matrix[5],
        });
    }
}

/// Coerce a numeric operand to f32.
fn as_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Decode a text-showing operand, handling string encodings.
///
/// UTF-16BE (BOM-marked) strings are checked first: the order-sheet
/// template emits its Hebrew runs that way, and a font's declared
/// single-byte encoding would mangle them. Then the font's declared
/// encoding, then a Latin-1 fallback.
fn decode_text_operand(
    obj: &Object,
    doc: &Document,
    fonts: &std::collections::BTreeMap<Vec<u8>, &lopdf::Dictionary>,
    current_font: &str,
) -> Option<String> {
    if let Object::String(bytes, _) = obj {
        if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
            let utf16: Vec<u16> = bytes[2..]
                .chunks_exact(2)
                .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
                .collect();
            return Some(String::from_utf16_lossy(&utf16));
        }

        if let Some(font_dict) = fonts.get(current_font.as_bytes()) {
            if let Ok(encoding) = font_dict.get_font_encoding(doc) {
                if let Ok(text) = Document::decode_text(&encoding, bytes) {
                    return Some(text);
                }
            }
        }

        // Latin-1 fallback
        Some(bytes.iter().map(|&b| b as char).collect())
    } else {
        None
    }
}
