//! Batch aggregation of per-document extracts into order records.
//!
//! Each document runs through the pipeline independently; the merge is
//! strictly sequential. Quantities are summed commutatively, so merge
//! order cannot change the matrix. The first event date seen per client
//! wins and is never overwritten, and notes keep document order.

use chrono::NaiveDate;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pipeline::{extract_sheet, SheetExtract};

/// A free-text note tied to one product for one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEntry {
    /// Product title the note belongs to
    pub product: String,
    /// Note text
    pub note: String,
}

/// Merged batch state: quantities, dates, and notes keyed by client.
///
/// Invariant: every stored (product, client) entry has a quantity greater
/// than zero.
#[derive(Debug, Default)]
pub struct MatrixResult {
    /// product → client → summed quantity, in product-first-seen order
    pub matrix: IndexMap<String, IndexMap<String, u32>>,
    /// first event date seen per client; never overwritten
    pub client_date: IndexMap<String, NaiveDate>,
    /// notes per client in document-then-in-document order
    pub notes_by_client: IndexMap<String, Vec<NoteEntry>>,
}

impl MatrixResult {
    /// Empty batch state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one document's extract into the batch.
    ///
    /// Quantities accumulate: repeated products within or across documents
    /// for the same client add up, never overwrite. Blank notes are
    /// dropped.
    pub fn merge_sheet(&mut self, sheet: &SheetExtract) {
        let client = sheet.client.clone();

        // make the client visible even when the sheet carried no notes
        self.notes_by_client.entry(client.clone()).or_default();

        if let Some(date) = sheet.event_date {
            self.client_date.entry(client.clone()).or_insert(date);
        }

        for item in &sheet.items {
            if item.qty == 0 {
                continue;
            }
            *self
                .matrix
                .entry(item.title.clone())
                .or_default()
                .entry(client.clone())
                .or_insert(0) += item.qty;
        }

        for (product, note) in &sheet.notes {
            if note.trim().is_empty() {
                continue;
            }
            self.notes_by_client
                .entry(client.clone())
                .or_default()
                .push(NoteEntry {
                    product: product.clone(),
                    note: note.clone(),
                });
        }
    }

    /// Serialize the batch into one [`OrderRecord`] per distinct client,
    /// in alphabetical client order.
    ///
    /// Clients sort by code-point order, which coincides with the Hebrew
    /// alphabet for the template's client names. Items enumerate every
    /// product with a nonzero summed quantity for the client, in
    /// product-first-seen order.
    pub fn into_orders(self) -> Vec<OrderRecord> {
        let mut clients: IndexSet<String> = IndexSet::new();
        clients.extend(self.notes_by_client.keys().cloned());
        clients.extend(self.client_date.keys().cloned());
        for per_client in self.matrix.values() {
            clients.extend(per_client.keys().cloned());
        }
        let mut clients: Vec<String> = clients.into_iter().collect();
        clients.sort();

        clients
            .into_iter()
            .map(|client| {
                let items: Vec<OrderItem> = self
                    .matrix
                    .iter()
                    .filter_map(|(product, per_client)| {
                        per_client
                            .get(&client)
                            .filter(|qty| **qty > 0)
                            .map(|qty| OrderItem {
                                title: product.clone(),
                                qty: *qty,
                            })
                    })
                    .collect();

                let order_notes = self
                    .notes_by_client
                    .get(&client)
                    .filter(|notes| !notes.is_empty())
                    .map(|notes| {
                        notes
                            .iter()
                            .map(|entry| format!("{}: {}", entry.product, entry.note))
                            .collect()
                    });

                OrderRecord {
                    order_id: None,
                    client_name: client.clone(),
                    event_date: self
                        .client_date
                        .get(&client)
                        .map(|date| date.format("%Y-%m-%d").to_string()),
                    status: "confirmed".to_string(),
                    items,
                    order_notes,
                    total_sum: None,
                    currency: None,
                    source: "pdf-import".to_string(),
                    meta: serde_json::Map::new(),
                }
            })
            .collect()
    }
}

/// One line item on an order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product title
    pub title: String,
    /// Summed quantity, always nonzero
    pub qty: u32,
}

/// One importable order, the shape the order-management host consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    /// Always `null`; assigned by the host on persist
    pub order_id: Option<String>,
    /// Client the order belongs to
    pub client_name: String,
    /// Event date as `YYYY-MM-DD`, `null` when none was found
    pub event_date: Option<String>,
    /// Always `"confirmed"`
    pub status: String,
    /// Products with nonzero summed quantities
    pub items: Vec<OrderItem>,
    /// `"<product>: <note>"` strings, `null` when the client has none
    pub order_notes: Option<Vec<String>>,
    /// Always `null`; financial reconciliation is not performed here
    pub total_sum: Option<f64>,
    /// Always `null`
    pub currency: Option<String>,
    /// Always `"pdf-import"`
    pub source: String,
    /// Reserved for the host
    pub meta: serde_json::Map<String, serde_json::Value>,
}

/// Result of one batch call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// One record per distinct client, alphabetically ordered
    pub orders: Vec<OrderRecord>,
}

/// Extract and merge a batch of order-sheet PDFs.
///
/// Fail-fast policy: the first document that fails to decode aborts the
/// batch and its error is returned. Each invocation is independent; no
/// state survives the call.
pub fn extract_orders(buffers: &[Vec<u8>]) -> Result<BatchResult> {
    let mut merged = MatrixResult::new();
    for buffer in buffers {
        let sheet = extract_sheet(buffer)?;
        merged.merge_sheet(&sheet);
    }
    log::debug!(
        "batch of {} document(s) produced {} client(s)",
        buffers.len(),
        merged.notes_by_client.len()
    );
    Ok(BatchResult {
        orders: merged.into_orders(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::ParsedItem;
    use indexmap::IndexMap;

    fn sheet(client: &str, items: &[(&str, u32)], notes: &[(&str, &str)]) -> SheetExtract {
        SheetExtract {
            lines: Vec::new(),
            client: client.to_string(),
            event_date: None,
            date_line: None,
            items: items
                .iter()
                .map(|(title, qty)| ParsedItem {
                    title: title.to_string(),
                    qty: *qty,
                })
                .collect(),
            notes: notes
                .iter()
                .map(|(product, note)| (product.to_string(), note.to_string()))
                .collect::<IndexMap<_, _>>(),
        }
    }

    #[test]
    fn test_matrix_additivity() {
        let mut merged = MatrixResult::new();
        merged.merge_sheet(&sheet("קפה נמרוד", &[("עוגת שוקולד", 2)], &[]));
        merged.merge_sheet(&sheet("קפה נמרוד", &[("עוגת שוקולד", 2)], &[]));
        assert_eq!(merged.matrix["עוגת שוקולד"]["קפה נמרוד"], 4);
    }

    #[test]
    fn test_repeated_product_within_document_accumulates() {
        let mut merged = MatrixResult::new();
        merged.merge_sheet(&sheet(
            "קפה נמרוד",
            &[("חלה", 1), ("חלה", 3)],
            &[],
        ));
        assert_eq!(merged.matrix["חלה"]["קפה נמרוד"], 4);
    }

    #[test]
    fn test_first_event_date_wins() {
        let mut merged = MatrixResult::new();
        let mut first = sheet("קפה נמרוד", &[], &[]);
        first.event_date = NaiveDate::from_ymd_opt(2026, 3, 6);
        let mut second = sheet("קפה נמרוד", &[], &[]);
        second.event_date = NaiveDate::from_ymd_opt(2026, 4, 1);
        merged.merge_sheet(&first);
        merged.merge_sheet(&second);
        assert_eq!(
            merged.client_date["קפה נמרוד"],
            NaiveDate::from_ymd_opt(2026, 3, 6).unwrap()
        );
    }

    #[test]
    fn test_blank_notes_dropped() {
        let mut merged = MatrixResult::new();
        merged.merge_sheet(&sheet(
            "קפה נמרוד",
            &[("חלה", 1)],
            &[("חלה", "  "), ("עוגה", "בלי סוכר")],
        ));
        let notes = &merged.notes_by_client["קפה נמרוד"];
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].product, "עוגה");
    }

    #[test]
    fn test_orders_sorted_and_shaped() {
        let mut merged = MatrixResult::new();
        let mut doc = sheet("קפה נמרוד", &[("עוגת שוקולד", 3)], &[("עוגת שוקולד", "בלי אגוזים")]);
        doc.event_date = NaiveDate::from_ymd_opt(2026, 3, 6);
        merged.merge_sheet(&doc);
        merged.merge_sheet(&sheet("גן אלון", &[("חלה", 2)], &[]));

        let orders = merged.into_orders();
        assert_eq!(orders.len(), 2);
        // ג sorts before ק
        assert_eq!(orders[0].client_name, "גן אלון");
        assert_eq!(orders[1].client_name, "קפה נמרוד");

        let nimrod = &orders[1];
        assert_eq!(nimrod.event_date.as_deref(), Some("2026-03-06"));
        assert_eq!(nimrod.status, "confirmed");
        assert_eq!(nimrod.source, "pdf-import");
        assert_eq!(
            nimrod.items,
            vec![OrderItem { title: "עוגת שוקולד".into(), qty: 3 }]
        );
        assert_eq!(
            nimrod.order_notes,
            Some(vec!["עוגת שוקולד: בלי אגוזים".to_string()])
        );

        let alon = &orders[0];
        assert_eq!(alon.event_date, None);
        assert_eq!(alon.order_notes, None);
    }

    #[test]
    fn test_client_without_items_still_gets_record() {
        let mut merged = MatrixResult::new();
        merged.merge_sheet(&sheet("קפה נמרוד", &[], &[]));
        let orders = merged.into_orders();
        assert_eq!(orders.len(), 1);
        assert!(orders[0].items.is_empty());
        assert_eq!(orders[0].order_notes, None);
    }

    #[test]
    fn test_items_in_product_first_seen_order() {
        let mut merged = MatrixResult::new();
        merged.merge_sheet(&sheet("א", &[("מוצר ב", 1), ("מוצר א", 1)], &[]));
        merged.merge_sheet(&sheet("א", &[("מוצר ג", 1)], &[]));
        let orders = merged.into_orders();
        let titles: Vec<&str> = orders[0].items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["מוצר ב", "מוצר א", "מוצר ג"]);
    }

    #[test]
    fn test_order_record_json_shape() {
        let mut merged = MatrixResult::new();
        merged.merge_sheet(&sheet("קפה נמרוד", &[("חלה", 2)], &[]));
        let orders = merged.into_orders();
        let json = serde_json::to_value(&orders[0]).unwrap();
        assert_eq!(json["orderId"], serde_json::Value::Null);
        assert_eq!(json["clientName"], "קפה נמרוד");
        assert_eq!(json["status"], "confirmed");
        assert_eq!(json["source"], "pdf-import");
        assert_eq!(json["totalSum"], serde_json::Value::Null);
        assert_eq!(json["currency"], serde_json::Value::Null);
        assert_eq!(json["items"][0]["title"], "חלה");
        assert_eq!(json["items"][0]["qty"], 2);
        assert!(json["meta"].as_object().unwrap().is_empty());
    }
}
