//! # Order Oxide
//!
//! Structured order extraction from scanned Hebrew order-sheet PDFs.
//!
//! The hard part of importing printed order sheets is not reading the
//! PDF, it is reconstructing meaning from a fixed but messy template:
//! positioned text fragments arrive unordered, Hebrew reads right-to-left
//! while numbers read left-to-right, product titles sit above their price
//! rows while free-text notes sit below them. This crate turns that
//! layout back into structured order records:
//!
//! - **Reading-order reconstruction**: Y-proximity row bucketing and
//!   right-to-left fragment ordering, with repair of decimal numbers that
//!   RTL layout split and reversed.
//! - **Row classification**: a closed-enum grammar over the template's
//!   table rows (header, priced rows, free text, boilerplate noise).
//! - **Item assembly**: a single bottom-up pass pairing product titles
//!   with quantities and notes, preserving the template's quirks instead
//!   of guessing.
//! - **Batch aggregation**: a product×client quantity matrix merged
//!   across documents and serialized to importable order records.
//!
//! ## Quick Start
//!
//! ```ignore
//! use order_oxide::{extract_orders, extract_sheet};
//!
//! # fn main() -> order_oxide::Result<()> {
//! // One document
//! let buffer = std::fs::read("order.pdf")?;
//! let sheet = extract_sheet(&buffer)?;
//! println!("{}: {} items", sheet.client, sheet.items.len());
//!
//! // A batch, merged into one record per client
//! let batch = extract_orders(&[buffer])?;
//! println!("{}", serde_json::to_string_pretty(&batch)?);
//! # Ok(())
//! # }
//! ```
//!
//! The pipeline is tuned to one fixed sheet template; the named constants
//! in each module (row tolerance, footer line count, header phrase pair,
//! addressee template, noise phrases) are compatibility-relevant and are
//! deliberately not runtime options.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Text normalization
pub mod sanitize;

// PDF page decoding
pub mod decode;

// Line reconstruction and classification
pub mod classify;
pub mod reconstruct;

// Item assembly and metadata
pub mod assemble;
pub mod metadata;

// Orchestration and batch aggregation
pub mod aggregate;
pub mod pipeline;

pub use aggregate::{extract_orders, BatchResult, MatrixResult, NoteEntry, OrderItem, OrderRecord};
pub use assemble::{AssemblyOutput, ParsedItem};
pub use classify::{classify, LineKind};
pub use decode::TextFragment;
pub use error::{Error, Result};
pub use pipeline::{extract_sheet, extract_sheet_for_year, SheetExtract};
