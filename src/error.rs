//! Error types for the order-sheet extraction library.
//!
//! This module defines all error types that can occur while decoding and
//! parsing order-sheet PDFs.

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during order-sheet extraction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The PDF buffer could not be loaded as a document
    #[error("Failed to load PDF document: {0}")]
    PdfLoad(#[from] lopdf::Error),

    /// A page's content stream could not be decoded
    #[error("Failed to decode page {page}: {reason}")]
    PageDecode {
        /// 1-indexed page number where decoding failed
        page: u32,
        /// Reason for the decode failure
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_decode_error() {
        let err = Error::PageDecode {
            page: 3,
            reason: "bad content stream".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("page 3"));
        assert!(msg.contains("bad content stream"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
