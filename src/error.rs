//! Error types for the vision-table-extract library.
//!
//! Three types cover three scopes of failure:
//!
//! * [`ExtractError`] — **Fatal**: the document cannot be processed at all
//!   (missing file, not a PDF, pdfium cannot open it, output directory not
//!   writable). Returned as `Err(ExtractError)` from the orchestrator.
//!
//! * [`PageError`] — **Non-fatal**: one page failed (artifact unreadable,
//!   request failed, model answer not parseable as CSV). Stored inside
//!   [`crate::output::PageReport`]; the run moves on to the next page.
//!
//! * [`TransportError`] — what a [`crate::pipeline::client::VisionClient`]
//!   returns when the remote call fails or answers with a non-2xx status.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the vision-table-extract library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Document errors ───────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// pdfium could not load or rasterise the document.
    #[error("Cannot open PDF '{path}': {detail}")]
    DocumentOpen { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium next to the executable, install it system-wide,\n\
or point PDFIUM_LIB_PATH at the directory that contains it.\n"
    )]
    PdfiumBinding(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// The output directory could not be created.
    #[error("Output directory '{path}' is unavailable: {source}")]
    OutputDirUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    /// True for every way the input document can fail to open.
    pub fn is_document_open(&self) -> bool {
        matches!(
            self,
            ExtractError::FileNotFound { .. }
                | ExtractError::PermissionDenied { .. }
                | ExtractError::NotAPdf { .. }
                | ExtractError::DocumentOpen { .. }
        )
    }
}

/// Failure of a single call to the vision endpoint.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportError {
    /// Connection, TLS, timeout or body-read failure.
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// A non-fatal error for a single page.
///
/// Every variant still results in an (empty) CSV file for the page.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
pub enum PageError {
    /// The rendered image could not be read back from disk.
    #[error("Page {page}: cannot read rendered image: {detail}")]
    ArtifactRead { page: usize, detail: String },

    /// The vision request failed.
    #[error("Page {page}: request failed: {error}")]
    Transport { page: usize, error: TransportError },

    /// The response body was not a JSON envelope.
    #[error("Page {page}: response is not a JSON envelope: {detail}")]
    MalformedEnvelope { page: usize, detail: String },

    /// The envelope carried no text in its first choice.
    #[error("Page {page}: response has no message content")]
    MissingContent { page: usize },

    /// The model's text could not be parsed as CSV.
    #[error("Page {page}: failed to parse CSV data: {detail}")]
    TableParse { page: usize, detail: String },

    /// The page's CSV file could not be written.
    ///
    /// `earlier` keeps the failure that had already emptied the table, if any.
    #[error("Page {page}: failed to write '{path}': {detail}")]
    OutputWrite {
        page: usize,
        path: PathBuf,
        detail: String,
        #[source]
        #[serde(default, skip_serializing_if = "Option::is_none")]
        earlier: Option<Box<PageError>>,
    },
}

impl PageError {
    /// 1-based page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::ArtifactRead { page, .. }
            | PageError::Transport { page, .. }
            | PageError::MalformedEnvelope { page, .. }
            | PageError::MissingContent { page }
            | PageError::TableParse { page, .. }
            | PageError::OutputWrite { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_open_family() {
        let e = ExtractError::NotAPdf {
            path: "x.pdf".into(),
            magic: *b"GIF8",
        };
        assert!(e.is_document_open());
        assert!(!ExtractError::InvalidConfig("zoom".into()).is_document_open());
    }

    #[test]
    fn transport_status_display() {
        let e = PageError::Transport {
            page: 2,
            error: TransportError::Status {
                status: 401,
                body: "invalid api key".into(),
            },
        };
        let msg = e.to_string();
        assert!(msg.contains("Page 2"), "got: {msg}");
        assert!(msg.contains("HTTP 401"), "got: {msg}");
        assert_eq!(e.page(), 2);
    }

    #[test]
    fn table_parse_display() {
        let e = PageError::TableParse {
            page: 7,
            detail: "found record with 3 fields, but the previous record has 2 fields".into(),
        };
        assert!(e.to_string().contains("failed to parse CSV data"));
        assert_eq!(e.page(), 7);
    }

    #[test]
    fn page_error_serialises() {
        let e = PageError::MissingContent { page: 1 };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("MissingContent"));
    }

    #[test]
    fn output_write_keeps_earlier_cause() {
        let e = PageError::OutputWrite {
            page: 4,
            path: "out/x.csv".into(),
            detail: "read-only file system".into(),
            earlier: Some(Box::new(PageError::MissingContent { page: 4 })),
        };
        let source = std::error::Error::source(&e).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("Page 4: response has no message content"));

        let back: PageError = serde_json::from_str(&serde_json::to_string(&e).unwrap()).unwrap();
        assert_eq!(back, e);
    }
}
