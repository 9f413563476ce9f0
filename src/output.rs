//! Result types produced by an extraction run.

use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A rectangular grid of string cells under a header row.
///
/// An empty table (no header, no rows) is a valid terminal state for a page
/// whose answer could not be parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExtractedTable {
    /// A table with no header and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when there is neither a header nor any data row.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    /// Number of data rows (the header is not counted).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns, taken from the header row.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

/// What happened to one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageReport {
    /// 1-indexed page number.
    pub page_num: usize,
    /// CSV file written for this page. None only when the write itself failed.
    pub output_file: Option<PathBuf>,
    /// Rendered image width in pixels.
    pub width: u32,
    /// Rendered image height in pixels.
    pub height: u32,
    /// Data rows written (0 for an empty table).
    pub rows: usize,
    /// `usage.total_tokens` reported for the request, 0 when absent.
    pub tokens_used: u64,
    /// `usage.prompt_tokens`, when the endpoint reported it.
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    /// `usage.completion_tokens`, when the endpoint reported it.
    #[serde(default)]
    pub completion_tokens: Option<u64>,
    /// Estimated cost of this page in dollars.
    pub cost: f64,
    /// Wall-clock time spent on this page.
    pub duration_ms: u64,
    /// Set when any step of the page failed.
    pub error: Option<PageError>,
}

impl PageReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Totals for one document, plus the per-page reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Input document path.
    pub document: PathBuf,
    /// File stem used in output names.
    pub base_name: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages attempted (always equal to `total_pages` for a finished run).
    pub pages_processed: usize,
    /// Pages whose report carries an error.
    pub failed_pages: usize,
    /// Sum of `tokens_used` across pages.
    pub total_tokens: u64,
    /// Estimated cost of the whole document in dollars.
    pub total_cost: f64,
    /// Wall-clock time for the run, rendering included.
    pub duration_ms: u64,
    /// One entry per page, in page order.
    pub pages: Vec<PageReport>,
}

impl RunSummary {
    /// Paths of every CSV file written during the run.
    pub fn output_files(&self) -> Vec<&PathBuf> {
        self.pages
            .iter()
            .filter_map(|p| p.output_file.as_ref())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_has_no_shape() {
        let t = ExtractedTable::empty();
        assert!(t.is_empty());
        assert_eq!(t.row_count(), 0);
        assert_eq!(t.column_count(), 0);
    }

    #[test]
    fn header_only_table_is_not_empty() {
        let t = ExtractedTable {
            headers: vec!["a".into(), "b".into()],
            rows: vec![],
        };
        assert!(!t.is_empty());
        assert_eq!(t.column_count(), 2);
    }
}
