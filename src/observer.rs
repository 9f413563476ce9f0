//! Run sink: per-page and per-document events from the orchestrator.
//!
//! Inject an [`Arc<dyn RunObserver>`] via
//! [`crate::config::ExtractionConfigBuilder::observer`] to receive events as
//! the pipeline processes each page. Tests capture events with their own
//! implementation instead of inspecting a global logger. When nothing is
//! injected the pipeline reports through [`TracingObserver`].
//!
//! # Example
//!
//! ```rust
//! use vision_table_extract::{ExtractionConfig, PageReport, RunObserver};
//! use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
//!
//! struct TokenCounter {
//!     tokens: AtomicU64,
//! }
//!
//! impl RunObserver for TokenCounter {
//!     fn on_page_complete(&self, report: &PageReport, _total_pages: usize) {
//!         self.tokens.fetch_add(report.tokens_used, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(TokenCounter { tokens: AtomicU64::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .observer(counter as Arc<dyn RunObserver>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::PageError;
use crate::output::{PageReport, RunSummary};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Called by the orchestrator as it processes a document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait RunObserver: Send + Sync {
    /// Called once after rendering, before the first request.
    fn on_run_start(&self, base_name: &str, total_pages: usize) {
        let _ = (base_name, total_pages);
    }

    /// Called just before a page's image is encoded and sent.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called for every page once its CSV is written, failed or not.
    fn on_page_complete(&self, report: &PageReport, total_pages: usize) {
        let _ = (report, total_pages);
    }

    /// Called in addition to `on_page_complete` when the page carries an error.
    fn on_page_error(&self, error: &PageError, total_pages: usize) {
        let _ = (error, total_pages);
    }

    /// Called once after every page has been attempted.
    fn on_run_complete(&self, summary: &RunSummary) {
        let _ = summary;
    }
}

/// A no-op implementation for callers that want silence.
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Reports through `tracing` with the line formats operators grep for.
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_run_start(&self, base_name: &str, total_pages: usize) {
        info!("Processing \"{}\": {} pages", base_name, total_pages);
    }

    fn on_page_complete(&self, report: &PageReport, _total_pages: usize) {
        let Some(ref file) = report.output_file else {
            // Tokens were still spent on this page.
            warn!(
                "No CSV file written for page {}, Image resolution: {}x{}, Tokens used: {}, Cost: ${:.5}",
                report.page_num, report.width, report.height, report.tokens_used, report.cost
            );
            return;
        };
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!(
            "CSV file {} created for page {}, Image resolution: {}x{}, Tokens used: {}, Cost: ${:.5}",
            name, report.page_num, report.width, report.height, report.tokens_used, report.cost
        );
    }

    fn on_page_error(&self, page_error: &PageError, total_pages: usize) {
        match page_error {
            PageError::TableParse { .. } | PageError::MissingContent { .. } => {
                error!("{}", page_error)
            }
            PageError::OutputWrite {
                earlier: Some(earlier),
                ..
            } => {
                warn!("{}", page_error);
                self.on_page_error(earlier, total_pages);
            }
            _ => warn!("{}", page_error),
        }
    }

    fn on_run_complete(&self, summary: &RunSummary) {
        info!(
            "Pdf processed. Used Model: {}, Total Tokens used: {}, Total Estimated cost for \"{}\": ${:.5}",
            summary.model, summary.total_tokens, summary.base_name, summary.total_cost
        );
    }
}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type SharedObserver = Arc<dyn RunObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingObserver {
        pages: AtomicUsize,
        errors: AtomicUsize,
    }

    impl RunObserver for CountingObserver {
        fn on_page_complete(&self, _report: &PageReport, _total: usize) {
            self.pages.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_error(&self, _error: &PageError, _total: usize) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn report(page_num: usize) -> PageReport {
        PageReport {
            page_num,
            output_file: Some(format!("vision_extracted_doc_page_{page_num}.csv").into()),
            width: 100,
            height: 200,
            rows: 2,
            tokens_used: 1000,
            prompt_tokens: Some(900),
            completion_tokens: Some(100),
            cost: 0.01,
            duration_ms: 5,
            error: None,
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let o = NoopObserver;
        o.on_run_start("doc", 2);
        o.on_page_start(1, 2);
        o.on_page_complete(&report(1), 2);
        o.on_page_error(&PageError::MissingContent { page: 2 }, 2);
    }

    #[test]
    fn tracing_observer_handles_missing_file() {
        let mut r = report(1);
        r.output_file = None;
        TracingObserver.on_page_complete(&r, 1);
    }

    #[test]
    fn tracing_observer_reports_write_failure_with_cause() {
        let e = PageError::OutputWrite {
            page: 1,
            path: "out/doc.csv".into(),
            detail: "is a directory".into(),
            earlier: Some(Box::new(PageError::TableParse {
                page: 1,
                detail: "unequal lengths".into(),
            })),
        };
        TracingObserver.on_page_error(&e, 1);
    }

    #[test]
    fn counting_observer_through_arc() {
        let counter = Arc::new(CountingObserver {
            pages: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        });
        let shared: SharedObserver = counter.clone();
        shared.on_page_complete(&report(1), 2);
        shared.on_page_complete(&report(2), 2);
        shared.on_page_error(&PageError::MissingContent { page: 2 }, 2);
        assert_eq!(counter.pages.load(Ordering::SeqCst), 2);
        assert_eq!(counter.errors.load(Ordering::SeqCst), 1);
    }
}
