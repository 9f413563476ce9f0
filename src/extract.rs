//! Pipeline orchestration: one document in, one CSV per page out.
//!
//! ```text
//! Start → Rendering → (Encoding → Requesting → Interpreting → Writing → Cleanup)* → Summarizing → Done
//! ```
//!
//! Only document-level failures (missing file, not a PDF, pdfium cannot
//! open it, output directory unavailable) end the run with `Err`. Every
//! page-level failure is recorded in that page's [`PageReport`], an empty
//! CSV is written in its place, and the loop moves to the next page. A
//! finished run therefore always leaves exactly one file per page.
//!
//! Pages are processed strictly one after another; the next request is not
//! sent until the previous page's file is on disk.

use crate::config::ExtractionConfig;
use crate::error::{ExtractError, PageError};
use crate::output::{ExtractedTable, PageReport, RunSummary};
use crate::pipeline::client::{CompletionRequest, HttpVisionClient, VisionClient};
use crate::pipeline::cost::CostLedger;
use crate::pipeline::render::{Page, PageRenderer, PdfiumRenderer};
use crate::pipeline::{encode, input, interpret, write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Reusable orchestrator: configuration plus the two I/O seams.
pub struct TableExtractor {
    config: ExtractionConfig,
    renderer: Arc<dyn PageRenderer>,
    client: Arc<dyn VisionClient>,
}

impl TableExtractor {
    /// pdfium renderer and HTTP client built from `config`.
    pub fn new(config: ExtractionConfig) -> Result<Self, ExtractError> {
        let client = HttpVisionClient::new(&config)?;
        let renderer = PdfiumRenderer::new(config.pdfium_lib_path.clone());
        Ok(Self::with_components(
            config,
            Arc::new(renderer),
            Arc::new(client),
        ))
    }

    /// Caller-supplied renderer and client.
    pub fn with_components(
        config: ExtractionConfig,
        renderer: Arc<dyn PageRenderer>,
        client: Arc<dyn VisionClient>,
    ) -> Self {
        Self {
            config,
            renderer,
            client,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Process every page of `pdf_path` and return the run totals.
    ///
    /// # Errors
    /// Returns `Err(ExtractError)` only for document-level failures. Page
    /// failures are reported in [`RunSummary::pages`].
    pub async fn run(&self, pdf_path: impl AsRef<Path>) -> Result<RunSummary, ExtractError> {
        let started = Instant::now();
        let observer = self.config.resolve_observer();

        // ── Validate input and output ────────────────────────────────────
        let pdf_path = input::validate_pdf(pdf_path.as_ref())?;
        let base_name = input::document_base_name(&pdf_path);
        prepare_output_dir(&self.config.output_dir)?;
        info!("Starting extraction: {}", pdf_path.display());

        // ── Render ───────────────────────────────────────────────────────
        let render_start = Instant::now();
        let renderer = Arc::clone(&self.renderer);
        let path = pdf_path.clone();
        let zoom = self.config.zoom_factor;
        let pages = tokio::task::spawn_blocking(move || renderer.render(&path, zoom))
            .await
            .map_err(|e| ExtractError::Internal(format!("Render task panicked: {}", e)))??;
        let total_pages = pages.len();
        info!(
            "Rendered {} pages in {}ms",
            total_pages,
            render_start.elapsed().as_millis()
        );

        observer.on_run_start(&base_name, total_pages);

        // ── Per page ─────────────────────────────────────────────────────
        let mut ledger = CostLedger::new(self.config.price_per_1k_tokens);
        let mut reports = Vec::with_capacity(total_pages);

        for page in pages {
            observer.on_page_start(page.index, total_pages);
            let report = self.process_page(&page, &base_name, &mut ledger).await;

            // The page's file is on disk; release its image now.
            let artifact = page.artifact_path().to_path_buf();
            if let Err(e) = page.artifact.close() {
                warn!("Page {}: could not remove {}: {}", report.page_num, artifact.display(), e);
            }

            observer.on_page_complete(&report, total_pages);
            if let Some(ref e) = report.error {
                observer.on_page_error(e, total_pages);
            }
            reports.push(report);
        }

        // ── Summarise ────────────────────────────────────────────────────
        let summary = RunSummary {
            document: pdf_path,
            base_name,
            model: self.config.model.clone(),
            total_pages,
            pages_processed: ledger.pages(),
            failed_pages: reports.iter().filter(|r| !r.is_success()).count(),
            total_tokens: ledger.total_tokens(),
            total_cost: ledger.total_cost(),
            duration_ms: started.elapsed().as_millis() as u64,
            pages: reports,
        };

        observer.on_run_complete(&summary);
        Ok(summary)
    }

    /// Encode → request → interpret → write → account for one page.
    ///
    /// Never fails: every error becomes part of the report and an empty
    /// table is written instead.
    async fn process_page(
        &self,
        page: &Page,
        base_name: &str,
        ledger: &mut CostLedger,
    ) -> PageReport {
        let start = Instant::now();
        let page_num = page.index;

        let (table, tokens_used, usage, mut error) = match self.request_table(page).await {
            Ok(interpretation) => {
                let table = interpretation.outcome.table();
                let error = interpretation.outcome.error().cloned();
                (table, interpretation.tokens_used, interpretation.usage, error)
            }
            Err(e) => (ExtractedTable::empty(), 0, None, Some(e)),
        };

        let path = write::output_path(&self.config.output_dir, base_name, page_num);
        let output_file = match write::write_table(&path, &table) {
            Ok(()) => Some(path),
            Err(e) => {
                error = Some(PageError::OutputWrite {
                    page: page_num,
                    path,
                    detail: e.to_string(),
                    earlier: error.take().map(Box::new),
                });
                None
            }
        };

        let cost = ledger.record(tokens_used);
        debug!(
            "Page {}: {} rows, {} tokens, ${:.5}",
            page_num,
            table.row_count(),
            tokens_used,
            cost
        );

        PageReport {
            page_num,
            output_file,
            width: page.width,
            height: page.height,
            rows: table.row_count(),
            tokens_used,
            prompt_tokens: usage.as_ref().and_then(|u| u.prompt_tokens),
            completion_tokens: usage.as_ref().and_then(|u| u.completion_tokens),
            cost,
            duration_ms: start.elapsed().as_millis() as u64,
            error,
        }
    }

    /// Steps that can fail before there is a response to interpret.
    async fn request_table(&self, page: &Page) -> Result<interpret::Interpretation, PageError> {
        let page_num = page.index;

        let image_b64 =
            encode::encode_artifact(page.artifact_path()).map_err(|e| PageError::ArtifactRead {
                page: page_num,
                detail: e.to_string(),
            })?;

        let request = CompletionRequest::for_page(
            &self.config.model,
            self.config.instruction_text(),
            &image_b64,
            self.config.max_tokens,
        );

        let response = self
            .client
            .complete(&request)
            .await
            .map_err(|error| PageError::Transport {
                page: page_num,
                error,
            })?;
        debug!("Page {}: HTTP {}", page_num, response.status);

        Ok(interpret::interpret(page_num, &response.body))
    }
}

fn prepare_output_dir(dir: &Path) -> Result<(), ExtractError> {
    std::fs::create_dir_all(dir).map_err(|source| ExtractError::OutputDirUnavailable {
        path: dir.to_path_buf(),
        source,
    })
}

/// Extract every page of `pdf_path` to CSV with the default pdfium renderer
/// and HTTP client.
///
/// This is the primary entry point for the library.
///
/// # Example
/// ```rust,no_run
/// use vision_table_extract::{extract_tables, ExtractionConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ExtractionConfig::builder()
///         .api_key(std::env::var("OPENAI_API_KEY")?)
///         .output_dir("tables")
///         .build()?;
///     let summary = extract_tables("statement.pdf", &config).await?;
///     eprintln!("{} pages, ${:.5}", summary.total_pages, summary.total_cost);
///     Ok(())
/// }
/// ```
pub async fn extract_tables(
    pdf_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<RunSummary, ExtractError> {
    TableExtractor::new(config.clone())?.run(pdf_path).await
}

/// Synchronous wrapper around [`extract_tables`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_tables_sync(
    pdf_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<RunSummary, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_tables(pdf_path, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_dir_is_created() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a/b/c");
        prepare_output_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn output_dir_over_a_file_is_fatal() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = prepare_output_dir(&file.path().join("sub")).unwrap_err();
        assert!(matches!(err, ExtractError::OutputDirUnavailable { .. }));
    }
}
