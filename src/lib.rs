//! # vision-table-extract
//!
//! Extract tables from PDF pages into CSV files using a vision language model.
//!
//! ## Why this crate?
//!
//! Scanned statements, rendered reports and image-only PDFs carry tables that
//! text extractors cannot see. This crate rasterises each page, hands the
//! image to a vision model with a fixed "answer in CSV" instruction, and
//! writes whatever comes back as one CSV file per page. The result is an
//! approximate, quick digitisation, not a layout-analysis engine.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Render     rasterise every page via pdfium at zoom × 72 DPI
//!  ├─ 2. Encode     PNG → base64 data URI
//!  ├─ 3. Request    one chat-completions call per page, sequentially
//!  ├─ 4. Interpret  answer text → CSV table, usage → token count
//!  ├─ 5. Write      vision_extracted_<name>_page_<N>.csv
//!  └─ 6. Account    running tokens and estimated cost
//! ```
//!
//! A page whose request or parse fails still gets a (empty) CSV file, so a
//! document with N pages always produces N files.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vision_table_extract::{extract_tables, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder()
//!         .api_key(std::env::var("OPENAI_API_KEY")?)
//!         .output_dir("tables")
//!         .build()?;
//!     let summary = extract_tables("invoice.pdf", &config).await?;
//!     eprintln!("tokens: {}  cost: ${:.5}", summary.total_tokens, summary.total_cost);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2csv` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod observer;
pub mod output;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{ExtractError, PageError, TransportError};
pub use extract::{extract_tables, extract_tables_sync, TableExtractor};
pub use observer::{NoopObserver, RunObserver, SharedObserver, TracingObserver};
pub use output::{ExtractedTable, PageReport, RunSummary};
pub use pipeline::client::{CompletionRequest, HttpVisionClient, RawResponse, VisionClient};
pub use pipeline::render::{Page, PageRenderer, PdfiumRenderer};
