//! Pipeline stages for PDF-to-CSV table extraction.
//!
//! Each submodule implements exactly one step; [`crate::extract`] sequences
//! them per page.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ client ──▶ interpret ──▶ write
//! (path)    (pdfium)   (base64)   (HTTP)     (CSV parse)   (file)
//!                                               │
//!                                             cost
//! ```
//!
//! 1. [`input`]  — validate the document path and derive its base name
//! 2. [`render`] — rasterise every page to a temp PNG; blocking, so it runs
//!    in `spawn_blocking`
//! 3. [`encode`] — base64 the PNG bytes for the JSON request body
//! 4. [`client`] — one chat-completions call per page; the only stage with
//!    network I/O
//! 5. [`interpret`] — pull the answer text and token usage out of the
//!    envelope and parse the text as CSV, cleaned by [`postprocess`]
//! 6. [`write`]  — one CSV file per page
//! 7. [`cost`]   — running token and dollar totals

pub mod client;
pub mod cost;
pub mod encode;
pub mod input;
pub mod interpret;
pub mod postprocess;
pub mod render;
pub mod write;
