//! Configuration for a PDF table-extraction run.
//!
//! All run behaviour is controlled through [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. The orchestrator takes the whole struct so a
//! test can drive a run with explicit values and no interactive input.

use crate::error::ExtractError;
use crate::observer::{SharedObserver, TracingObserver};
use crate::prompts::DEFAULT_EXTRACTION_PROMPT;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Chat-completions endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Vision model identifier used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4-vision-preview";

/// Estimated price in dollars per 1000 tokens.
pub const DEFAULT_PRICE_PER_1K_TOKENS: f64 = 0.01;

/// Configuration for a table-extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use vision_table_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .api_key("sk-test")
///     .zoom_factor(2.0)
///     .output_dir("out")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 2000);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Bearer credential for the vision endpoint. Passed through unvalidated.
    pub api_key: String,

    /// Chat-completions URL. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Model identifier sent in every request. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Completion cap per page. Default: 2000.
    pub max_tokens: u32,

    /// Magnification applied to the native 72 DPI page size. Default: 4.0.
    ///
    /// A US-letter page at 4.0 renders to 2448 × 3168 px.
    pub zoom_factor: f32,

    /// Dollars per 1000 tokens used for the cost estimate. Default: 0.01.
    pub price_per_1k_tokens: f64,

    /// Custom instruction text. If None, uses [`DEFAULT_EXTRACTION_PROMPT`].
    pub instruction: Option<String>,

    /// Directory receiving one CSV per page. Created if missing. Default: `.`.
    pub output_dir: PathBuf,

    /// Whole-request timeout. None leaves the HTTP client default in place.
    pub request_timeout_secs: Option<u64>,

    /// Directory holding the pdfium shared library.
    ///
    /// If None, the library next to the executable is tried first, then the
    /// system library search path.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Run sink. If None, [`TracingObserver`] is used.
    pub observer: Option<SharedObserver>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 2000,
            zoom_factor: 4.0,
            price_per_1k_tokens: DEFAULT_PRICE_PER_1K_TOKENS,
            instruction: None,
            output_dir: PathBuf::from("."),
            request_timeout_secs: None,
            pdfium_lib_path: None,
            observer: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("api_key", &redact(&self.api_key))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("zoom_factor", &self.zoom_factor)
            .field("price_per_1k_tokens", &self.price_per_1k_tokens)
            .field("instruction", &self.instruction)
            .field("output_dir", &self.output_dir)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn RunObserver>"))
            .finish()
    }
}

fn redact(key: &str) -> &'static str {
    if key.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The instruction actually sent with each page.
    pub fn instruction_text(&self) -> &str {
        self.instruction
            .as_deref()
            .unwrap_or(DEFAULT_EXTRACTION_PROMPT)
    }

    /// The configured sink, or a fresh [`TracingObserver`].
    pub fn resolve_observer(&self) -> SharedObserver {
        match self.observer {
            Some(ref observer) => Arc::clone(observer),
            None => Arc::new(TracingObserver),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n.max(1);
        self
    }

    pub fn zoom_factor(mut self, factor: f32) -> Self {
        self.config.zoom_factor = factor;
        self
    }

    pub fn price_per_1k_tokens(mut self, price: f64) -> Self {
        self.config.price_per_1k_tokens = price;
        self
    }

    pub fn instruction(mut self, text: impl Into<String>) -> Self {
        self.config.instruction = Some(text.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs.max(1));
        self
    }

    pub fn pdfium_lib_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(dir.into());
        self
    }

    pub fn observer(mut self, observer: SharedObserver) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if !c.zoom_factor.is_finite() || c.zoom_factor <= 0.0 {
            return Err(ExtractError::InvalidConfig(format!(
                "zoom factor must be a positive number, got {}",
                c.zoom_factor
            )));
        }
        if !c.price_per_1k_tokens.is_finite() || c.price_per_1k_tokens < 0.0 {
            return Err(ExtractError::InvalidConfig(format!(
                "price per 1k tokens must be ≥ 0, got {}",
                c.price_per_1k_tokens
            )));
        }
        if !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://")) {
            return Err(ExtractError::InvalidConfig(format!(
                "endpoint must be an HTTP(S) URL, got '{}'",
                c.endpoint
            )));
        }
        if c.model.trim().is_empty() {
            return Err(ExtractError::InvalidConfig("model must not be empty".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ExtractionConfig::default();
        assert_eq!(config.model, "gpt-4-vision-preview");
        assert_eq!(config.max_tokens, 2000);
        assert_eq!(config.zoom_factor, 4.0);
        assert_eq!(config.price_per_1k_tokens, 0.01);
        assert!(config.request_timeout_secs.is_none());
        assert_eq!(config.instruction_text(), DEFAULT_EXTRACTION_PROMPT);
    }

    #[test]
    fn rejects_non_positive_zoom() {
        for zoom in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let err = ExtractionConfig::builder().zoom_factor(zoom).build();
            assert!(matches!(err, Err(ExtractError::InvalidConfig(_))), "zoom {zoom}");
        }
    }

    #[test]
    fn rejects_negative_price() {
        let err = ExtractionConfig::builder().price_per_1k_tokens(-0.5).build();
        assert!(matches!(err, Err(ExtractError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let err = ExtractionConfig::builder().endpoint("ftp://x").build();
        assert!(matches!(err, Err(ExtractError::InvalidConfig(_))));
    }

    #[test]
    fn custom_instruction_wins() {
        let config = ExtractionConfig::builder()
            .instruction("list every table")
            .build()
            .unwrap();
        assert_eq!(config.instruction_text(), "list every table");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ExtractionConfig::builder()
            .api_key("sk-very-secret")
            .build()
            .unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-very-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
