//! Instruction text sent alongside every page image.
//!
//! Callers can override the default via
//! [`crate::config::ExtractionConfig::instruction`]; the constant here is used
//! only when no override is provided.

/// Default instruction asking the model for a bare CSV rendition of the page's tables.
pub const DEFAULT_EXTRACTION_PROMPT: &str = "Extract information from the tables in the image and return structured table output as a csv. Consider that there can be hierarchical relationships in the tables. Please return only the output, and no other sentences. Don't include '```csv' in the output's beginning.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_asks_for_bare_csv() {
        assert!(DEFAULT_EXTRACTION_PROMPT.contains("csv"));
        assert!(DEFAULT_EXTRACTION_PROMPT.contains("only the output"));
    }
}
