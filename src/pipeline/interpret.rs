//! Response interpretation: envelope → (table outcome, token usage).
//!
//! The envelope is read twice, through two independent views. The content
//! view only knows `choices[0].message.content`; the usage view only knows
//! `usage`. A malformed `usage` therefore cannot cost us the table, and a
//! malformed `choices` cannot cost us the token count.
//!
//! Parse failures are values, not errors: [`TableOutcome::Empty`] carries
//! the reason and the caller still writes an (empty) file for the page.

use crate::error::PageError;
use crate::output::ExtractedTable;
use crate::pipeline::postprocess::clean_model_text;
use serde::Deserialize;
use tracing::debug;

/// Decoded envelope. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionResponse {
    /// Text of the first choice, if present.
    pub content: Option<String>,
    /// Usage block, if present and well-formed.
    pub usage: Option<Usage>,
}

/// Token accounting reported by the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    #[serde(default)]
    pub completion_tokens: Option<u64>,
    #[serde(default)]
    pub total_tokens: Option<u64>,
}

#[derive(Deserialize)]
struct ContentView {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct UsageView {
    #[serde(default)]
    usage: Option<Usage>,
}

impl CompletionResponse {
    /// Decode `body`. Fails only when the body is not a JSON object at all.
    pub fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        if !value.is_object() {
            return Err(<serde_json::Error as serde::de::Error>::custom(format!(
                "expected a JSON object, found {}",
                json_kind(&value)
            )));
        }

        let content = serde_json::from_value::<ContentView>(value.clone())
            .ok()
            .and_then(|v| v.choices.into_iter().next())
            .and_then(|c| c.message)
            .and_then(|m| m.content);

        let usage = serde_json::from_value::<UsageView>(value)
            .ok()
            .and_then(|v| v.usage);

        Ok(Self { content, usage })
    }

    /// `usage.total_tokens`, or 0 when absent.
    pub fn total_tokens(&self) -> u64 {
        self.usage
            .as_ref()
            .and_then(|u| u.total_tokens)
            .unwrap_or(0)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Result of reading a table out of the model's answer.
#[derive(Debug, Clone, PartialEq)]
pub enum TableOutcome {
    /// The answer parsed as CSV with a header row.
    Parsed(ExtractedTable),
    /// The page yields an empty table, for the given reason.
    Empty(PageError),
}

impl TableOutcome {
    /// The table to write: populated, or empty.
    pub fn table(&self) -> ExtractedTable {
        match self {
            TableOutcome::Parsed(t) => t.clone(),
            TableOutcome::Empty(_) => ExtractedTable::empty(),
        }
    }

    /// Why the page is empty, if it is.
    pub fn error(&self) -> Option<&PageError> {
        match self {
            TableOutcome::Parsed(_) => None,
            TableOutcome::Empty(e) => Some(e),
        }
    }
}

/// Everything the orchestrator needs from one response.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    pub outcome: TableOutcome,
    pub usage: Option<Usage>,
    pub tokens_used: u64,
}

/// Interpret a raw response body for page `page`.
pub fn interpret(page: usize, body: &str) -> Interpretation {
    let response = match CompletionResponse::from_body(body) {
        Ok(r) => r,
        Err(e) => {
            return Interpretation {
                outcome: TableOutcome::Empty(PageError::MalformedEnvelope {
                    page,
                    detail: e.to_string(),
                }),
                usage: None,
                tokens_used: 0,
            }
        }
    };

    let tokens_used = response.total_tokens();
    let outcome = match response.content {
        Some(ref text) => match parse_table(text) {
            Ok(table) => {
                debug!(
                    "Page {}: parsed {} columns × {} rows",
                    page,
                    table.column_count(),
                    table.row_count()
                );
                TableOutcome::Parsed(table)
            }
            Err(TableTextError::Blank) => TableOutcome::Empty(PageError::MissingContent { page }),
            Err(TableTextError::Csv(detail)) => {
                TableOutcome::Empty(PageError::TableParse { page, detail })
            }
        },
        None => TableOutcome::Empty(PageError::MissingContent { page }),
    };

    Interpretation {
        outcome,
        usage: response.usage,
        tokens_used,
    }
}

/// Why text could not become a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableTextError {
    /// Nothing left after cleanup.
    Blank,
    /// The CSV reader rejected the text.
    Csv(String),
}

/// Parse comma-delimited text whose first record is the header.
///
/// Every record must have as many fields as the header.
pub fn parse_table(text: &str) -> Result<ExtractedTable, TableTextError> {
    let cleaned = clean_model_text(text);
    if cleaned.trim().is_empty() {
        return Err(TableTextError::Blank);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(cleaned.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| TableTextError::Csv(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let rows = reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect::<Vec<_>>())
                .map_err(|e| TableTextError::Csv(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ExtractedTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(content: &str, tokens: Option<u64>) -> String {
        let mut v = json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        });
        if let Some(t) = tokens {
            v["usage"] = json!({"prompt_tokens": t - 10, "completion_tokens": 10, "total_tokens": t});
        }
        v.to_string()
    }

    #[test]
    fn well_formed_csv_keeps_header_and_rows() {
        let body = envelope("Item,Qty,Price\nApple,3,1.20\nPear,5,0.80", Some(1234));
        let result = interpret(1, &body);
        let table = match result.outcome {
            TableOutcome::Parsed(table) => table,
            other => panic!("expected a parsed table, got {other:?}"),
        };
        assert_eq!(table.headers, vec!["Item", "Qty", "Price"]);
        assert_eq!(
            table.rows,
            vec![vec!["Apple", "3", "1.20"], vec!["Pear", "5", "0.80"]]
        );
        assert_eq!(result.tokens_used, 1234);
    }

    #[test]
    fn mismatched_columns_yield_empty_table() {
        let body = envelope("a,b\n1,2,3\n4,5", Some(50));
        let result = interpret(4, &body);
        match result.outcome {
            TableOutcome::Empty(PageError::TableParse { page, .. }) => assert_eq!(page, 4),
            other => panic!("expected a parse failure, got {other:?}"),
        }
        assert!(result.outcome.table().is_empty());
        assert_eq!(result.tokens_used, 50);
    }

    #[test]
    fn missing_usage_counts_zero_tokens() {
        let body = envelope("a,b\n1,2", None);
        let result = interpret(1, &body);
        assert_eq!(result.tokens_used, 0);
        assert!(result.usage.is_none());
        assert!(matches!(result.outcome, TableOutcome::Parsed(_)));
    }

    #[test]
    fn malformed_usage_does_not_hide_table() {
        let body = json!({
            "choices": [{"message": {"content": "a,b\n1,2"}}],
            "usage": {"total_tokens": "many"}
        })
        .to_string();
        let result = interpret(1, &body);
        assert_eq!(result.tokens_used, 0);
        assert_eq!(result.outcome.table().rows, vec![vec!["1", "2"]]);
    }

    #[test]
    fn malformed_choices_do_not_hide_usage() {
        let body = json!({
            "choices": "not-a-list",
            "usage": {"total_tokens": 900}
        })
        .to_string();
        let result = interpret(2, &body);
        assert_eq!(result.tokens_used, 900);
        assert_eq!(
            result.outcome,
            TableOutcome::Empty(PageError::MissingContent { page: 2 })
        );
    }

    #[test]
    fn non_json_body_is_malformed_envelope() {
        let result = interpret(3, "<html>Bad Gateway</html>");
        assert!(matches!(
            result.outcome,
            TableOutcome::Empty(PageError::MalformedEnvelope { page: 3, .. })
        ));
        assert_eq!(result.tokens_used, 0);
    }

    #[test]
    fn json_array_is_malformed_envelope() {
        let result = interpret(1, "[1,2]");
        assert!(matches!(
            result.outcome,
            TableOutcome::Empty(PageError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn empty_choices_is_missing_content() {
        let body = json!({"choices": [], "usage": {"total_tokens": 12}}).to_string();
        let result = interpret(1, &body);
        assert_eq!(
            result.outcome,
            TableOutcome::Empty(PageError::MissingContent { page: 1 })
        );
        assert_eq!(result.tokens_used, 12);
    }

    #[test]
    fn blank_content_is_missing_content() {
        let result = interpret(1, &envelope("   \n", Some(20)));
        assert_eq!(
            result.outcome,
            TableOutcome::Empty(PageError::MissingContent { page: 1 })
        );
    }

    #[test]
    fn fenced_csv_is_unwrapped() {
        let result = interpret(1, &envelope("```csv\nx,y\n1,2\n```", Some(20)));
        let table = result.outcome.table();
        assert_eq!(table.headers, vec!["x", "y"]);
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn quoted_cells_keep_commas() {
        let table = parse_table("Name,Address\n\"Doe, J\",\"1 Main St, Apt 2\"").unwrap();
        assert_eq!(table.rows[0], vec!["Doe, J", "1 Main St, Apt 2"]);
    }

    #[test]
    fn header_only_is_a_zero_row_table() {
        let table = parse_table("a,b,c").unwrap();
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn joiners_in_cells_survive_parsing() {
        let table = parse_table("word,emoji\nمی\u{200C}خواهم,👨\u{200D}👩\u{200D}👧").unwrap();
        assert_eq!(
            table.rows[0],
            vec!["می\u{200C}خواهم", "👨\u{200D}👩\u{200D}👧"]
        );
    }

    #[test]
    fn crlf_answer_keeps_quoted_line_breaks() {
        let table = parse_table("a,b\r\n\"line1\r\nline2\",x\r\n").unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec!["line1\r\nline2", "x"]]);
    }
}
