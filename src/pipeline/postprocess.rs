//! Post-processing: deterministic cleanup of model text before CSV parsing.
//!
//! Even when told not to, vision models occasionally wrap the answer in a
//! ` ```csv ... ``` ` fence or lead with a byte-order mark. Neither is table
//! content, and each one would either break the parser or leak into the
//! first header cell.
//!
//! Cell text is never touched: no per-line trimming, no quote rewriting, no
//! line-ending rewriting (the CSV reader accepts `\n`, `\r` and `\r\n`), and
//! joiners such as ZWNJ/ZWJ inside cells survive.
//!
//! ## Rule Order
//!
//! The leading-invisible rule runs before and after fence stripping, since a
//! BOM can sit in front of the fence or right after its opening line.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to the raw model answer.
///
/// 1. Strip invisible characters before the first visible one (BOM,
///    zero-width space, word joiner)
/// 2. Strip an outer code fence with any language tag
/// 3. Drop leading and trailing blank lines
pub fn clean_model_text(input: &str) -> String {
    let s = strip_leading_invisible(input);
    let s = strip_code_fences(s);
    let s = strip_leading_invisible(&s);
    trim_blank_lines(s)
}

// ── Rule 1: Leading invisible Unicode ───────────────────────────────────────

/// Only these are stripped, and only at the very start. ZWNJ (U+200C) and
/// ZWJ (U+200D) are part of the text and stay wherever they are.
const LEADING_INVISIBLE: [char; 3] = ['\u{FEFF}', '\u{200B}', '\u{2060}'];

fn strip_leading_invisible(input: &str) -> &str {
    input.trim_start_matches(LEADING_INVISIBLE)
}

// ── Rule 2: Strip outer code fences ─────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)(?:\r?\n)?```\s*$").unwrap()
});

fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 3: Trim surrounding blank lines ────────────────────────────────────

fn trim_blank_lines(input: &str) -> String {
    input.trim_matches(['\n', '\r']).to_string()
}
