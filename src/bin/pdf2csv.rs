//! CLI binary for vision-table-extract.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};
use vision_table_extract::{
    extract_tables, ExtractionConfig, PageError, PageReport, RunObserver, RunSummary,
    TracingObserver,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: a live progress bar and one line per page, on top of
/// the tracing lines that go to the log file.
struct CliObserver {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    errors: AtomicUsize,
    log: TracingObserver,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Rendering");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
            log: TracingObserver,
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, page_num: usize) -> f64 {
        self.start_times
            .lock()
            .map(|mut m| m.remove(&page_num))
            .ok()
            .flatten()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl RunObserver for CliObserver {
    fn on_run_start(&self, base_name: &str, total_pages: usize) {
        self.log.on_run_start(base_name, total_pages);
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting tables from {total_pages} pages of \"{base_name}\"…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, report: &PageReport, total: usize) {
        self.log.on_page_complete(report, total);
        let secs = self.elapsed_secs(report.page_num);

        let mark = if report.is_success() { green("✓") } else { red("✗") };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<10}  {:<14}  {}",
            mark,
            report.page_num,
            total,
            dim(&format!("{:>4} rows", report.rows)),
            dim(&format!("{:>6} tokens", report.tokens_used)),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, error: &PageError, total: usize) {
        self.log.on_page_error(error, total);
        self.errors.fetch_add(1, Ordering::SeqCst);

        let text = error.to_string();
        let msg = if text.chars().count() > 80 {
            format!("{}\u{2026}", text.chars().take(79).collect::<String>())
        } else {
            text
        };
        self.bar.println(format!("      {}", red(&msg)));
    }

    fn on_run_complete(&self, summary: &RunSummary) {
        self.log.on_run_complete(summary);
        self.bar.finish_and_clear();

        let failed = self.errors.load(Ordering::SeqCst);
        let written = summary.output_files().len();
        let unwritten = summary.total_pages - written;
        if failed == 0 {
            eprintln!(
                "{} {} CSV files written",
                green("✔"),
                bold(&written.to_string())
            );
        } else {
            eprintln!(
                "{} {} CSV files written  ({} pages failed, {} files missing)",
                cyan("⚠"),
                bold(&written.to_string()),
                red(&failed.to_string()),
                red(&unwritten.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One CSV per page into ./tables
  pdf2csv statement.pdf -o tables

  # Lower resolution, cheaper requests
  pdf2csv --zoom 2 scan.pdf -o out

  # Different model and price for the cost estimate
  pdf2csv --model gpt-4o --price-per-1k 0.005 report.pdf

  # Machine-readable run summary
  pdf2csv --json report.pdf > summary.json

  # Keep an append-only log of every run
  pdf2csv --log-file process_logs.log report.pdf

OUTPUT:
  One file per page: vision_extracted_<pdf name>_page_<N>.csv
  Pages whose answer cannot be parsed as CSV get an empty file.

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          API key (prompted for when unset)
  PDF2CSV_ENDPOINT        Chat-completions URL
  PDF2CSV_MODEL           Model ID
  PDF2CSV_LOG_FILE        Append run logs to this file
  PDFIUM_LIB_PATH         Directory containing libpdfium
"#;

/// Extract tables from PDF pages to CSV using a vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2csv",
    version,
    about = "Extract tables from PDF pages to CSV using a vision LLM",
    long_about = "Render every page of a PDF, ask a vision language model for the page's \
tables as CSV, and write one CSV file per page. Token usage and an estimated cost are \
logged per page and per document.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Directory receiving the per-page CSV files.
    #[arg(short, long, env = "PDF2CSV_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// API key for the vision endpoint.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Chat-completions endpoint URL.
    #[arg(long, env = "PDF2CSV_ENDPOINT", default_value = vision_table_extract::config::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Vision model ID.
    #[arg(long, env = "PDF2CSV_MODEL", default_value = vision_table_extract::config::DEFAULT_MODEL)]
    model: String,

    /// Page magnification over 72 DPI.
    #[arg(long, env = "PDF2CSV_ZOOM", default_value_t = 4.0)]
    zoom: f32,

    /// Dollars per 1000 tokens for the cost estimate.
    #[arg(long, env = "PDF2CSV_PRICE_PER_1K", default_value_t = vision_table_extract::config::DEFAULT_PRICE_PER_1K_TOKENS)]
    price_per_1k: f64,

    /// Max completion tokens per page.
    #[arg(long, env = "PDF2CSV_MAX_TOKENS", default_value_t = 2000)]
    max_tokens: u32,

    /// Path to a text file replacing the default instruction.
    #[arg(long, env = "PDF2CSV_PROMPT")]
    prompt_file: Option<PathBuf>,

    /// Per-request timeout in seconds (default: none).
    #[arg(long, env = "PDF2CSV_TIMEOUT")]
    timeout: Option<u64>,

    /// Directory containing the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Append timestamped run logs to this file.
    #[arg(long, env = "PDF2CSV_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Print the run summary as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2CSV_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2CSV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2CSV_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO lines on stderr; the log file, when
    // requested, always receives them.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let stderr_level = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    let stderr_layer = fmt::layer().with_writer(io::stderr).with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(stderr_level)),
    );

    let file_layer = match cli.log_file {
        Some(ref path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            let level = if cli.verbose { "debug" } else { "info" };
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(EnvFilter::new(level)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let api_key = match cli.api_key {
        Some(ref key) if !key.is_empty() => key.clone(),
        _ => prompt_api_key()?,
    };

    let observer: Arc<dyn RunObserver> = if show_progress {
        CliObserver::new()
    } else {
        Arc::new(TracingObserver)
    };

    let config = build_config(&cli, api_key, observer).await?;

    // ── Run extraction ───────────────────────────────────────────────────
    let summary = extract_tables(&cli.input, &config)
        .await
        .context("Extraction failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "{}  {}/{} pages  {}ms  →  {}",
            if summary.failed_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            summary.total_pages - summary.failed_pages,
            summary.total_pages,
            summary.duration_ms,
            bold(&cli.output_dir.display().to_string()),
        );
        eprintln!(
            "   {} tokens  /  ${:.5} estimated",
            dim(&summary.total_tokens.to_string()),
            summary.total_cost,
        );
    }

    Ok(())
}

/// Ask for the key on stderr and read one line from stdin.
fn prompt_api_key() -> Result<String> {
    eprint!("Enter your OpenAI API key: ");
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read API key from stdin")?;
    let key = line.trim().to_string();
    if key.is_empty() {
        anyhow::bail!("An API key is required (set OPENAI_API_KEY or pass --api-key)");
    }
    Ok(key)
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(
    cli: &Cli,
    api_key: String,
    observer: Arc<dyn RunObserver>,
) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .api_key(api_key)
        .endpoint(cli.endpoint.clone())
        .model(cli.model.clone())
        .zoom_factor(cli.zoom)
        .price_per_1k_tokens(cli.price_per_1k)
        .max_tokens(cli.max_tokens)
        .output_dir(cli.output_dir.clone())
        .observer(observer);

    if let Some(ref path) = cli.prompt_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.instruction(text.trim().to_string());
    }
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if let Some(ref dir) = cli.pdfium_lib_path {
        builder = builder.pdfium_lib_path(dir.clone());
    }

    builder.build().context("Invalid configuration")
}
