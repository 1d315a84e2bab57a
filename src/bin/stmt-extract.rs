//! CLI binary for edgequake-statement.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig`, runs the batch, and prints or exports records.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_statement::export::{render_table, write_csv_file, DEFAULT_CSV_NAME};
use edgequake_statement::{
    Document, ExtractionConfig, ExtractionProgressCallback, PageSelectionPolicy,
    ProgressCallback, StatementExtractor,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

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

const TICKS: [&str; 11] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch, one log line per file.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&TICKS);

        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting {total} statements…"))
        ));
    }

    fn on_document_start(&self, _index: usize, _total: usize, filename: &str) {
        if let Ok(mut t) = self.started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(format!("Processing {filename}…"));
    }

    fn on_document_complete(&self, index: usize, total: usize, filename: &str) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index + 1,
            total,
            filename,
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, filename: &str, error: &str) {
        let secs = self.elapsed_secs();

        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            red("✗"),
            index + 1,
            total,
            filename,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let failed = total.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} statements extracted",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} statements extracted  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract a batch and print a table
  stmt-extract jan.pdf feb.pdf mar.pdf

  # Also save the results as CSV (parsed_statements.csv, or a path of your choice)
  stmt-extract --csv statements/*.pdf
  stmt-extract --csv=march.csv march.pdf

  # JSON lines for scripting
  stmt-extract --json march.pdf | jq .

  # A bigger local model with a longer timeout and one retry
  stmt-extract --model llama3.2:3b --timeout 300 --max-retries 1 march.pdf

SETUP:
  1. Install Ollama and pull a model:   ollama pull llama3.2:1b
  2. Make libpdfium available (PDFIUM_LIB_PATH, --pdfium-lib, or the
     working directory).
  3. Run:                               stmt-extract statement.pdf

ENVIRONMENT VARIABLES:
  STATEMENT_MODEL       Model name (default llama3.2:1b)
  STATEMENT_ENDPOINT    Generate endpoint (default http://localhost:11434/api/generate)
  PDFIUM_LIB_PATH       Path to libpdfium or its directory
  RUST_LOG              Override log filter
"#;

/// Extract issuer, account, dates and balance from statement PDFs with a local LLM.
#[derive(Parser, Debug)]
#[command(
    name = "stmt-extract",
    version,
    about = "Extract structured facts from credit-card statement PDFs with a local LLM",
    long_about = "Reads the header pages of each statement PDF, asks a locally hosted model \
(Ollama by default) for issuer, account suffix, statement date, due date and total balance, \
and checks the issuer against the statement text. Nothing leaves the machine.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Statement PDFs, processed in the given order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Local model name.
    #[arg(long, env = "STATEMENT_MODEL", default_value = edgequake_statement::config::DEFAULT_MODEL)]
    model: String,

    /// Generate endpoint of the local model service.
    #[arg(long, env = "STATEMENT_ENDPOINT", default_value = edgequake_statement::config::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Per-request timeout in seconds (0 waits indefinitely).
    #[arg(long, env = "STATEMENT_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Retries after a transport failure.
    #[arg(long, env = "STATEMENT_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Page-1 text shorter than this pulls in the next page.
    #[arg(long, default_value_t = edgequake_statement::config::MIN_HEADER_CHARS)]
    min_page_chars: usize,

    /// Maximum leading pages read per statement.
    #[arg(long, default_value_t = edgequake_statement::config::MAX_HEADER_PAGES)]
    max_pages: usize,

    /// Path to libpdfium (file or directory).
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Also write results as CSV (`--csv` alone writes parsed_statements.csv).
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = DEFAULT_CSV_NAME
    )]
    csv: Option<PathBuf>,

    /// Print one JSON object per statement instead of a table.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "STATEMENT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;
    let extractor = StatementExtractor::new(config).context("Failed to set up extractor")?;

    let documents: Vec<Document> = cli.inputs.iter().cloned().map(Document::from_path).collect();
    let records = extractor.extract_batch(&documents).await;

    // ── Output ───────────────────────────────────────────────────────────
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if cli.json {
        for record in &records {
            let line = serde_json::to_string(record).context("Failed to serialise record")?;
            writeln!(handle, "{line}").context("Failed to write to stdout")?;
        }
    } else {
        handle
            .write_all(render_table(&records).as_bytes())
            .context("Failed to write to stdout")?;
    }

    if let Some(ref path) = cli.csv {
        write_csv_file(&records, path).context("CSV export failed")?;
        if !cli.quiet {
            eprintln!("{}  CSV  →  {}", green("✔"), bold(&path.display().to_string()));
        }
    }

    if !cli.quiet && !show_progress {
        let ok = records.iter().filter(|r| r.is_success()).count();
        eprintln!("Extracted {}/{} statements", ok, records.len());
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .model(&cli.model)
        .endpoint(&cli.endpoint)
        .max_retries(cli.max_retries)
        .page_policy(PageSelectionPolicy {
            min_chars: cli.min_page_chars,
            max_pages: cli.max_pages,
        });

    builder = if cli.timeout == 0 {
        builder.no_request_timeout()
    } else {
        builder.request_timeout_secs(cli.timeout)
    };

    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_flag_alone_uses_default_name() {
        let cli = Cli::try_parse_from(["stmt-extract", "--csv", "a.pdf", "b.pdf"]).unwrap();
        assert_eq!(cli.csv, Some(PathBuf::from(DEFAULT_CSV_NAME)));
        assert_eq!(cli.inputs, vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
    }

    #[test]
    fn csv_flag_takes_explicit_path() {
        let cli = Cli::try_parse_from(["stmt-extract", "--csv=out/march.csv", "a.pdf"]).unwrap();
        assert_eq!(cli.csv, Some(PathBuf::from("out/march.csv")));
    }

    #[test]
    fn csv_is_off_by_default() {
        let cli = Cli::try_parse_from(["stmt-extract", "a.pdf"]).unwrap();
        assert_eq!(cli.csv, None);
    }
}
