//! CLI binary for traduja.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `TranslationConfig` and writes results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use traduja::pipeline::input::read_text;
use traduja::{
    extract_markdown, output_file_name, source_stem, translate_markdown, translate_pdf,
    write_outputs, Language, PageSeparator, ProgressCallback, TokenLedger, TranslationConfig,
    TranslationOutput, TranslationProgressCallback,
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner while OCR runs, then a line counter with the
/// running cost in the message slot.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new(prefix: &str, message: &str) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix(prefix.to_string());
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} lines  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Translating");
        self.bar.set_message("$0.0000");
        self.bar.reset_eta();
    }
}

impl TranslationProgressCallback for CliProgressCallback {
    fn on_translation_start(&self, total_lines: usize) {
        self.activate_bar(total_lines);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Translating {total_lines} lines…"))
        ));
    }

    fn on_line_complete(&self, lines_completed: usize, _total_lines: usize) {
        self.bar.set_position(lines_completed as u64);
    }

    fn on_token_update(&self, ledger: &TokenLedger) {
        self.bar.set_message(format!("${:.4}", ledger.total_cost));
    }

    fn on_translation_complete(&self, total_lines: usize, model_calls: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} lines translated  {}",
            green("✔"),
            bold(&total_lines.to_string()),
            dim(&format!("({model_calls} model calls)")),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Translate a PDF to Portuguese (stdout)
  traduja paper.pdf

  # English to French, write paper.md, paper_fr.md and paper_fr.html
  traduja --target fr --html -o out/ paper.pdf

  # Translate from a URL with a specific model
  traduja --model gpt-4.1-mini https://arxiv.org/pdf/1706.03762

  # Translate existing markdown (no OCR)
  traduja --from-markdown notes.md --target de

  # OCR only: print the extracted markdown
  traduja --ocr-only scan.pdf

  # Structured JSON with ledger and stats
  traduja --json paper.pdf > result.json

HOW IT WORKS:
  1. The PDF is sent to Mistral OCR, which returns markdown per page.
  2. Every non-blank line is translated on its own, with up to 3
     already-translated lines before it and 3 untranslated lines after it
     as context. Blank lines are copied through.
  3. The translated document has exactly as many lines as the source.

ENVIRONMENT VARIABLES:
  MISTRAL_API_KEY         Mistral OCR API key (required for PDF input)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
"#;

/// Translate PDF documents line by line with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "traduja",
    version,
    about = "Translate PDF documents line by line with an LLM",
    long_about = "Extract a PDF (local file or URL) to Markdown with Mistral OCR, then \
translate it line by line with an LLM, keeping the document's structure and line count. \
Supports OpenAI, Anthropic, Google Gemini, Ollama and any OpenAI-compatible endpoint.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL (a markdown file with --from-markdown).
    #[arg(required_unless_present = "list_languages")]
    input: Option<String>,

    /// Treat the input as a markdown file and skip OCR.
    #[arg(long, env = "TRADUJA_FROM_MARKDOWN")]
    from_markdown: bool,

    /// Source language code.
    #[arg(short, long, env = "TRADUJA_SOURCE", default_value = "en")]
    source: String,

    /// Target language code.
    #[arg(short, long, env = "TRADUJA_TARGET", default_value = "pt")]
    target: String,

    /// LLM model ID (e.g. gpt-4o-mini, gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(
        long,
        env = "EDGEQUAKE_MODEL",
        long_help = "LLM model to use. Default: gpt-4o-mini-2024-07-18 ($0.15/$0.60 per 1M tokens)."
    )]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Write `{stem}.md` and `{stem}_{target}.md` into this directory instead of stdout.
    #[arg(short, long = "output-dir", env = "TRADUJA_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Also write `{stem}_{target}.html` (requires --output-dir).
    #[arg(long, env = "TRADUJA_HTML", requires = "output_dir")]
    html: bool,

    /// Page separator: none, hr, comment, or custom string.
    #[arg(long, env = "TRADUJA_SEPARATOR", default_value = "none")]
    separator: String,

    /// Max LLM output tokens per line.
    #[arg(long, env = "TRADUJA_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "TRADUJA_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Largest accepted PDF in MiB.
    #[arg(long, env = "TRADUJA_MAX_FILE_MB", default_value_t = 10)]
    max_file_mb: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "TRADUJA_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Output structured JSON (TranslationOutput) instead of Markdown.
    #[arg(long, env = "TRADUJA_JSON")]
    json: bool,

    /// Only run OCR and print the extracted markdown.
    #[arg(long, conflicts_with = "from_markdown")]
    ocr_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "TRADUJA_NO_PROGRESS")]
    no_progress: bool,

    /// List the languages with built-in names and exit.
    #[arg(long)]
    list_languages: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TRADUJA_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TRADUJA_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs would tear through the progress bar; keep them off
    // while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.ocr_only;
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

    if cli.list_languages {
        for lang in Language::ALL {
            println!("{:<4} {}", lang.code(), lang.name());
        }
        return Ok(());
    }

    let input = cli.input.clone().context("An input file or URL is required")?;

    let progress = if show_progress {
        let (prefix, message) = if cli.from_markdown {
            ("Preparing", "Reading markdown…")
        } else {
            ("OCR", "Extracting text…")
        };
        Some(CliProgressCallback::new(prefix, message))
    } else {
        None
    };

    let config = build_config(
        &cli,
        progress
            .as_ref()
            .map(|cb| Arc::clone(cb) as ProgressCallback),
    )?;

    let result = run(&cli, &input, &config).await;
    if result.is_err() {
        if let Some(cb) = &progress {
            cb.bar.finish_and_clear();
        }
        eprintln!("{} {}", red("✘"), bold("Translation failed"));
    }
    result
}

async fn run(cli: &Cli, input: &str, config: &TranslationConfig) -> Result<()> {
    let stem = source_stem(input);

    // ── OCR-only mode ────────────────────────────────────────────────────
    if cli.ocr_only {
        let markdown = extract_markdown(input, config)
            .await
            .context("Text extraction failed")?;
        match &cli.output_dir {
            Some(dir) => {
                let path = dir.join(format!("{stem}.md"));
                traduja::convert::write_atomic(&path, &traduja::finish_markdown(&markdown))
                    .await
                    .context("Failed to write markdown")?;
                if !cli.quiet {
                    eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
                }
            }
            None => print_markdown(&markdown)?,
        }
        return Ok(());
    }

    // ── Translate ────────────────────────────────────────────────────────
    let output = if cli.from_markdown {
        let text = read_text(input)
            .await
            .with_context(|| format!("Failed to read {input}"))?;
        translate_markdown(&text, config)
            .await
            .context("Translation failed")?
    } else {
        translate_pdf(input, config)
            .await
            .context("Translation failed")?
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if let Some(ref dir) = cli.output_dir {
        let written = write_outputs(&output, dir, &stem, cli.html)
            .await
            .context("Failed to write output files")?;
        if !cli.quiet {
            for path in &written {
                eprintln!("   {}  {}", green("→"), bold(&path.display().to_string()));
            }
        }
    } else {
        print_markdown(&output.markdown)?;
    }

    if !cli.quiet && !cli.json {
        print_summary(&output, cli.output_dir.is_none());
    }
    Ok(())
}

fn print_markdown(markdown: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(markdown.as_bytes())
        .context("Failed to write to stdout")?;
    if !markdown.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

fn print_summary(output: &TranslationOutput, to_stdout: bool) {
    let s = &output.stats;
    eprintln!(
        "   {} → {}  {}  {} lines ({} blank)  {}ms",
        output.source_lang,
        output.target_lang,
        dim(&output.model),
        s.total_lines,
        s.blank_lines,
        s.total_duration_ms,
    );
    eprintln!("   {}", dim(&output.ledger.to_string()));
    if to_stdout {
        eprintln!(
            "   {}",
            dim(&format!(
                "tip: -o DIR writes {}",
                output_file_name("<name>", &output.target_lang, "md")
            ))
        );
    }
}

/// Map CLI args to `TranslationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<TranslationConfig> {
    let mut builder = TranslationConfig::builder()
        .source_lang(cli.source.trim().to_lowercase())
        .target_lang(cli.target.trim().to_lowercase())
        .page_separator(parse_separator(&cli.separator))
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_file_size(cli.max_file_mb.saturating_mul(1024 * 1024))
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--separator` string into `PageSeparator`.
fn parse_separator(s: &str) -> PageSeparator {
    match s.to_lowercase().as_str() {
        "none" => PageSeparator::None,
        "hr" | "---" => PageSeparator::HorizontalRule,
        "comment" => PageSeparator::Comment,
        _ => PageSeparator::Custom(s.to_string()),
    }
}
