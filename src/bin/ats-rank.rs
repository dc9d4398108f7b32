//! CLI binary for edgequake-ats.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RankingConfig` and prints the ranked shortlist.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_ats::{
    rank_paths, Backoff, BatchProgressCallback, CancellationFlag, InstructionStyle, ProgressCallback,
    RankingConfig, RankingOutput, Verdict,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

/// Colour a match score: above 75 green, above 50 yellow, otherwise red.
fn score_colour(score: i64) -> String {
    let s = score.to_string();
    if score > 75 {
        green(&s)
    } else if score > 50 {
        yellow(&s)
    } else {
        red(&s)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max - 1).collect();
        format!("{head}\u{2026}")
    } else {
        s.to_string()
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per resume.
struct CliProgressCallback {
    bar: ProgressBar,
    names: Mutex<HashMap<usize, (String, Instant)>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} resumes  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(0);
        bar.set_style(style);
        bar.set_prefix("Screening");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            names: Mutex::new(HashMap::new()),
        })
    }

    fn finish_line(&self, index: usize) -> (String, String) {
        let (name, started) = self
            .names
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .unwrap_or_else(|| (format!("#{}", index + 1), Instant::now()));
        (name, dim(&format!("{:.1}s", started.elapsed().as_secs_f64())))
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Screening {total} resumes…"))
        ));
    }

    fn on_document_start(&self, index: usize, total: usize, name: &str) {
        if let Ok(mut m) = self.names.lock() {
            m.insert(index, (name.to_string(), Instant::now()));
        }
        self.bar.set_message(format!("Processing {}/{}: {}", index + 1, total, name));
    }

    fn on_attempt_failed(&self, index: usize, attempt: u32, error: &str) {
        self.bar.println(format!(
            "  {} #{} attempt {} failed: {}",
            yellow("↻"),
            index + 1,
            attempt,
            dim(&truncate(error, 80)),
        ));
    }

    fn on_document_complete(&self, index: usize, _total: usize, score: Option<i64>) {
        let (name, elapsed) = self.finish_line(index);
        self.bar.println(format!(
            "  {} {:<32} score {:>3}  {}",
            green("✓"),
            truncate(&name, 32),
            score_colour(score.unwrap_or(0)),
            elapsed,
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, _total: usize, error: &str) {
        let (name, elapsed) = self.finish_line(index);
        self.bar.println(format!(
            "  {} {:<32} {}  {}",
            red("✗"),
            truncate(&name, 32),
            red(&truncate(error, 80)),
            elapsed,
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, succeeded: usize) {
        let failed = total.saturating_sub(succeeded);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!("{} {} resumes evaluated", green("✔"), bold(&succeeded.to_string()));
        } else {
            eprintln!(
                "{} {}/{} resumes evaluated  ({} dropped)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&succeeded.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Top 3 of a folder of resumes
  ats-rank --jd "Senior backend engineer, Go, 5+ years" resumes/*.pdf

  # Job description from a file, top 5, JSON output
  ats-rank --jd-file jd.txt -n 5 --json alice.pdf bob.png carol.jpg

  # Resume from a URL, with a specific provider and model
  ats-rank --jd-file jd.txt --provider openai --model gpt-4.1-mini https://example.com/cv.pdf

  # Short instruction and PDFs only
  ats-rank --jd-file jd.txt --style compact --pdf-only resumes/*

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (preferred when set)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Directory or file of the libpdfium to bind
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Rank resumes against a job description using an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "ats-rank",
    version,
    about = "Rank resumes against a job description using an LLM",
    long_about = "Evaluate each resume (PDF, JPEG, PNG or plain text; local file or URL) against \
a job description with an LLM acting as an Applicant Tracking System, then print the best \
candidates. Supports Google Gemini, OpenAI, Anthropic and any provider edgequake-llm knows.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Resume files or HTTP/HTTPS URLs.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Job description text.
    #[arg(long, env = "ATS_JD", conflicts_with = "jd_file", required_unless_present = "jd_file")]
    jd: Option<String>,

    /// Read the job description from this file.
    #[arg(long, env = "ATS_JD_FILE")]
    jd_file: Option<PathBuf>,

    /// How many top candidates to show.
    #[arg(short = 'n', long, env = "ATS_TOP_N", default_value_t = 3,
          value_parser = clap::value_parser!(u64).range(1..))]
    top_n: u64,

    /// LLM model ID (e.g. gemini-2.0-flash, gpt-4.1-mini).
    #[arg(long, env = "ATS_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, env = "ATS_PROVIDER")]
    provider: Option<String>,

    /// Built-in instruction: detailed or compact.
    #[arg(long, env = "ATS_STYLE", value_enum, default_value = "detailed")]
    style: StyleArg,

    /// Path to a text file with a custom instruction (overrides --style).
    #[arg(long, env = "ATS_INSTRUCTION_FILE")]
    instruction_file: Option<PathBuf>,

    /// Model attempts per resume before it is dropped.
    #[arg(long, env = "ATS_MAX_ATTEMPTS", default_value_t = 3,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: u32,

    /// Delay after each failed attempt in milliseconds.
    #[arg(long, env = "ATS_RETRY_BACKOFF_MS", default_value_t = 1000)]
    retry_backoff_ms: u64,

    /// Double the delay after each failed attempt.
    #[arg(long, env = "ATS_EXPONENTIAL_BACKOFF")]
    exponential_backoff: bool,

    /// Pause between resumes in milliseconds.
    #[arg(long, env = "ATS_PAUSE_MS", default_value_t = 500)]
    pause_ms: u64,

    /// Reject image uploads; accept PDFs and text only.
    #[arg(long, env = "ATS_PDF_ONLY")]
    pdf_only: bool,

    /// Password for encrypted PDFs.
    #[arg(long, env = "ATS_PASSWORD")]
    password: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "ATS_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max LLM output tokens per resume.
    #[arg(long, env = "ATS_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "ATS_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "ATS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Output structured JSON (RankingOutput) instead of a table.
    #[arg(long, env = "ATS_JSON")]
    json: bool,

    /// List resumes that produced no verdict, with the reason.
    #[arg(long, env = "ATS_SHOW_FAILURES")]
    show_failures: bool,

    /// Disable progress bar.
    #[arg(long, env = "ATS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ATS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, env = "ATS_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum StyleArg {
    Detailed,
    Compact,
}

impl From<StyleArg> for InstructionStyle {
    fn from(v: StyleArg) -> Self {
        match v {
            StyleArg::Detailed => InstructionStyle::Detailed,
            StyleArg::Compact => InstructionStyle::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar carries the user-facing feedback; library logs only
    // surface at error level unless -v is given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    let job_description = match (&cli.jd, &cli.jd_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read job description from {:?}", path))?,
        (None, None) => anyhow::bail!("Provide the job description with --jd or --jd-file"),
    };

    // ── Ctrl-C stops after the current resume ────────────────────────────
    let cancel = CancellationFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("{} interrupted, finishing current resume…", yellow("⚠"));
                cancel.cancel();
            }
        });
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb, cancel).await?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = rank_paths(&cli.inputs, &job_description, &config)
        .await
        .context("Ranking failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    print_ranking(&output);
    if cli.show_failures {
        print_failures(&output);
    }

    if !cli.quiet {
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  {} attempts  —  {}ms total",
            dim(&output.stats.total_input_tokens.to_string()),
            dim(&output.stats.total_output_tokens.to_string()),
            output.stats.total_attempts,
            output.stats.total_duration_ms,
        );
    }

    Ok(())
}

/// Map CLI args to `RankingConfig`.
async fn build_config(
    cli: &Cli,
    progress: Option<ProgressCallback>,
    cancel: CancellationFlag,
) -> Result<RankingConfig> {
    let backoff = if cli.exponential_backoff {
        Backoff::Exponential {
            base_ms: cli.retry_backoff_ms,
        }
    } else {
        Backoff::Fixed {
            ms: cli.retry_backoff_ms,
        }
    };

    let mut builder = RankingConfig::builder()
        .top_n(cli.top_n as usize)
        .instruction_style(cli.style.clone().into())
        .max_attempts(cli.max_attempts)
        .backoff(backoff)
        .pause_ms(cli.pause_ms)
        .pdf_only(cli.pdf_only)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .cancel(cancel);

    if let Some(ref path) = cli.instruction_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read instruction from {:?}", path))?;
        builder = builder.instruction(text);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_ranking(output: &RankingOutput) {
    if output.ranked.is_empty() {
        println!("{}", red("No resume could be evaluated."));
        return;
    }

    println!("{}", bold(&format!("Top {} candidates", output.ranked.len())));
    for (pos, v) in output.ranked.iter().enumerate() {
        print_verdict(pos + 1, v);
    }
}

fn print_verdict(pos: usize, v: &Verdict) {
    println!(
        "\n{} {}  {}  {}",
        bold(&format!("#{pos}")),
        bold(v.display_name()),
        score_colour(v.rank_score()),
        dim(&v.source.name),
    );
    if let Some(ref summary) = v.summary {
        println!("   {summary}");
    }
    if let Some(years) = v.experience_years {
        println!("   {} {years}", dim("experience (years):"));
    }
    if !v.missing_skills.is_empty() {
        println!("   {} {}", dim("missing:"), v.missing_skills.join(", "));
    }
}

fn print_failures(output: &RankingOutput) {
    let failures: Vec<_> = output.failures().collect();
    if failures.is_empty() {
        return;
    }
    println!("\n{}", bold("Not ranked"));
    for (src, err) in failures {
        println!("  {} {}  {}", red("✗"), src.name, dim(&err.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_thresholds() {
        assert_eq!(score_colour(76), green("76"));
        assert_eq!(score_colour(75), yellow("75"));
        assert_eq!(score_colour(51), yellow("51"));
        assert_eq!(score_colour(50), red("50"));
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("héllo wörld", 6), "héllo\u{2026}");
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn jd_flags_are_exclusive() {
        let err = Cli::try_parse_from(["ats-rank", "--jd", "x", "--jd-file", "jd.txt", "a.pdf"]);
        assert!(err.is_err());
        let ok = Cli::try_parse_from(["ats-rank", "--jd", "Go dev", "a.pdf", "b.png"]).unwrap();
        assert_eq!(ok.inputs, vec!["a.pdf", "b.png"]);
        assert_eq!(ok.top_n, 3);
    }
}
