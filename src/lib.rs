//! # edgequake-ats
//!
//! Rank candidate resumes against a job description with a Large Language
//! Model acting as an Applicant Tracking System.
//!
//! ## Why this crate?
//!
//! Keyword filters miss synonyms and reward keyword stuffing. Here every
//! resume is read by a model that sees the job description and the resume
//! together and answers with a structured verdict: a 0–100 match score, a
//! short summary, missing skills and years of experience. Verdicts are then
//! ranked, and the best N are returned.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Uploads (PDF / JPEG / PNG / text)
//!  │
//!  ├─ 1. Load     PDF → text via pdfium; images decoded as-is
//!  ├─ 2. Request  instruction + JD + resume, one call per resume
//!  ├─ 3. Parse    strip code fences, read the verdict JSON
//!  ├─ 4. Retry    up to 3 attempts, 1 s apart; then the resume is dropped
//!  ├─ 5. Batch    one resume at a time, 0.5 s pause between them
//!  └─ 6. Rank     stable sort by score, highest first, top N
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_ats::{rank, RankingConfig, Upload};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / ANTHROPIC_API_KEY
//!     let config = RankingConfig::builder().top_n(3).build()?;
//!     let uploads = vec![Upload::new(
//!         "alice.pdf",
//!         "application/pdf",
//!         std::fs::read("alice.pdf")?,
//!     )];
//!     let output = rank(&uploads, "Senior backend engineer, Go, 5+ years", &config).await?;
//!     for v in &output.ranked {
//!         println!("{}: {}", v.display_name(), v.rank_score());
//!     }
//!     for (src, err) in output.failures() {
//!         eprintln!("skipped {}: {}", src.name, err);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ats-rank` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-ats = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod rank;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{rank, rank_paths, rank_sync, rank_with_model, DEFAULT_MODEL};
pub use config::{CancellationFlag, InstructionStyle, RankingConfig, RankingConfigBuilder};
pub use error::{AtsError, AttemptError, DocumentError, ModelError, ParseError};
pub use output::{BatchStats, DocumentOutcome, RankingOutput, SourceRef, Verdict};
pub use pipeline::input::{DocumentKind, Upload};
pub use pipeline::llm::{LlmVerdictModel, ModelReply, VerdictModel, VerdictRequest};
pub use pipeline::retry::{Backoff, RetryPolicy};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use rank::rank_verdicts;
pub use stream::{evaluate_stream, evaluate_stream_with_model, OutcomeStream};
