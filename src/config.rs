//! Configuration types for a ranking batch.
//!
//! All batch behaviour is controlled through [`RankingConfig`], built via its
//! [`RankingConfigBuilder`]. Callers set only what they care about and rely
//! on the documented defaults for the rest.

use crate::error::AtsError;
use crate::pipeline::retry::{Backoff, RetryPolicy};
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Configuration for a ranking batch.
///
/// # Example
/// ```rust
/// use edgequake_ats::RankingConfig;
///
/// let config = RankingConfig::builder()
///     .top_n(5)
///     .model("gemini-2.0-flash")
///     .build()
///     .unwrap();
/// assert_eq!(config.top_n, 5);
/// ```
#[derive(Clone)]
pub struct RankingConfig {
    /// How many candidates to keep after sorting. Default: 3. Must be ≥ 1.
    pub top_n: usize,

    /// LLM model identifier, e.g. "gemini-2.0-flash". If None, uses the
    /// provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens the model may generate per verdict. Default: 2048.
    pub max_tokens: usize,

    /// Attempt budget and delay after each failure.
    /// Default: 3 attempts, fixed 1000 ms backoff.
    pub retry: RetryPolicy,

    /// Pause after each document, success or not. Default: 500 ms.
    pub pause_ms: u64,

    /// Which built-in instruction to send. Default: [`InstructionStyle::Detailed`].
    pub instruction_style: InstructionStyle,

    /// Custom instruction replacing the built-in one.
    pub instruction: Option<String>,

    /// Reject image uploads and accept PDFs (and text) only. Default: false.
    pub pdf_only: bool,

    /// Password used to open encrypted PDF resumes.
    pub password: Option<String>,

    /// Per-model-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Receives per-document progress events.
    pub progress_callback: Option<ProgressCallback>,

    /// Checked between documents; once set, remaining documents are skipped.
    pub cancel: Option<CancellationFlag>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_n: 3,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 2048,
            retry: RetryPolicy::default(),
            pause_ms: 500,
            instruction_style: InstructionStyle::default(),
            instruction: None,
            pdf_only: false,
            password: None,
            api_timeout_secs: 60,
            download_timeout_secs: 120,
            progress_callback: None,
            cancel: None,
        }
    }
}

impl fmt::Debug for RankingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RankingConfig")
            .field("top_n", &self.top_n)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("retry", &self.retry)
            .field("pause_ms", &self.pause_ms)
            .field("instruction_style", &self.instruction_style)
            .field("custom_instruction", &self.instruction.is_some())
            .field("pdf_only", &self.pdf_only)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl RankingConfig {
    /// Create a new builder for `RankingConfig`.
    pub fn builder() -> RankingConfigBuilder {
        RankingConfigBuilder {
            config: Self::default(),
        }
    }

    /// The instruction actually sent to the model.
    pub fn instruction_text(&self) -> &str {
        self.instruction
            .as_deref()
            .unwrap_or_else(|| crate::prompts::instruction_for(self.instruction_style))
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationFlag::is_cancelled)
    }
}

/// Builder for [`RankingConfig`].
#[derive(Debug)]
pub struct RankingConfigBuilder {
    config: RankingConfig,
}

impl RankingConfigBuilder {
    pub fn top_n(mut self, n: usize) -> Self {
        self.config.top_n = n;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t;
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.retry.max_attempts = n;
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.config.retry.backoff = backoff;
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn pause_ms(mut self, ms: u64) -> Self {
        self.config.pause_ms = ms;
        self
    }

    pub fn instruction_style(mut self, style: InstructionStyle) -> Self {
        self.config.instruction_style = style;
        self
    }

    pub fn instruction(mut self, text: impl Into<String>) -> Self {
        self.config.instruction = Some(text.into());
        self
    }

    pub fn pdf_only(mut self, v: bool) -> Self {
        self.config.pdf_only = v;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn cancel(mut self, flag: CancellationFlag) -> Self {
        self.config.cancel = Some(flag);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RankingConfig, AtsError> {
        let c = &self.config;
        if c.top_n == 0 {
            return Err(AtsError::InvalidConfig("top_n must be ≥ 1".into()));
        }
        if c.retry.max_attempts == 0 {
            return Err(AtsError::InvalidConfig("max_attempts must be ≥ 1".into()));
        }
        if !(0.0..=2.0).contains(&c.temperature) {
            return Err(AtsError::InvalidConfig(format!(
                "temperature must be 0.0–2.0, got {}",
                c.temperature
            )));
        }
        if c.instruction.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(AtsError::InvalidConfig("custom instruction is empty".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which verdict shape the built-in instruction asks for.
///
/// Both shapes parse into the same [`crate::output::Verdict`]; the style
/// only changes the field names the model is told to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InstructionStyle {
    /// `match_score`, `summary`, `missing_skills`, `experience_years`. (default)
    #[default]
    Detailed,
    /// `score`, `reason`, `skills_missing`.
    Compact,
}

/// Cooperative cancellation, checked between documents.
///
/// Cloning shares the flag. A document already in flight runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
