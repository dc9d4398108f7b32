//! Error types for the edgequake-ats library.
//!
//! Failures fall into two tiers:
//!
//! * [`AtsError`] — **Fatal**: the batch cannot start or cannot proceed
//!   (no job description, no documents, provider not configured, an input
//!   path that does not exist). Returned as `Err(AtsError)` from the
//!   top-level `rank*` functions.
//!
//! * [`DocumentError`] — **Non-fatal**: one resume could not be turned into
//!   a verdict (unreadable PDF, model kept returning junk). Stored inside
//!   [`crate::output::DocumentOutcome`]; the batch carries on and the
//!   document is simply absent from the ranking.
//!
//! Below those sit the two retryable attempt-level failures, [`ModelError`]
//! and [`ParseError`], which the retry wrapper consumes.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-ats library.
#[derive(Debug, Error)]
pub enum AtsError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Resume file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Batch preconditions ───────────────────────────────────────────────
    /// The job description is empty or whitespace.
    #[error("Missing job description.\nProvide one with --jd or --jd-file.")]
    MissingJobDescription,

    /// No resumes were supplied.
    #[error("No resumes to analyze.\nPass at least one PDF, JPG, PNG or TXT file.")]
    NoDocuments,

    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a single document produced no verdict.
///
/// Stored in [`crate::output::DocumentOutcome`]. The ranking ignores these
/// documents; callers that want to explain the gap read them from
/// [`crate::output::RankingOutput::failures`].
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The content type is not one the pipeline accepts.
    #[error("unsupported content type '{mime}'")]
    Unsupported { mime: String },

    /// Text or image could not be obtained from the upload.
    #[error("extraction failed: {detail}")]
    Extraction { detail: String },

    /// Every attempt failed at the model boundary or in parsing.
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    /// The batch was cancelled before this document started.
    #[error("cancelled before processing")]
    Cancelled,
}

/// A failed call to the generative model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Transport, auth, quota or model-side error reported by the provider.
    #[error("provider error: {0}")]
    Provider(String),

    /// The call did not finish within the configured timeout.
    #[error("model call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The provider answered with no text at all.
    #[error("model returned an empty response")]
    EmptyResponse,
}

/// The model answered, but not with a usable verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Nothing left after stripping fences and whitespace.
    #[error("response is empty after stripping code fences")]
    Empty,

    /// Not valid JSON.
    #[error("malformed JSON: {0}")]
    Json(String),

    /// Valid JSON, but the top level is an array, string, number, …
    #[error("expected a JSON object, got {found}")]
    NotAnObject { found: &'static str },

    /// A JSON object whose fields do not match the verdict shape.
    #[error("verdict schema mismatch: {0}")]
    Schema(String),
}

/// One failed attempt inside the retry loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
