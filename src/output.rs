//! Result types returned by a ranking batch.

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};

/// Identity of the upload a verdict came from.
///
/// A back-reference only: the bytes stay with the caller. Presenters that
/// want to preview the document look it up again by `index` or `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// 0-based position in the upload list.
    pub index: usize,
    /// File name as uploaded (or the last URL path segment).
    pub name: String,
    /// Declared MIME type, e.g. `application/pdf`.
    pub mime: String,
}

/// The structured result of evaluating one resume against one job description.
///
/// Every field except `source` comes from the model and is untrusted. In
/// particular `score` is nominally 0–100 but no bound is enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub name: Option<String>,
    pub score: Option<i64>,
    pub summary: Option<String>,
    pub missing_skills: Vec<String>,
    pub experience_years: Option<i64>,
    pub source: SourceRef,
}

impl Verdict {
    /// Score used for ordering. A missing score ranks as 0.
    pub fn rank_score(&self) -> i64 {
        self.score.unwrap_or(0)
    }

    /// Candidate name, or `"Unknown"` when the model gave none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }
}

/// What happened to one uploaded document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutcome {
    pub source: SourceRef,
    pub result: Result<Verdict, DocumentError>,
    /// Model attempts made (0 when extraction failed or the batch was cancelled).
    pub attempts: u32,
    pub duration_ms: u64,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl DocumentOutcome {
    pub(crate) fn failed(source: SourceRef, error: DocumentError, attempts: u32) -> Self {
        Self {
            source,
            result: Err(error),
            attempts,
            duration_ms: 0,
            input_tokens: 0,
            output_tokens: 0,
        }
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&DocumentError> {
        self.result.as_ref().err()
    }
}

/// Aggregate numbers for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_documents: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Documents never started because the batch was cancelled.
    pub skipped: usize,
    pub total_attempts: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_duration_ms: u64,
}

impl BatchStats {
    pub(crate) fn from_outcomes(outcomes: &[DocumentOutcome], total_duration_ms: u64) -> Self {
        let skipped = outcomes
            .iter()
            .filter(|o| matches!(o.error(), Some(DocumentError::Cancelled)))
            .count();
        let succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count();

        Self {
            total_documents: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded - skipped,
            skipped,
            total_attempts: outcomes.iter().map(|o| o.attempts as u64).sum(),
            total_input_tokens: outcomes.iter().map(|o| o.input_tokens as u64).sum(),
            total_output_tokens: outcomes.iter().map(|o| o.output_tokens as u64).sum(),
            total_duration_ms,
        }
    }
}

/// Everything a Presenter needs after a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingOutput {
    /// Top-N verdicts, best first.
    pub ranked: Vec<Verdict>,
    /// One record per upload, in upload order.
    pub outcomes: Vec<DocumentOutcome>,
    pub stats: BatchStats,
}

impl RankingOutput {
    /// Documents that produced no verdict, with the reason.
    pub fn failures(&self) -> impl Iterator<Item = (&SourceRef, &DocumentError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.error().map(|e| (&o.source, e)))
    }
}
