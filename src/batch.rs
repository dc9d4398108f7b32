//! Batch orchestration: every upload → outcome → ranking.
//!
//! Documents are processed strictly one at a time, in upload order. Each
//! goes through load → request → parse (with retry) before the next one
//! starts, and a fixed pause follows every document whether or not it
//! produced a verdict. A failing document never aborts the batch; it is
//! recorded in [`RankingOutput::outcomes`] and left out of the ranking.
//!
//! Use [`crate::stream::evaluate_stream`] instead when outcomes should be
//! shown as they arrive.

use crate::config::RankingConfig;
use crate::error::{AtsError, AttemptError, DocumentError};
use crate::output::{BatchStats, DocumentOutcome, RankingOutput, SourceRef, Verdict};
use crate::pipeline::extract::{self, LoadOptions, LoadedContent};
use crate::pipeline::input::{self, Upload};
use crate::pipeline::llm::{LlmVerdictModel, ResumeContent, VerdictModel, VerdictRequest};
use crate::pipeline::throttle::Throttle;
use crate::pipeline::{encode, parse, retry};
use crate::rank::rank_verdicts;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Model used when a provider is chosen without naming one.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Rank uploaded resumes against a job description.
///
/// This is the primary entry point for the library. The provider is
/// resolved from `config` and the environment.
///
/// # Errors
/// Returns `Err(AtsError)` only when the batch cannot start: empty job
/// description, no uploads, or no usable provider. Per-document failures
/// are reported in [`RankingOutput::outcomes`].
pub async fn rank(
    uploads: &[Upload],
    job_description: &str,
    config: &RankingConfig,
) -> Result<RankingOutput, AtsError> {
    check_preconditions(uploads, job_description)?;
    let provider = resolve_provider(config)?;
    let model: Arc<dyn VerdictModel> = Arc::new(LlmVerdictModel::new(provider, config));
    rank_with_model(model, uploads, job_description, config).await
}

/// Resolve local paths or URLs, then [`rank`] them.
///
/// An input that cannot be read is fatal: the caller named it explicitly.
pub async fn rank_paths<S: AsRef<str>>(
    inputs: &[S],
    job_description: &str,
    config: &RankingConfig,
) -> Result<RankingOutput, AtsError> {
    if job_description.trim().is_empty() {
        return Err(AtsError::MissingJobDescription);
    }

    let mut uploads = Vec::with_capacity(inputs.len());
    for input in inputs {
        uploads.push(input::resolve_upload(input.as_ref(), config.download_timeout_secs).await?);
    }

    rank(&uploads, job_description, config).await
}

/// Synchronous wrapper around [`rank`].
///
/// Creates a temporary tokio runtime internally.
pub fn rank_sync(
    uploads: &[Upload],
    job_description: &str,
    config: &RankingConfig,
) -> Result<RankingOutput, AtsError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AtsError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(rank(uploads, job_description, config))
}

/// Rank with an explicit [`VerdictModel`].
///
/// Same contract as [`rank`] minus provider resolution; useful for custom
/// backends and tests.
pub async fn rank_with_model(
    model: Arc<dyn VerdictModel>,
    uploads: &[Upload],
    job_description: &str,
    config: &RankingConfig,
) -> Result<RankingOutput, AtsError> {
    check_preconditions(uploads, job_description)?;

    let total_start = Instant::now();
    let total = uploads.len();
    let throttle = Throttle::from_millis(config.pause_ms);
    info!(
        "Starting batch: {} resumes, top {}, {:?} between resumes",
        total,
        config.top_n,
        throttle.interval()
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut outcomes = Vec::with_capacity(total);

    for (index, upload) in uploads.iter().enumerate() {
        if config.is_cancelled() {
            debug!("{}: skipped, batch cancelled", upload.name);
            outcomes.push(DocumentOutcome::failed(
                source_of(index, upload),
                DocumentError::Cancelled,
                0,
            ));
            continue;
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_document_start(index, total, &upload.name);
        }

        let outcome = process_document(model.as_ref(), upload, index, job_description, config).await;
        report_outcome(config, &outcome, total);
        outcomes.push(outcome);

        throttle.pause().await;
    }

    // Collection order is upload order; the ranker's stable sort relies on it.
    let verdicts: Vec<Verdict> = outcomes.iter().filter_map(|o| o.verdict().cloned()).collect();
    let ranked = rank_verdicts(verdicts, config.top_n);
    let stats = BatchStats::from_outcomes(&outcomes, total_start.elapsed().as_millis() as u64);

    info!(
        "Batch complete: {}/{} verdicts, {} failed, {} skipped, {}ms",
        stats.succeeded, total, stats.failed, stats.skipped, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, stats.succeeded);
    }

    Ok(RankingOutput {
        ranked,
        outcomes,
        stats,
    })
}

// ── Per-document processing ──────────────────────────────────────────────

/// Load, request and parse one upload. Never fails; the outcome says why
/// there is no verdict.
pub(crate) async fn process_document(
    model: &dyn VerdictModel,
    upload: &Upload,
    index: usize,
    job_description: &str,
    config: &RankingConfig,
) -> DocumentOutcome {
    let start = Instant::now();
    let source = source_of(index, upload);

    let resume = match load_resume(upload, config).await {
        Ok(r) => r,
        Err(e) => {
            warn!("{}: {}", upload.name, e);
            let mut outcome = DocumentOutcome::failed(source, e, 0);
            outcome.duration_ms = start.elapsed().as_millis() as u64;
            return outcome;
        }
    };

    let request = VerdictRequest::new(config.instruction_text(), job_description, resume);

    let input_tokens = AtomicUsize::new(0);
    let output_tokens = AtomicUsize::new(0);
    let (request, source_ref) = (&request, &source);
    let (input_ref, output_ref) = (&input_tokens, &output_tokens);

    let attempted = retry::retry(
        &config.retry,
        move |attempt| async move {
            debug!("{}: attempt {}", source_ref.name, attempt);
            let reply = model.complete(request).await.map_err(AttemptError::from)?;
            input_ref.fetch_add(reply.input_tokens, Ordering::Relaxed);
            output_ref.fetch_add(reply.output_tokens, Ordering::Relaxed);
            parse::parse_verdict(&reply.text, source_ref.clone()).map_err(AttemptError::from)
        },
        |attempt, err: &AttemptError| {
            warn!("{}: attempt {} failed: {}", source_ref.name, attempt, err);
            if let Some(ref cb) = config.progress_callback {
                cb.on_attempt_failed(index, attempt, &err.to_string());
            }
        },
    )
    .await;

    let attempts = attempted.attempts;
    let result = attempted.result.map_err(|e| DocumentError::RetriesExhausted {
        attempts,
        last: e.to_string(),
    });

    DocumentOutcome {
        source,
        result,
        attempts,
        duration_ms: start.elapsed().as_millis() as u64,
        input_tokens: input_tokens.into_inner(),
        output_tokens: output_tokens.into_inner(),
    }
}

/// Extract the upload and put it in request form.
async fn load_resume(upload: &Upload, config: &RankingConfig) -> Result<ResumeContent, DocumentError> {
    let opts = LoadOptions {
        pdf_only: config.pdf_only,
        password: config.password.clone(),
    };

    match extract::load_document(upload, &opts).await? {
        LoadedContent::Text(text) => Ok(ResumeContent::Text(text)),
        LoadedContent::Image(img) => encode::encode_image(&img)
            .map(ResumeContent::Image)
            .map_err(|e| DocumentError::Extraction {
                detail: format!("image encoding failed: {e}"),
            }),
    }
}

pub(crate) fn source_of(index: usize, upload: &Upload) -> SourceRef {
    SourceRef {
        index,
        name: upload.name.clone(),
        mime: upload.mime.clone(),
    }
}

pub(crate) fn report_outcome(config: &RankingConfig, outcome: &DocumentOutcome, total: usize) {
    let Some(ref cb) = config.progress_callback else {
        return;
    };
    match &outcome.result {
        Ok(v) => cb.on_document_complete(outcome.source.index, total, v.score),
        Err(e) => cb.on_document_error(outcome.source.index, total, &e.to_string()),
    }
}

pub(crate) fn check_preconditions(uploads: &[Upload], job_description: &str) -> Result<(), AtsError> {
    if job_description.trim().is_empty() {
        return Err(AtsError::MissingJobDescription);
    }
    if uploads.is_empty() {
        return Err(AtsError::NoDocuments);
    }
    Ok(())
}

// ── Provider resolution ──────────────────────────────────────────────────

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. pre-built provider (`config.provider`)
/// 2. named provider (`config.provider_name`) with `config.model`
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`
/// 4. Gemini when `GEMINI_API_KEY` is set
/// 5. `ProviderFactory::from_env` auto-detection
pub(crate) fn resolve_provider(config: &RankingConfig) -> Result<Arc<dyn LLMProvider>, AtsError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or_else(|| default_model_for(name));
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if std::env::var("GEMINI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider("gemini", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| AtsError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or ANTHROPIC_API_KEY.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn default_model_for(provider: &str) -> &'static str {
    match provider {
        "openai" | "azure" => "gpt-4.1-mini",
        "anthropic" => "claude-sonnet-4-20250514",
        _ => DEFAULT_MODEL,
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, AtsError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        AtsError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
