//! Streaming evaluation API: emit one outcome per resume as it completes.
//!
//! [`crate::batch::rank`] returns only after the whole batch has been
//! evaluated. [`evaluate_stream`] instead yields each [`DocumentOutcome`]
//! as soon as that document is done, so a caller can show verdicts while
//! later resumes are still in flight. Ranking is left to the caller
//! (collect the verdicts and pass them to [`crate::rank::rank_verdicts`]).
//!
//! Processing is sequential and outcomes arrive in upload order. The
//! inter-document pause is taken before each document after the first, so
//! the stream never holds a finished outcome back.

use crate::batch::{check_preconditions, process_document, report_outcome, resolve_provider, source_of};
use crate::config::RankingConfig;
use crate::error::{AtsError, DocumentError};
use crate::output::DocumentOutcome;
use crate::pipeline::input::Upload;
use crate::pipeline::llm::{LlmVerdictModel, VerdictModel};
use crate::pipeline::throttle::Throttle;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::{debug, info};

/// A boxed stream of per-document outcomes.
pub type OutcomeStream = Pin<Box<dyn Stream<Item = DocumentOutcome> + Send>>;

/// Evaluate resumes one by one, streaming outcomes in upload order.
///
/// # Returns
/// - `Ok(OutcomeStream)`: one item per upload
/// - `Err(AtsError)`: the batch cannot start (empty job description, no
///   uploads, no provider)
pub async fn evaluate_stream(
    uploads: Vec<Upload>,
    job_description: &str,
    config: &RankingConfig,
) -> Result<OutcomeStream, AtsError> {
    check_preconditions(&uploads, job_description)?;
    let provider = resolve_provider(config)?;
    let model: Arc<dyn VerdictModel> = Arc::new(LlmVerdictModel::new(provider, config));
    evaluate_stream_with_model(model, uploads, job_description, config)
}

/// [`evaluate_stream`] with an explicit [`VerdictModel`].
pub fn evaluate_stream_with_model(
    model: Arc<dyn VerdictModel>,
    uploads: Vec<Upload>,
    job_description: &str,
    config: &RankingConfig,
) -> Result<OutcomeStream, AtsError> {
    check_preconditions(&uploads, job_description)?;

    let total = uploads.len();
    info!("Starting streaming evaluation: {} resumes", total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let throttle = Throttle::from_millis(config.pause_ms);
    let job_description: Arc<str> = Arc::from(job_description);
    let config = config.clone();

    let s = stream::iter(uploads.into_iter().enumerate()).then(move |(index, upload)| {
        let model = Arc::clone(&model);
        let job_description = Arc::clone(&job_description);
        let cfg = config.clone();
        async move {
            if cfg.is_cancelled() {
                debug!("{}: skipped, stream cancelled", upload.name);
                return DocumentOutcome::failed(source_of(index, &upload), DocumentError::Cancelled, 0);
            }
            if index > 0 {
                throttle.pause().await;
                // The flag may have been set while we slept.
                if cfg.is_cancelled() {
                    debug!("{}: skipped, stream cancelled during pause", upload.name);
                    return DocumentOutcome::failed(source_of(index, &upload), DocumentError::Cancelled, 0);
                }
            }
            if let Some(ref cb) = cfg.progress_callback {
                cb.on_document_start(index, total, &upload.name);
            }

            let outcome = process_document(model.as_ref(), &upload, index, &job_description, &cfg).await;
            report_outcome(&cfg, &outcome, total);
            outcome
        }
    });

    Ok(Box::pin(s))
}
