//! Model interaction: build the verdict request and call the provider.
//!
//! The request is an ordered list of parts, always:
//!
//! 1. instruction template
//! 2. `### JOB DESCRIPTION:` header
//! 3. job description text
//! 4. `### RESUME TEXT:` or `### RESUME IMAGE:` header
//! 5. resume text, or the resume image
//!
//! [`VerdictModel`] is the seam between the pipeline and the provider. The
//! production implementation, [`LlmVerdictModel`], wraps an
//! `edgequake_llm::LLMProvider`; tests plug in scripted models.
//! Failures come back as [`ModelError`], never as text.

use crate::config::RankingConfig;
use crate::error::ModelError;
use crate::prompts::{JOB_DESCRIPTION_HEADER, RESUME_IMAGE_HEADER, RESUME_TEXT_HEADER};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::debug;

/// Resume content in request form.
#[derive(Clone)]
pub enum ResumeContent {
    Text(String),
    Image(ImageData),
}

/// One piece of a verdict request.
#[derive(Clone)]
pub enum RequestPart {
    Text(String),
    Image(ImageData),
}

impl fmt::Debug for RequestPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestPart::Text(t) => f.debug_tuple("Text").field(t).finish(),
            RequestPart::Image(img) => f
                .debug_tuple("Image")
                .field(&format_args!("{} ({} b64 bytes)", img.mime_type, img.data.len()))
                .finish(),
        }
    }
}

/// The ordered request sent for one resume.
#[derive(Debug, Clone)]
pub struct VerdictRequest {
    pub parts: Vec<RequestPart>,
}

impl VerdictRequest {
    pub fn new(instruction: &str, job_description: &str, resume: ResumeContent) -> Self {
        let (header, body) = match resume {
            ResumeContent::Text(t) => (RESUME_TEXT_HEADER, RequestPart::Text(t)),
            ResumeContent::Image(img) => (RESUME_IMAGE_HEADER, RequestPart::Image(img)),
        };
        Self {
            parts: vec![
                RequestPart::Text(instruction.to_string()),
                RequestPart::Text(JOB_DESCRIPTION_HEADER.to_string()),
                RequestPart::Text(job_description.to_string()),
                RequestPart::Text(header.to_string()),
                body,
            ],
        }
    }

    /// All text parts joined in order; images are skipped.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                RequestPart::Text(t) => Some(t.as_str()),
                RequestPart::Image(_) => None,
            })
            .collect()
    }

    pub fn images(&self) -> Vec<ImageData> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                RequestPart::Image(img) => Some(img.clone()),
                RequestPart::Text(_) => None,
            })
            .collect()
    }
}

/// Raw model answer plus token usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelReply {
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl ModelReply {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Anything that can answer a verdict request.
#[async_trait]
pub trait VerdictModel: Send + Sync {
    async fn complete(&self, request: &VerdictRequest) -> Result<ModelReply, ModelError>;
}

/// [`VerdictModel`] backed by an edgequake-llm provider.
pub struct LlmVerdictModel {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    timeout: Duration,
}

impl LlmVerdictModel {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &RankingConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
            timeout: Duration::from_secs(config.api_timeout_secs.max(1)),
        }
    }
}

#[async_trait]
impl VerdictModel for LlmVerdictModel {
    async fn complete(&self, request: &VerdictRequest) -> Result<ModelReply, ModelError> {
        let start = Instant::now();
        let text = request.text();
        let messages = vec![ChatMessage::user_with_images(&text, request.images())];

        let response = timeout(self.timeout, self.provider.chat(&messages, Some(&self.options)))
            .await
            .map_err(|_| ModelError::Timeout {
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ModelError::Provider(e.to_string()))?;

        debug!(
            "model replied: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.trim().is_empty() {
            return Err(ModelError::EmptyResponse);
        }

        Ok(ModelReply {
            text: response.content,
            input_tokens: response.prompt_tokens as usize,
            output_tokens: response.completion_tokens as usize,
        })
    }
}

/// Build `CompletionOptions` from the ranking config.
fn build_options(config: &RankingConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = RankingConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(2048));
    }

    #[test]
    fn text_request_parts_are_ordered() {
        let req = VerdictRequest::new("INSTR", "Senior Go engineer", ResumeContent::Text("CV".into()));
        let texts: Vec<String> = req
            .parts
            .iter()
            .map(|p| match p {
                RequestPart::Text(t) => t.clone(),
                RequestPart::Image(_) => "<img>".into(),
            })
            .collect();
        assert_eq!(
            texts,
            vec![
                "INSTR",
                JOB_DESCRIPTION_HEADER,
                "Senior Go engineer",
                RESUME_TEXT_HEADER,
                "CV"
            ]
        );
        assert_eq!(
            req.text(),
            format!("INSTR{JOB_DESCRIPTION_HEADER}Senior Go engineer{RESUME_TEXT_HEADER}CV")
        );
        assert!(req.images().is_empty());
    }

    #[test]
    fn image_request_uses_image_header() {
        let img = ImageData::new("aGk=", "image/png");
        let req = VerdictRequest::new("INSTR", "JD", ResumeContent::Image(img));
        assert_eq!(req.parts.len(), 5);
        assert!(matches!(&req.parts[3], RequestPart::Text(h) if h == RESUME_IMAGE_HEADER));
        assert!(matches!(&req.parts[4], RequestPart::Image(_)));
        assert_eq!(req.images().len(), 1);
        assert!(format!("{:?}", req.parts[4]).contains("image/png"));
    }
}
