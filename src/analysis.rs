//! Analysis pipeline: text extraction followed by summary generation.

use crate::{
    config::Config,
    extraction::{ExtractionError, TextExtractor},
    summarization::{ChatCompletionClient, GenerationError, SummaryGenerator},
    upload::UploadedFile,
};
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by the analysis pipeline after validation.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Text could not be extracted from the upload.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// The language model call failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Abstraction over the analysis pipeline used by the HTTP surface.
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    /// Extract text from a validated upload and summarize it.
    async fn analyse(&self, file: UploadedFile) -> Result<String, AnalysisError>;
}

/// Runs extraction and summary generation for validated uploads.
///
/// Built once at start-up and shared through an `Arc`; it holds no per-request state.
pub struct AnalysisService {
    extractor: TextExtractor,
    generator: Box<dyn SummaryGenerator>,
}

impl AnalysisService {
    /// Assemble a service from an extractor and a summary generator.
    pub fn new(extractor: TextExtractor, generator: Box<dyn SummaryGenerator>) -> Self {
        Self {
            extractor,
            generator,
        }
    }

    /// Build the production pipeline (Tesseract OCR, chat-completions client) from configuration.
    pub fn from_config(config: &Config) -> Result<Self, GenerationError> {
        tracing::info!(
            model = %config.llm_model,
            tesseract = %config.tesseract_path,
            "Initializing analysis pipeline"
        );
        Ok(Self::new(
            TextExtractor::from_config(config),
            Box::new(ChatCompletionClient::from_config(config)?),
        ))
    }
}

#[async_trait]
impl AnalysisApi for AnalysisService {
    async fn analyse(&self, file: UploadedFile) -> Result<String, AnalysisError> {
        let media_type = file
            .media_type()
            .map(|media_type| media_type.as_mime().to_string())
            .unwrap_or(file.content_type);

        let extracted = self.extractor.extract(file.content, &media_type).await?;
        tracing::debug!(chars = extracted.len(), "Text extracted");

        let summary = self.generator.generate_summary(&extracted).await?;
        tracing::debug!(chars = summary.len(), "Summary generated");
        Ok(summary)
    }
}
