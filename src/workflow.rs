//! Request workflow: raw input in, extracted text and summary out.
//!
//! `Workflow` is the explicit context every request runs against. It holds
//! the summarizer handle and the caption client; nothing is global.

use crate::config::Config;
use crate::extract::{self, ExtractError, ExtractedText, RawInput};
use crate::summarizer::{SummarizeError, SummarizerHandle};
use crate::summary::Summary;
use crate::transcript::{TranscriptClient, TranscriptError};
use crate::video::{self, UrlError};
use thiserror::Error;

/// Every way a single request can fail. None of them is fatal to the process.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    InvalidUrl(#[from] UrlError),
    #[error("transcript not available: {0}")]
    TranscriptUnavailable(#[from] TranscriptError),
    #[error("summarization failed: {0}")]
    Summarization(#[from] SummarizeError),
}

/// Result of one successful run
#[derive(Debug, Clone)]
pub struct Outcome {
    pub extracted: ExtractedText,
    pub summary: Summary,
}

/// Routes each kind of input to its extraction path. Needs no model.
pub struct Extractor {
    transcripts: TranscriptClient,
}

impl Extractor {
    pub fn new(config: &Config) -> Result<Self, WorkflowError> {
        Ok(Self {
            transcripts: TranscriptClient::new(&config.transcript)?,
        })
    }

    /// Turn any input into normalized text
    pub async fn extract(&self, input: RawInput) -> Result<ExtractedText, WorkflowError> {
        tracing::info!(kind = input.kind(), "extracting text");
        match input {
            RawInput::PlainText(text) => Ok(extract::extract_from_plain_text(&text)?),
            RawInput::DocumentBytes(bytes) => Ok(extract::extract_from_document(&bytes)?),
            RawInput::VideoReference { url, language } => {
                let id = video::resolve_video_id(&url)?;
                Ok(self.transcripts.fetch_transcript(&id, &language).await?)
            }
        }
    }
}

pub struct Workflow {
    extractor: Extractor,
    summarizer: SummarizerHandle,
}

impl Workflow {
    pub fn new(config: &Config, summarizer: SummarizerHandle) -> Result<Self, WorkflowError> {
        Ok(Self {
            extractor: Extractor::new(config)?,
            summarizer,
        })
    }

    pub fn summarizer(&self) -> &SummarizerHandle {
        &self.summarizer
    }

    pub async fn extract(&self, input: RawInput) -> Result<ExtractedText, WorkflowError> {
        self.extractor.extract(input).await
    }

    /// Extract and summarize with the default length bounds
    pub async fn run(&self, input: RawInput) -> Result<Outcome, WorkflowError> {
        let extracted = self.extract(input).await?;
        let summary = self.summarizer.summarize_default(extracted.as_str()).await?;
        tracing::info!(
            input_tokens = summary.input_tokens,
            summary_tokens = summary.token_count(),
            truncated = summary.truncated,
            "summary ready"
        );
        Ok(Outcome { extracted, summary })
    }
}
