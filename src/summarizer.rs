//! The process-wide summarizer.
//!
//! A `Summarizer` owns one loaded model plus the input budget and default
//! length bounds. It is created once and shared as a `SummarizerHandle`;
//! [`initialize`] guards the one-time load for the whole process and
//! [`ModelCell`] offers the same guard to callers that inject their own.

use crate::config::{Config, OverflowPolicy};
use crate::model::{GeminiBackend, ModelError, SummarizationModel};
use crate::summary::{LengthBounds, Summary};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;

#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("nothing to summarize: input text is empty")]
    EmptyInput,
    #[error("invalid length bounds: min {min}, max {max}")]
    InvalidBounds { min: usize, max: usize },
    #[error("input is {tokens} tokens, the model accepts at most {limit}")]
    InputTooLong { tokens: usize, limit: usize },
    #[error("the model returned an empty summary")]
    EmptyOutput,
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type SummarizerHandle = Arc<Summarizer>;

pub struct Summarizer {
    model: Box<dyn SummarizationModel>,
    max_input_tokens: usize,
    overflow: OverflowPolicy,
    defaults: LengthBounds,
}

impl Summarizer {
    /// Wrap an already loaded model with the limits from `config`
    pub fn new(model: Box<dyn SummarizationModel>, config: &Config) -> Self {
        let defaults = LengthBounds::new(config.summary.min_length, config.summary.max_length)
            .unwrap_or_else(|| {
                tracing::warn!(
                    min = config.summary.min_length,
                    max = config.summary.max_length,
                    "configured length bounds are invalid, using 30..130"
                );
                LengthBounds { min: 30, max: 130 }
            });

        Self {
            model,
            max_input_tokens: config.model.max_input_tokens.max(1),
            overflow: config.model.overflow,
            defaults,
        }
    }

    /// Load the configured model
    pub fn load(config: &Config) -> Result<Self, SummarizeError> {
        tracing::info!(
            provider = %config.model.provider,
            model = %config.model.model,
            "loading summarization model"
        );
        let model = GeminiBackend::from_config(config)?;
        Ok(Self::new(Box::new(model), config))
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn default_bounds(&self) -> LengthBounds {
        self.defaults
    }

    /// Summarize with the configured default bounds
    pub async fn summarize_default(&self, text: &str) -> Result<Summary, SummarizeError> {
        self.summarize(text, self.defaults.min, self.defaults.max)
            .await
    }

    /// Summarize `text` into between `min_length` and `max_length` tokens.
    ///
    /// Input over the model budget is truncated or rejected according to the
    /// overflow policy. Output longer than `max_length` is cut; output shorter
    /// than `min_length` is kept and logged.
    pub async fn summarize(
        &self,
        text: &str,
        min_length: usize,
        max_length: usize,
    ) -> Result<Summary, SummarizeError> {
        let bounds = LengthBounds::new(min_length, max_length).ok_or(
            SummarizeError::InvalidBounds {
                min: min_length,
                max: max_length,
            },
        )?;

        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return Err(SummarizeError::EmptyInput);
        }

        let (input, truncated) = self.fit_input(text, &tokens)?;
        let input_tokens = tokens.len().min(self.max_input_tokens);

        tracing::info!(
            model = self.model.name(),
            input_tokens,
            min = bounds.min,
            max = bounds.max,
            "summarizing"
        );
        let raw = self.model.generate(&input, bounds).await?;

        let text = fit_output(&raw, bounds)?;
        Ok(Summary::new(text, input_tokens, truncated))
    }

    fn fit_input(&self, text: &str, tokens: &[&str]) -> Result<(String, bool), SummarizeError> {
        if tokens.len() <= self.max_input_tokens {
            return Ok((text.trim().to_string(), false));
        }

        match self.overflow {
            OverflowPolicy::Reject => Err(SummarizeError::InputTooLong {
                tokens: tokens.len(),
                limit: self.max_input_tokens,
            }),
            OverflowPolicy::Truncate => {
                tracing::warn!(
                    tokens = tokens.len(),
                    limit = self.max_input_tokens,
                    "input exceeds the model budget, truncating"
                );
                Ok((tokens[..self.max_input_tokens].join(" "), true))
            }
        }
    }
}

/// Enforce the upper bound on model output
fn fit_output(raw: &str, bounds: LengthBounds) -> Result<String, SummarizeError> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(SummarizeError::EmptyOutput);
    }

    if tokens.len() > bounds.max {
        tracing::debug!(tokens = tokens.len(), max = bounds.max, "cutting summary to max length");
        return Ok(tokens[..bounds.max].join(" "));
    }
    if tokens.len() < bounds.min {
        tracing::warn!(tokens = tokens.len(), min = bounds.min, "summary is shorter than requested");
    }
    Ok(raw.trim().to_string())
}

/// One-time initialization guard for a summarizer handle.
pub struct ModelCell {
    cell: OnceCell<SummarizerHandle>,
}

impl ModelCell {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    /// Return the handle, running `load` only if nothing is loaded yet.
    /// Concurrent callers wait for the first load instead of starting another.
    pub async fn get_or_init<F, Fut>(&self, load: F) -> Result<SummarizerHandle, SummarizeError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Summarizer, SummarizeError>>,
    {
        let handle = self
            .cell
            .get_or_try_init(|| async move { load().await.map(Arc::new) })
            .await?;
        Ok(Arc::clone(handle))
    }

    pub fn get(&self) -> Option<SummarizerHandle> {
        self.cell.get().cloned()
    }
}

impl Default for ModelCell {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_MODEL: ModelCell = ModelCell::new();

/// Load the process-wide summarizer, or return the one already loaded.
pub async fn initialize(config: &Config) -> Result<SummarizerHandle, SummarizeError> {
    GLOBAL_MODEL
        .get_or_init(move || async move { Summarizer::load(config) })
        .await
}
