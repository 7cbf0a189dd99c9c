//! Summarization model backends.
//!
//! Uses rstructor to talk to the hosted model; `SummarizationModel` is the
//! seam the summarizer is written against.

use crate::config::{Config, ConfigError};
use crate::summary::{LengthBounds, SummaryResponse};
use async_trait::async_trait;
use rstructor::{GeminiClient, GeminiModel, LLMClient};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    RequestFailed(String),
    #[error("failed to parse response: {0}")]
    ParseError(String),
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}

/// A loaded abstractive summarization model.
#[async_trait]
pub trait SummarizationModel: Send + Sync {
    /// Identifier used in logs
    fn name(&self) -> &str;

    /// Produce a summary of `text` aiming for `bounds` tokens.
    /// Decoding must be deterministic.
    async fn generate(&self, text: &str, bounds: LengthBounds) -> Result<String, ModelError>;
}

/// Gemini via rstructor, at temperature zero
pub struct GeminiBackend {
    client: GeminiClient,
    model: String,
    persona: String,
}

impl GeminiBackend {
    pub fn from_config(config: &Config) -> Result<Self, ModelError> {
        let api_key = config.api_key()?;

        let client = GeminiClient::new(api_key)
            .map_err(|e| ModelError::RequestFailed(e.to_string()))?
            .model(parse_gemini_model(&config.model.model))
            .temperature(0.0);

        Ok(Self {
            client,
            model: config.model.model.clone(),
            persona: config.model.persona.clone(),
        })
    }
}

#[async_trait]
impl SummarizationModel for GeminiBackend {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, text: &str, bounds: LengthBounds) -> Result<String, ModelError> {
        let prompt = build_prompt(&self.persona, text, bounds)?;

        let result = self
            .client
            .generate_with_metadata(&prompt)
            .await
            .map_err(|e| ModelError::RequestFailed(e.to_string()))?;

        parse_response(&result.text)
    }
}

/// Build the prompt including persona, length bounds, schema, and text
fn build_prompt(persona: &str, text: &str, bounds: LengthBounds) -> Result<String, ModelError> {
    let schema = serde_json::to_string_pretty(&schemars::schema_for!(SummaryResponse))
        .map_err(|e| ModelError::ParseError(e.to_string()))?;

    Ok(format!(
        r#"{persona}

Write an abstractive summary of the text below in your own words.
The summary must be between {min} and {max} words long.
Do not add facts that are not in the text.

You MUST respond with valid JSON matching this schema:
{schema}

Do not include any markdown formatting, code blocks, or explanations. Only output the raw JSON object.

---

{text}"#,
        min = bounds.min,
        max = bounds.max,
    ))
}

/// Decode the model reply. A reply that is plainly not JSON is taken as the
/// summary itself.
fn parse_response(raw: &str) -> Result<String, ModelError> {
    let cleaned = strip_markdown_json(raw);

    if !cleaned.starts_with('{') {
        tracing::debug!("model answered in plain text");
        return Ok(cleaned);
    }

    let response: SummaryResponse = serde_json::from_str(&cleaned)
        .map_err(|e| ModelError::ParseError(format!("{}: {}", e, cleaned)))?;
    Ok(response.summary_text.trim().to_string())
}

/// Strip markdown code block wrappers from JSON response
fn strip_markdown_json(text: &str) -> String {
    let trimmed = text.trim();

    if let Some(rest) = trimmed.strip_prefix("```") {
        let without_prefix = rest.strip_prefix("json").unwrap_or(rest);
        if let Some(end_idx) = without_prefix.rfind("```") {
            return without_prefix[..end_idx].trim().to_string();
        }
    }

    trimmed.to_string()
}

/// Parse a model string into a GeminiModel
fn parse_gemini_model(model: &str) -> GeminiModel {
    match model {
        "gemini-2.0-flash" => GeminiModel::Gemini20Flash,
        "gemini-2.5-flash" => GeminiModel::Gemini25Flash,
        "gemini-2.5-pro" => GeminiModel::Gemini25Pro,
        other => {
            tracing::warn!(model = other, "unknown model, using gemini-2.0-flash");
            GeminiModel::Gemini20Flash
        }
    }
}
