//! Summary types shared by the model and the summarizer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The condensed text plus how the input was fed to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,
    /// Tokens of input the model actually saw
    pub input_tokens: usize,
    /// Whether the input was cut to the model's input budget
    pub truncated: bool,
}

impl Summary {
    pub fn new(text: String, input_tokens: usize, truncated: bool) -> Self {
        Self {
            text,
            input_tokens,
            truncated,
        }
    }

    pub fn token_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Output length bounds in tokens, `min <= max` and `max > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

impl LengthBounds {
    pub fn new(min: usize, max: usize) -> Option<Self> {
        (max > 0 && min <= max).then_some(Self { min, max })
    }
}

/// Shape the model is asked to answer in.
///
/// This schema is embedded in the prompt so the reply can be parsed back.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SummaryResponse {
    /// The abstractive summary of the supplied text
    pub summary_text: String,
}
