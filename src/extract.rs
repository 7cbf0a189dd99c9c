//! Text extraction for the plain-text and document inputs.
//!
//! Uses pdf-extract for page-level PDF text.

use std::fmt;
use std::panic;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("input is empty")]
    EmptyInput,
    #[error("not a readable PDF document: {0}")]
    DocumentParse(String),
    #[error("the document contains no extractable text")]
    NoExtractableText,
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

/// One unit of user input, consumed by a single workflow run.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    PlainText(String),
    DocumentBytes(Vec<u8>),
    VideoReference { url: String, language: String },
}

impl RawInput {
    /// Read a PDF from disk into a document input
    pub fn read_document<P: AsRef<Path>>(path: P) -> Result<Self, ExtractError> {
        let bytes = std::fs::read(path)?;
        Ok(RawInput::DocumentBytes(bytes))
    }

    /// Label used by the presentation layer
    pub fn kind(&self) -> &'static str {
        match self {
            RawInput::PlainText(_) => "text",
            RawInput::DocumentBytes(_) => "document",
            RawInput::VideoReference { .. } => "video",
        }
    }
}

/// Normalized text ready for summarization. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    /// Trim `text` and wrap it, or return `None` when nothing is left.
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.len() == text.len() {
            Some(Self(text))
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Whitespace-separated token count
    pub fn token_count(&self) -> usize {
        self.0.split_whitespace().count()
    }
}

impl fmt::Display for ExtractedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExtractedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Trim pasted text; whitespace-only input is an error.
pub fn extract_from_plain_text(text: &str) -> Result<ExtractedText, ExtractError> {
    ExtractedText::new(text).ok_or(ExtractError::EmptyInput)
}

/// Extract the text of every page of a PDF, in page order.
///
/// Pages without text are skipped. pdf-extract can panic on some malformed
/// files, so a panic is reported as a parse failure like any other.
pub fn extract_from_document(bytes: &[u8]) -> Result<ExtractedText, ExtractError> {
    if bytes.is_empty() {
        return Err(ExtractError::EmptyInput);
    }

    let pages = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|payload| ExtractError::DocumentParse(panic_message(payload.as_ref())))?
        .map_err(|e| ExtractError::DocumentParse(e.to_string()))?;

    let page_count = pages.len();
    let text = join_pages(pages);
    tracing::info!(pages = page_count, chars = text.len(), "extracted document text");

    ExtractedText::new(text).ok_or(ExtractError::NoExtractableText)
}

/// Concatenate page texts, skipping blank pages and keeping a line break
/// between pages so words do not run together.
fn join_pages<I>(pages: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut text = String::new();
    for (number, page) in pages.into_iter().enumerate() {
        if page.trim().is_empty() {
            tracing::debug!(page = number + 1, "skipping page without text");
            continue;
        }
        if !text.is_empty() && !text.ends_with(char::is_whitespace) {
            text.push('\n');
        }
        text.push_str(&page);
    }
    text
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "PDF parser aborted".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_trimmed() {
        let text = extract_from_plain_text("  \n Rust is a systems language.\t ").unwrap();
        assert_eq!(text.as_str(), "Rust is a systems language.");
    }

    #[test]
    fn plain_text_keeps_inner_whitespace() {
        let input = "first line\n\nsecond   line";
        assert_eq!(extract_from_plain_text(input).unwrap().as_str(), input);
    }

    #[test]
    fn blank_text_is_rejected() {
        for input in ["", "   ", "\n\t \r\n"] {
            assert!(matches!(
                extract_from_plain_text(input),
                Err(ExtractError::EmptyInput)
            ));
        }
    }

    #[test]
    fn garbage_bytes_are_not_a_document() {
        let result = extract_from_document(b"definitely not a pdf");
        assert!(matches!(result, Err(ExtractError::DocumentParse(_))));
    }

    #[test]
    fn empty_document_is_empty_input() {
        assert!(matches!(
            extract_from_document(&[]),
            Err(ExtractError::EmptyInput)
        ));
    }

    #[test]
    fn pages_join_in_order_and_blank_pages_are_skipped() {
        let pages = vec![
            "Page one.".to_string(),
            "   ".to_string(),
            "Page three.\n".to_string(),
            "Page four.".to_string(),
        ];
        assert_eq!(join_pages(pages), "Page one.\nPage three.\nPage four.");
    }

    #[test]
    fn all_blank_pages_give_nothing() {
        let pages = vec![String::new(), "\n".to_string()];
        assert!(ExtractedText::new(join_pages(pages)).is_none());
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = RawInput::read_document("/nonexistent/precis/input.pdf");
        assert!(matches!(result, Err(ExtractError::Io(_))));
    }

    #[test]
    fn token_count_splits_on_whitespace() {
        let text = ExtractedText::new("one two\nthree\t four").unwrap();
        assert_eq!(text.token_count(), 4);
    }
}
