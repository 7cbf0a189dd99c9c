//! Terminal presentation: the interactive menu and result rendering.
//!
//! Uses dialoguer for prompts, edit for multi-line text entry, colored for output.

use crate::config::Config;
use crate::extract::{ExtractError, ExtractedText, RawInput};
use crate::workflow::{Outcome, Workflow, WorkflowError};
use colored::Colorize;
use dialoguer::{Input, Select};

/// Longest input preview printed next to a summary
const PREVIEW_CHARS: usize = 1200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Text,
    Document,
    Video,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Text, Mode::Document, Mode::Video];

    pub fn label(self) -> &'static str {
        match self {
            Mode::Text => "Summarize Text",
            Mode::Document => "Summarize Document",
            Mode::Video => "Summarize YouTube Video",
        }
    }

    /// Heading shown above the input next to the summary
    pub fn input_heading(self) -> &'static str {
        match self {
            Mode::Text => "Your Input Text",
            Mode::Document => "Extracted Text",
            Mode::Video => "Transcript",
        }
    }

    /// Transcripts are long; the video view shows only the summary
    pub fn shows_input(self) -> bool {
        !matches!(self, Mode::Video)
    }
}

/// Run the interactive menu until the user quits. A failed request is
/// reported and the menu comes back.
pub async fn run(workflow: &Workflow, config: &Config) -> anyhow::Result<()> {
    let mut labels: Vec<&str> = Mode::ALL.iter().map(|m| m.label()).collect();
    labels.push("Quit");

    loop {
        let choice = Select::new()
            .with_prompt("Select your choice")
            .items(&labels)
            .default(0)
            .interact()?;

        let Some(mode) = Mode::ALL.get(choice).copied() else {
            return Ok(());
        };

        println!("\n{}\n", mode.label().bold().underline());
        let input = match prompt_input(mode, config) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(e) => {
                render_error(&e);
                continue;
            }
        };

        if mode == Mode::Video {
            println!("{}", "Extracting transcript...".dimmed());
        }
        match workflow.run(input).await {
            Ok(outcome) => render_outcome(mode, &outcome),
            Err(e) => render_error(&e),
        }
        println!();
    }
}

/// Ask for the input of `mode`. `None` means the user gave nothing.
fn prompt_input(mode: Mode, config: &Config) -> Result<Option<RawInput>, WorkflowError> {
    let input = match mode {
        Mode::Text => {
            let text = edit::edit("").map_err(ExtractError::Io)?;
            if text.trim().is_empty() {
                return Ok(None);
            }
            RawInput::PlainText(text)
        }
        Mode::Document => {
            let path: String = Input::new()
                .with_prompt("Path to your PDF document")
                .interact_text()
                .map_err(dialoguer_io)?;
            RawInput::read_document(path.trim())?
        }
        Mode::Video => {
            let url: String = Input::new()
                .with_prompt("Enter YouTube Video URL")
                .interact_text()
                .map_err(dialoguer_io)?;
            let languages = &config.transcript.languages;
            let default = languages
                .iter()
                .position(|l| *l == config.transcript.default_language)
                .unwrap_or(0);
            let language = if languages.is_empty() {
                config.transcript.default_language.clone()
            } else {
                let index = Select::new()
                    .with_prompt("Select language")
                    .items(languages)
                    .default(default)
                    .interact()
                    .map_err(dialoguer_io)?;
                languages[index].clone()
            };
            RawInput::VideoReference { url, language }
        }
    };
    Ok(Some(input))
}

fn dialoguer_io(e: dialoguer::Error) -> WorkflowError {
    WorkflowError::Extract(ExtractError::Io(std::io::Error::other(e)))
}

/// Print the input (when the mode shows it) followed by the summary
pub fn render_outcome(mode: Mode, outcome: &Outcome) {
    if mode.shows_input() {
        println!("{}", mode.input_heading().bold());
        println!("{}\n", preview(outcome.extracted.as_str()).cyan());
    }

    println!("{}", "Summary Result".bold());
    println!("{}", outcome.summary.text.green());

    if outcome.summary.truncated {
        println!(
            "{}",
            format!(
                "(input cut to the first {} tokens)",
                outcome.summary.input_tokens
            )
            .yellow()
        );
    }
}

/// Print extracted text only, for `--raw`
pub fn render_extracted(text: &ExtractedText) {
    println!("{}", text);
    println!(
        "\n{}",
        format!("--- Extracted {} tokens ---", text.token_count()).dimmed()
    );
}

pub fn render_error(err: &WorkflowError) {
    eprintln!("{} {}", "Error:".red().bold(), err);
}

/// First `PREVIEW_CHARS` characters, on a char boundary
fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_string(),
    }
}
