//! Precis CLI - summarise text, PDF documents and YouTube videos
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use precis::extract::ExtractError;
use precis::ui::{self, Mode};
use precis::{Config, Extractor, RawInput, Workflow, WorkflowError};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "precis")]
#[command(author, version, about = "Summarise text, PDF documents and YouTube videos", long_about = None)]
struct Cli {
    /// Path to a precis.toml to use instead of the default lookup
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarise text given as an argument, piped on stdin, or typed in your editor
    Text {
        text: Option<String>,
        /// Show the normalized text instead of a summary
        #[arg(long)]
        raw: bool,
    },
    /// Summarise a PDF document
    Document {
        path: PathBuf,
        /// Show the extracted text instead of a summary
        #[arg(long)]
        raw: bool,
    },
    /// Summarise the transcript of a YouTube video
    Video {
        url: String,
        /// Caption language code (defaults to transcript.default_language)
        #[arg(short, long)]
        lang: Option<String>,
        /// Show the transcript instead of a summary
        #[arg(long)]
        raw: bool,
    },
    /// Print shell completions
    Completions { shell: Shell },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    precis::setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<WorkflowError>() {
            Some(err) => ui::render_error(err),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::load()?,
    };

    let (mode, input, raw) = match cli.command {
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "precis", &mut std::io::stdout());
            return Ok(());
        }
        Some(Commands::Text { text, raw }) => {
            let text = match text {
                Some(text) => text,
                None => read_text().map_err(|e| WorkflowError::Extract(ExtractError::Io(e)))?,
            };
            (Mode::Text, RawInput::PlainText(text), raw)
        }
        Some(Commands::Document { path, raw }) => {
            println!("Reading: {}", path.display());
            let input = RawInput::read_document(&path).map_err(WorkflowError::from)?;
            (Mode::Document, input, raw)
        }
        Some(Commands::Video { url, lang, raw }) => {
            let language = lang.unwrap_or_else(|| config.transcript.default_language.clone());
            println!("Fetching transcript ({}): {}", language, url);
            (Mode::Video, RawInput::VideoReference { url, language }, raw)
        }
        None => {
            // Default: interactive menu
            let summarizer = precis::initialize(&config).await?;
            let workflow = Workflow::new(&config, summarizer)?;
            return ui::run(&workflow, &config).await;
        }
    };

    if raw {
        // Just show the extracted text, no model needed
        let extractor = Extractor::new(&config)?;
        let text = extractor.extract(input).await?;
        ui::render_extracted(&text);
        return Ok(());
    }

    let summarizer = precis::initialize(&config).await?;
    let workflow = Workflow::new(&config, summarizer)?;
    let outcome = workflow.run(input).await?;
    println!();
    ui::render_outcome(mode, &outcome);
    Ok(())
}

/// Read text from stdin when piped, otherwise open the user's editor
fn read_text() -> std::io::Result<String> {
    if atty::isnt(atty::Stream::Stdin) {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        edit::edit("")
    }
}
