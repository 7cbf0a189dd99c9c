//! # Precis
//!
//! Abstractive summaries of pasted text, PDF documents and YouTube transcripts.
//!
//! ## Features
//!
//! - **Three sources, one text**: plain text, PDF pages and caption tracks all normalize to `ExtractedText`
//! - **One model per process**: the summarizer is loaded once and shared as a `SummarizerHandle`
//! - **Bounded output**: summaries respect min/max token lengths and an input budget

pub mod config;
pub mod extract;
pub mod model;
pub mod summarizer;
pub mod summary;
pub mod transcript;
pub mod ui;
pub mod video;
pub mod workflow;

pub use config::Config;
pub use extract::{ExtractedText, RawInput};
pub use summarizer::{initialize, Summarizer, SummarizerHandle};
pub use summary::Summary;
pub use workflow::{Extractor, Outcome, Workflow, WorkflowError};

/// Install the stderr log subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `verbosity` picks warn, info or debug.
pub fn setup_logging(verbosity: u8) {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let default_filter = match verbosity {
        0 => "warn",
        1 => "warn,precis=info",
        _ => "info,precis=debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
