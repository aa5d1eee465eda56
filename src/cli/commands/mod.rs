//! CLI parser and command dispatch.

mod models;
mod serve;
mod summarize;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::{load_settings, Settings};
use crate::llm::{GeminiClient, TextGenerator};

#[derive(Parser)]
#[command(name = "papersum")]
#[command(about = "Research paper summarizer and literature review service")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default from config, 127.0.0.1:5001)
        #[arg(long, short)]
        bind: Option<String>,
    },

    /// Summarize a paper file and print the JSON result
    Summarize {
        /// PDF, DOCX, or TXT file
        file: PathBuf,
    },

    /// List provider models and show which candidate would be selected
    Models,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Serve { bind } => serve::cmd_serve(settings, bind).await,
        Commands::Summarize { file } => summarize::cmd_summarize(settings, &file).await,
        Commands::Models => models::cmd_models(&settings).await,
    }
}

/// Build the Gemini client, refusing to start without an API key.
fn gemini_client(settings: &Settings) -> anyhow::Result<Arc<dyn TextGenerator>> {
    if !settings.llm.has_api_key() {
        anyhow::bail!("GEMINI_API_KEY is not set. Add it to the environment or a .env file.");
    }
    Ok(Arc::new(GeminiClient::new(settings.llm.clone())?))
}
