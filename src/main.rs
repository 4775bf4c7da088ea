//! textsummary CLI - summarise text with Azure OpenAI
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and presenting errors. Every run exits successfully;
//! failures are printed to stdout.

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use textsummary::app::input_acquirer;
use textsummary::{
    AzureOpenAiClient, ConsolePrompt, Flags, InputError, InputSource, RunConfig, Settings,
    Summariser, SummariserError,
};
use tracing_subscriber::EnvFilter;

/// Diagnostics stay off stderr unless something is badly wrong
const DEFAULT_LOG_LEVEL: &str = "error";

#[derive(Parser, Debug)]
#[command(name = "textsummary")]
#[command(author, version, about = "Summarise text, documents and webpages with Azure OpenAI", long_about = None)]
struct Cli {
    /// Path to a text file for input text (TXT, DOCX or PDF)
    #[arg(long)]
    file: Option<PathBuf>,
    /// URL to read input text from
    #[arg(long)]
    url: Option<String>,
    /// Show token usage and cost statistics
    #[arg(long)]
    stats: bool,
    /// Use the premium (GPT-4) deployment for summarisation
    #[arg(long)]
    gpt4: bool,
    /// Settings file (defaults to ./textsummary.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the maximum number of generated tokens
    #[arg(long)]
    max_tokens: Option<u32>,
    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    if let Err(err) = run(cli).await {
        tracing::debug!(error = ?err, "run failed");
        match err {
            e if e.is_cancelled() => {}
            SummariserError::InputError(InputError::EmptyPrompt) => {
                println!("{}", InputError::EmptyPrompt.to_string().yellow())
            }
            e => println!("{}", e.to_string().red()),
        }
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<(), SummariserError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!("failed to load .env: {}", e);
        }
    }

    let settings = Settings::load(cli.config.as_deref())?;
    let flags = Flags {
        premium: cli.gpt4,
        stats: cli.stats,
        max_tokens: cli.max_tokens,
    };
    let config = RunConfig::from_env(&settings, flags)?;
    tracing::debug!(deployment = %config.deployment, tier = ?config.tier, "resolved configuration");

    let client = AzureOpenAiClient::from_config(&config)?;
    let acquirer = input_acquirer(&config)?;
    let source = InputSource::select(cli.file, cli.url);

    let mut stdout = std::io::stdout();
    Summariser::new(&config, &client, acquirer)
        .run(&source, &mut ConsolePrompt, &mut stdout)
        .await
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(rust_log.as_deref(), verbose)?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
    Ok(())
}

/// `RUST_LOG` when set and valid, otherwise errors only; `-v` adds crate debug
fn build_filter(rust_log: Option<&str>, verbose: bool) -> anyhow::Result<EnvFilter> {
    let filter = rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL));
    if !verbose {
        return Ok(filter);
    }
    Ok(filter.add_directive(
        "textsummary=debug"
            .parse()
            .context("could not parse env filter")?,
    ))
}
