//! Verifact CLI — verify claims in a passage of text from the terminal.
//!
//! Reads text from an argument, a file, or stdin, runs the verification
//! pipeline, and prints the report as human-readable text or JSON.

mod output;

use anyhow::Context;
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use verifact_core::{
    Analyst, DuckDuckGoSearch, InMemoryCache, VerificationPipeline, create_reasoner, load_config,
};

/// Verifact: claim extraction and fact verification for any text
#[derive(Parser, Debug)]
#[command(name = "verifact", version, about, long_about = None)]
struct Cli {
    /// Text to verify (reads stdin if omitted and --file is not set)
    text: Option<String>,

    /// Read the text from a file instead
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Output format: text or json
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Explain the passage instead of verifying it
    Explain,
    /// Summarize the passage instead of verifying it
    Summarize,
    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let workspace = std::env::current_dir().ok();
    let config = load_config(workspace.as_deref())
        .map_err(|e| anyhow::anyhow!("failed to load configuration: {e}"))?;
    tracing::debug!(provider = %config.llm.provider, model = %config.llm.model, "Configuration loaded");

    if matches!(cli.command, Some(Commands::Config)) {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let text = read_input(&cli)?;
    if text.trim().is_empty() {
        anyhow::bail!("no input text provided (pass text as an argument, via --file, or on stdin)");
    }

    let reasoner =
        create_reasoner(&config.llm).map_err(|e| anyhow::anyhow!("provider setup failed: {e}"))?;

    match cli.command {
        Some(Commands::Explain) => {
            let analyst = Analyst::new(reasoner, config.llm.clone());
            println!("{}", analyst.explain(&text).await?);
        }
        Some(Commands::Summarize) => {
            let analyst = Analyst::new(reasoner, config.llm.clone());
            println!("{}", analyst.summarize(&text).await?);
        }
        Some(Commands::Config) => unreachable!("handled above"),
        None => {
            let search = Arc::new(
                DuckDuckGoSearch::new(config.search.timeout_secs)
                    .map_err(|e| anyhow::anyhow!("search setup failed: {e}"))?,
            );
            let cache = Arc::new(InMemoryCache::new(Duration::from_secs(
                config.pipeline.cache_ttl_secs,
            )));
            let pipeline = VerificationPipeline::new(reasoner, search, cache, &config);

            let result = pipeline.verify(&text).await;
            match cli.format {
                OutputFormat::Text => print!("{}", output::render_text(&result)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            }
        }
    }

    Ok(())
}

fn read_input(cli: &Cli) -> anyhow::Result<String> {
    if let Some(ref text) = cli.text {
        return Ok(text.clone());
    }
    if let Some(ref path) = cli.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf)
}
