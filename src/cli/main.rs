//! bgcutout CLI
//!
//! A path argument and `-` (stdin) are the two ways a photo enters the
//! pipeline; both end up in `UploadOrchestrator::handle_upload`.

use super::config::CliConfigBuilder;
use super::sink::FileSink;
use crate::{
    client::RemoveBgClient,
    messages::Messages,
    orchestrator::UploadOrchestrator,
    prompt::ConsolePrompter,
    tracing_config::{TracingConfig, TracingFormat},
    types::{RawFile, UNKNOWN_MIME},
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Remove photo backgrounds with remove.bg
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgcutout")]
pub struct Cli {
    /// Input image files (use "-" for stdin)
    #[arg(value_name = "INPUT", required = true)]
    pub input: Vec<String>,

    /// Directory receiving the original and cutout images
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// remove.bg API key; without one the mock remover is used
    #[arg(long, env = "REMOVE_BG_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Removal endpoint
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Delay of the mock remover in milliseconds
    #[arg(long, value_name = "MS")]
    pub mock_delay_ms: Option<u64>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// What to do when the remote call fails
    #[arg(long, value_enum, default_value_t = CliFallback::Ask)]
    pub fallback: CliFallback,

    /// Language of alerts and prompts
    #[arg(long, value_enum, default_value_t = CliLocale::En)]
    pub lang: CliLocale,

    /// Declared MIME type for stdin input (detected from content if omitted)
    #[arg(long, value_name = "TYPE")]
    pub mime: Option<String>,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Explicit tracing filter, e.g. "bgcutout=debug,reqwest=info"
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,

    /// Plain log output without colors
    #[arg(long)]
    pub compact_logs: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliFallback {
    Ask,
    Always,
    Never,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliLocale {
    En,
    ZhCn,
}

pub async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    init_tracing(&cli).context("Failed to initialize tracing")?;

    let config = CliConfigBuilder::from_cli(&cli).context("Invalid configuration")?;
    let messages = Messages::new(config.locale);

    if cli.input.iter().any(|i| i == "-") && cli.fallback == CliFallback::Ask {
        warn!("Reading the image from stdin; fallback questions will be declined");
    }

    let sink = Arc::new(
        FileSink::new(&cli.output_dir)
            .with_context(|| format!("Failed to prepare {}", cli.output_dir.display()))?,
    );
    // Prompts suspend the sink's spinner so the question stays readable
    let prompter = Arc::new(
        ConsolePrompter::new(messages, CliConfigBuilder::fallback_policy(cli.fallback))
            .with_overlay(sink.clone()),
    );
    let client = Arc::new(
        RemoveBgClient::new(config, prompter.clone()).context("Failed to create removal client")?,
    );
    if client.is_live() {
        info!("Using remove.bg at {}", client.config().endpoint);
    } else {
        info!("No API key configured, results will be produced by the mock remover");
    }

    let orchestrator =
        UploadOrchestrator::from_config(client.config(), client.clone(), sink.clone(), prompter);

    let start_time = Instant::now();
    let mut failed = 0usize;

    for input in &cli.input {
        let file = match load_input(input, cli.mime.as_deref()).await {
            Ok(file) => file,
            Err(e) => {
                warn!("Skipping {}: {:#}", input, e);
                failed += 1;
                continue;
            },
        };

        sink.set_target(file.stem());
        if let Err(e) = orchestrator.handle_upload(file).await {
            debug!(input = %input, error = %e, "Upload did not complete");
            failed += 1;
        }
    }

    info!(
        "Processed {} of {} input(s) in {:.2}s",
        cli.input.len() - failed,
        cli.input.len(),
        start_time.elapsed().as_secs_f64()
    );

    if failed > 0 {
        anyhow::bail!("{} input(s) failed", failed);
    }
    Ok(())
}

/// Build a [`RawFile`] from a path or from stdin (`-`)
async fn load_input(input: &str, mime_override: Option<&str>) -> Result<RawFile> {
    if input == "-" {
        let data = tokio::task::spawn_blocking(read_stdin)
            .await
            .context("stdin reader panicked")??;
        let mime = mime_override.map_or_else(|| detect_mime(&data), str::to_string);
        info!("Read {} bytes from stdin ({})", data.len(), mime);
        return Ok(RawFile::from_bytes("stdin", mime, data));
    }

    let mut file = RawFile::from_path(input)
        .await
        .with_context(|| format!("Cannot access input file: {}", input))?;
    if let Some(mime) = mime_override {
        file.mime = mime.to_string();
    }
    Ok(file)
}

fn read_stdin() -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    std::io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read image data from stdin")?;
    Ok(buffer)
}

/// MIME type of piped data, from its magic bytes
fn detect_mime(data: &[u8]) -> String {
    image::guess_format(data).map_or_else(
        |_| UNKNOWN_MIME.to_string(),
        |format| format.to_mime_type().to_string(),
    )
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let format = if cli.compact_logs {
        TracingFormat::Compact
    } else {
        TracingFormat::Console
    };

    let mut config = TracingConfig::new()
        .with_verbosity(cli.verbose)
        .with_format(format)
        .with_session_id(uuid::Uuid::new_v4().to_string());
    if let Some(filter) = &cli.log_filter {
        config = config.with_env_filter(filter.clone());
    }

    config.init()
}
