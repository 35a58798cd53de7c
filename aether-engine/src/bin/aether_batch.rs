//! `aether-batch` — run a batch of player messages through the NPC engine.
//!
//! ```text
//! aether-batch --input players.json --output logs/run.jsonl
//! aether-batch --config aether.toml --parallel --format csv
//! aether-batch --offline            # no backend, fallback lines only
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use aether_core::AetherConfig;
use aether_core::config::GenerationConfig;
use aether_engine::input::load_messages;
use aether_engine::output::{OutputFormat, RecordWriter};
use aether_engine::{EngineError, Orchestrator, telemetry};
use aether_llm::prompt::PromptTemplate;
use aether_llm::{LlmClient, LlmProvider};

#[derive(Debug, Parser)]
#[command(name = "aether-batch", version, about = "Generate NPC replies for a batch of player messages.")]
struct Cli {
    /// JSON array of `{player_id, text, timestamp}` records.
    #[arg(long, short, default_value = "players.json")]
    input: PathBuf,

    /// Output file. Defaults to `logs/run.<format>`.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Output format: jsonl, json or csv.
    #[arg(long, short, default_value = "jsonl")]
    format: OutputFormat,

    /// TOML configuration file.
    #[arg(long, short, env = "AETHER_CONFIG")]
    config: Option<PathBuf>,

    /// TOML prompt template replacing the built-in one.
    #[arg(long)]
    prompt: Option<PathBuf>,

    /// Process players concurrently.
    #[arg(long)]
    parallel: bool,

    /// Skip the language model; every reply is a fallback line.
    #[arg(long)]
    offline: bool,

    /// Emit logs as JSON objects.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AetherConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AetherConfig::default(),
    };
    if cli.parallel {
        config.generation.parallel = true;
    }
    if cli.offline {
        config.generation.provider = "none".into();
    }

    telemetry::try_init(&config.general.log_level, cli.json_logs).context("installing log subscriber")?;
    info!(provider = %config.generation.provider, model = %config.generation.model, "starting aether-batch");

    let client = build_client(&config.generation);
    let mut engine = Orchestrator::from_config(&config, Arc::new(client))?;
    if let Some(path) = &cli.prompt {
        let template = PromptTemplate::from_file(path).map_err(EngineError::Template)?;
        info!(version = %template.version, "using custom prompt template");
        engine = engine.with_template(template);
    }

    let raw = load_messages(&cli.input).with_context(|| format!("reading {}", cli.input.display()))?;
    let report = engine.run(raw).await?;

    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from("logs").join(format!("run.{}", cli.format.extension())));
    RecordWriter::new(cli.format)
        .write_to_path(&report.records, &output)
        .with_context(|| format!("writing {}", output.display()))?;

    for rejection in &report.skipped {
        eprintln!("skipped input #{}: {}", rejection.index, rejection.error);
    }
    println!("{} -> {}", report.summary(), output.display());
    Ok(())
}

/// Build the configured client, degrading to the offline client when the
/// backend cannot be set up (no API key, unknown provider).
fn build_client(generation: &GenerationConfig) -> LlmClient {
    let api_key = std::env::var(&generation.api_key_env)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty());

    match LlmProvider::from_name(&generation.provider, &generation.base_url, api_key) {
        Ok(LlmProvider::None) => {
            info!("no generation backend; using fallback responses");
            LlmClient::none()
        }
        Ok(provider) => LlmClient::new(provider, generation.model.clone(), generation.max_retries)
            .with_retry_backoff(Duration::from_millis(generation.retry_backoff_ms)),
        Err(err) => {
            warn!(provider = %generation.provider, %err, "generation backend unavailable; using fallback responses");
            LlmClient::none()
        }
    }
}
