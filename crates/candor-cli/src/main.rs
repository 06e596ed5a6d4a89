//! `candor` - evaluate, rewrite, and compare documents with LLM assessors.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use candor_core::{AnalysisResponse, EvaluationRequest, EvaluationType, ProtocolMode, ProviderKind};
use candor_runtime::{
    render_plain, ComparisonRunner, ProtocolEngine, ProviderRegistry, RewriteOrchestrator,
    RewriteRequest, RuntimeConfig, StreamEvent, StreamingRelay,
};

#[derive(Parser)]
#[command(name = "candor", version, about = "Multi-phase LLM document evaluation")]
struct Cli {
    /// Optional YAML config file (runtime settings + per-provider config).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the evaluation protocol on a document.
    Evaluate {
        /// Input file; stdin when omitted.
        file: Option<PathBuf>,

        #[arg(long, default_value = "anthropic")]
        provider: String,

        /// intelligence | originality | cogency | overall_quality
        #[arg(long = "type", default_value = "intelligence")]
        evaluation_type: String,

        /// Phase-1-only quick evaluation.
        #[arg(long)]
        normal: bool,

        /// Stream the assessor's output as it arrives.
        #[arg(long)]
        stream: bool,

        /// Print the buffered JSON payload instead of the report.
        #[arg(long)]
        json: bool,
    },

    /// Rewrite a document to score higher, reporting both scores.
    Rewrite {
        /// Input file; stdin when omitted.
        file: Option<PathBuf>,

        #[arg(long, default_value = "anthropic")]
        provider: String,

        /// Extra instructions appended to the rewrite prompt.
        #[arg(long)]
        instructions: Option<String>,

        /// Use quick evaluations for the before/after scores.
        #[arg(long)]
        normal: bool,
    },

    /// Evaluate two documents concurrently and compare them.
    Compare {
        file_a: PathBuf,
        file_b: PathBuf,

        #[arg(long, default_value = "anthropic")]
        provider: String,

        #[arg(long = "type", default_value = "intelligence")]
        evaluation_type: String,
    },
}

/// On-disk configuration: runtime settings plus per-provider JSON blocks
/// handed to the factories (api_key, base_url, model).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    runtime: Option<RuntimeConfig>,
    providers: BTreeMap<String, serde_json::Value>,
}

fn load_config(path: Option<&Path>) -> Result<FileConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            serde_yaml::from_str(&raw)
                .with_context(|| format!("parsing config file {}", path.display()))
        }
        None => Ok(FileConfig::default()),
    }
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading stdin")?;
            Ok(text)
        }
    }
}

fn runtime_config(file_config: &FileConfig, normal: bool) -> RuntimeConfig {
    let mut config = file_config.runtime.clone().unwrap_or_default();
    if normal {
        config.mode = ProtocolMode::Normal;
    }
    config
}

fn create_provider(
    registry: &ProviderRegistry,
    file_config: &FileConfig,
    provider: &str,
) -> Result<(ProviderKind, std::sync::Arc<dyn candor_runtime::LlmProvider>)> {
    let kind = ProviderKind::from_str(provider)?;
    let provider_config = file_config
        .providers
        .get(kind.as_str())
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));
    let instance = registry
        .create_kind(kind, &provider_config)
        .with_context(|| format!("creating provider '{}'", kind))?;
    Ok((kind, instance))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let file_config = load_config(cli.config.as_deref())?;
    let registry = ProviderRegistry::with_defaults();

    match cli.command {
        Command::Evaluate {
            file,
            provider,
            evaluation_type,
            normal,
            stream,
            json,
        } => {
            let text = read_input(file.as_deref())?;
            let (kind, instance) = create_provider(&registry, &file_config, &provider)?;
            let evaluation_type = EvaluationType::from_str(&evaluation_type)?;
            let request = EvaluationRequest::new(text, kind, evaluation_type)?;
            let config = runtime_config(&file_config, normal);
            let engine = ProtocolEngine::new(instance, config);

            if stream {
                let relay = StreamingRelay::new();
                let mut sink = |event: StreamEvent| {
                    print!("{}", render_plain(&event));
                    std::io::stdout().flush().ok();
                };
                let result = engine.run_streaming(&request, &relay, &mut sink).await?;
                println!();
                tracing::info!(score = result.final_score, "evaluation complete");
            } else {
                let result = engine.run(&request).await?;
                if json {
                    let payload = AnalysisResponse::from(&result);
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                } else {
                    println!("{}", result.formatted_report);
                }
            }
        }

        Command::Rewrite {
            file,
            provider,
            instructions,
            normal,
        } => {
            let text = read_input(file.as_deref())?;
            let (kind, instance) = create_provider(&registry, &file_config, &provider)?;
            let config = runtime_config(&file_config, normal);
            let orchestrator = RewriteOrchestrator::new(instance, kind, config);

            let mut request = RewriteRequest::new(text);
            if let Some(instructions) = instructions {
                request = request.with_instructions(instructions);
            }

            let result = orchestrator.rewrite(request).await?;
            println!("{}", result.delta_report);
            println!("\n--- REWRITTEN TEXT ---\n");
            println!("{}", result.rewritten_text);
        }

        Command::Compare {
            file_a,
            file_b,
            provider,
            evaluation_type,
        } => {
            let text_a = read_input(Some(&file_a))?;
            let text_b = read_input(Some(&file_b))?;
            let (kind, instance) = create_provider(&registry, &file_config, &provider)?;
            let evaluation_type = EvaluationType::from_str(&evaluation_type)?;
            let config = runtime_config(&file_config, false);
            let runner = ComparisonRunner::new(instance, kind, config);

            let outcome = runner.compare(&text_a, &text_b, evaluation_type).await?;
            println!(
                "Document A: {}/100\nDocument B: {}/100\nWinner: Document {}\n",
                outcome.insights_a.score,
                outcome.insights_b.score,
                outcome.winner.label()
            );
            println!("{}", outcome.final_judgment);
            tracing::info!(
                calls = outcome.usage.llm_calls,
                tokens = outcome.usage.total_tokens,
                "comparison complete"
            );
        }
    }

    Ok(())
}
