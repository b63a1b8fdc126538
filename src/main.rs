//! Algoscope - Main Entry Point
//!
//! Serves the visualizer HTTP API, or generates single traces from the
//! command line for frontend fixtures and quick inspection.

use algoscope::catalog::AlgorithmKind;
use algoscope::config::AppConfig;
use algoscope::observability::init_default_logging;
use algoscope::server::{self, AppState};
use algoscope::session::SessionStore;
use algoscope::tutor::{TutorService, TutorSettings};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

/// Step-trace backend for an algorithm visualizer
#[derive(Parser)]
#[command(name = "algoscope")]
#[command(about = "Step-trace backend for an algorithm visualizer")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve,
    /// Generate one trace and print the envelope JSON
    Trace {
        /// Algorithm wire name, e.g. bubble-sort
        algorithm: String,

        /// Read the input JSON from a file
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Read the input JSON from standard input
        #[arg(long)]
        stdin: bool,
    },
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting algoscope v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config).await {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve => run_server(config).await,
        Commands::Trace {
            algorithm,
            input,
            stdin,
        } => run_trace(config, algorithm, input, stdin).await,
        Commands::Config { show } => handle_config_command(config, show).await,
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<AppConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(AppConfig::load_from_file(path)?)
        }
        None => {
            // Try default locations; everything has a default, so a missing
            // file is not an error
            let default_paths = vec!["algoscope.toml", "config/algoscope.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(AppConfig::load_from_file(&path)?);
                }
            }

            info!("No configuration file found, using built-in defaults");
            Ok(AppConfig::default())
        }
    }
}

async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let provider = LlmProviderFactory::create_provider(&config)?;
    match provider.as_deref() {
        Some(p) => info!(provider = p.name(), "LLM tutor provider configured"),
        None => {
            info!("No LLM provider configured, tutor replies come from the rule-based fallback")
        }
    }

    let sessions = SessionStore::new(config.session.clone());
    let tutor = Arc::new(TutorService::new(
        provider,
        sessions.clone(),
        tutor_settings(&config),
    ));
    let state = AppState::new(config, tutor, sessions);

    // Graceful shutdown on SIGINT/SIGTERM
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    tokio::select! {
        result = server::run(state) => result?,
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }

    info!("Application shutdown complete");
    Ok(())
}

async fn run_trace(
    config: AppConfig,
    algorithm: String,
    input: Option<PathBuf>,
    stdin: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let kind: AlgorithmKind = algorithm.parse()?;

    let raw = match (&input, stdin) {
        (Some(path), false) => std::fs::read_to_string(path)?,
        (None, true) => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        _ => return Err("provide exactly one of --input <FILE> or --stdin".into()),
    };

    let value: Value = serde_json::from_str(&raw)?;
    let envelope = server::generate_trace(kind, value, &config.limits)?;
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

async fn handle_config_command(
    config: AppConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    if show {
        println!("{}", toml::to_string_pretty(&config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}

/// Provider factory for creating the tutor's LLM provider from configuration
struct LlmProviderFactory;

impl LlmProviderFactory {
    fn create_provider(
        config: &AppConfig,
    ) -> Result<Option<Arc<dyn algoscope::llm::provider::LlmProvider>>, Box<dyn std::error::Error>>
    {
        use algoscope::llm::providers::{
            AnthropicConfig, AnthropicProvider, OpenAiConfig, OpenAiProvider,
        };

        // No [llm] table means fallback-only mode
        let Some(llm) = &config.llm else {
            return Ok(None);
        };

        let api_key = llm.resolve_api_key()?;
        let timeout = Duration::from_secs(llm.timeout_secs);

        match llm.provider.as_str() {
            "anthropic" => {
                let mut anthropic_config = AnthropicConfig {
                    api_key,
                    timeout,
                    ..Default::default()
                };
                if let Some(base_url) = &llm.base_url {
                    anthropic_config.base_url = base_url.clone();
                }
                let provider = AnthropicProvider::new(anthropic_config)?;
                Ok(Some(Arc::new(provider)))
            }
            "openai" => {
                let mut openai_config = OpenAiConfig {
                    api_key,
                    timeout,
                    ..Default::default()
                };
                if let Some(base_url) = &llm.base_url {
                    openai_config.base_url = base_url.clone();
                }
                let provider = OpenAiProvider::new(openai_config)?;
                Ok(Some(Arc::new(provider)))
            }
            provider => Err(format!("Unsupported LLM provider: {provider}").into()),
        }
    }
}

fn tutor_settings(config: &AppConfig) -> TutorSettings {
    let defaults = TutorSettings::default();
    match &config.llm {
        Some(llm) => TutorSettings {
            model: llm.model.clone(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens.or(defaults.max_tokens),
            history_window: defaults.history_window,
        },
        None => defaults,
    }
}
