use crate::llm::{LlmSettings, Provider};
use clap::{Parser, Subcommand};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE", global = true)]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT", global = true)]
    pub port: Option<u16>,

    /// Enable per-client rate limiting
    #[arg(long, env = "RATE_LIMIT_ENABLED", global = true)]
    pub rate_limit_enabled: Option<bool>,

    /// Origin of the answer server the chat client talks to
    #[arg(long, env = "ANSWER_BASE_URL", global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Command {
    /// Run the answer server (default)
    #[default]
    Serve,
    /// Chat with an answer server from the terminal
    Chat,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub guardrails: GuardrailsConfig,
    pub resilience: ResilienceConfig,
    pub logging: LoggingConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub static_dir: PathBuf,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GuardrailsConfig {
    /// Longest accepted query, in characters.
    pub max_query_chars: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    pub rate_limit_enabled: bool,
    pub requests_per_minute: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// File the server appends its log lines to.
    pub file: PathBuf,
    /// Number of trailing lines served by `GET /api/logs`.
    pub tail_lines: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Sent as `X-API-Key` when present.
    pub api_key: Option<String>,
}

impl AppConfig {
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(&cli)
    }

    /// Priority: CLI flag > CLI env var > `GQA_` env > config file > defaults.
    pub fn from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.static_dir", "static")?
            .set_default(
                "server.allowed_origins",
                vec!["http://localhost:3000", "http://localhost:8000"],
            )?
            .set_default("guardrails.max_query_chars", 1000)?
            .set_default("resilience.rate_limit_enabled", true)?
            .set_default("resilience.requests_per_minute", 5)?
            .set_default("logging.file", "app.log")?
            .set_default("logging.tail_lines", 100)?
            .set_default("client.base_url", "http://127.0.0.1:8000")?;

        // Explicit file must exist; ./config.* is picked up when present.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::from(Path::new(path))),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // E.g. GQA_SERVER__PORT=9000, GQA_CLIENT__API_KEY=...
        builder = builder.add_source(
            Environment::with_prefix("GQA")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("server.allowed_origins")
                .try_parsing(true),
        );

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(rl) = cli.rate_limit_enabled {
            builder = builder.set_override("resilience.rate_limit_enabled", rl)?;
        }
        if let Some(base_url) = &cli.base_url {
            builder = builder.set_override("client.base_url", base_url.as_str())?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}

pub fn load_llm_settings() -> Result<LlmSettings, String> {
    let base_url = env::var("LLM_BASE_URL")
        .map_err(|_| "Missing required env var: LLM_BASE_URL".to_string())?;
    if base_url.trim().is_empty() {
        return Err("LLM_BASE_URL cannot be empty".to_string());
    }

    let model =
        env::var("LLM_MODEL").map_err(|_| "Missing required env var: LLM_MODEL".to_string())?;
    if model.trim().is_empty() {
        return Err("LLM_MODEL cannot be empty".to_string());
    }

    let api_key = env::var("LLM_API_KEY")
        .ok()
        .filter(|s| !s.trim().is_empty());

    // Auto-detect provider from base URL
    let provider = Provider::detect_from_url(&base_url);

    Ok(LlmSettings {
        base_url,
        api_key,
        model,
        provider,
    })
}
