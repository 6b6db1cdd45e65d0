//! Guarded Q&A
//!
//! `serve` (default) runs the answer server; `chat` runs the terminal client.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};

use clap::Parser;
use dotenvy::dotenv;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use guarded_qa::config::{AppConfig, Cli, Command, load_llm_settings};
use guarded_qa::{chat, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let cli = Cli::parse();
    let config = Arc::new(AppConfig::from_cli(&cli)?);

    match cli.command.unwrap_or_default() {
        Command::Serve => {
            init_server_tracing(&config.logging.file)?;

            let settings = match load_llm_settings() {
                Ok(s) => s,
                Err(msg) => {
                    eprintln!("Configuration error: {msg}");
                    std::process::exit(1);
                }
            };

            server::start_server(config, settings).await
        }
        Command::Chat => {
            // Keep stdout for the conversation.
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
                .init();

            chat::run(&config.client).await
        }
    }
}

/// Initialize tracing (M-LOG-STRUCTURED): console plus the log file behind `GET /api/logs`.
fn init_server_tracing(log_file: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    Ok(())
}
