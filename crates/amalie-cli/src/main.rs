//! amalie - command-line console for the compliance-screening service.
//!
//! Logs in, screens entities, submits transactions for monitoring and reads
//! dashboard analytics and audit logs from the remote service.

mod cli;
mod commands;

use std::io;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use amalie_core::{ApiClient, Config, Session};

use cli::Cli;

/// Log file name prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "amalie.log";

/// Initialize the tracing subscriber for logging.
///
/// Use RUST_LOG to control the level (e.g. RUST_LOG=debug). When the cache
/// directory is known, everything is also written to a daily log file.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match config.cache_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir.join("logs"), LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = Config::load()?;
    let _guard = init_tracing(&config);
    info!(base_url = %config.api_base_url(), "amalie starting");

    let session = Session::restore(config.build_token_store()?).into_shared();
    let api = ApiClient::new(&config, session)?;

    let result = commands::run(cli.command, &api, &mut config).await;

    debug!("amalie finished");
    result
}
