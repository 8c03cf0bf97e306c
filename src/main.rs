mod api;
mod cli;
mod config;
mod error;
mod models;
mod orchestrator;
mod preflight;
mod probe;
mod process;

use clap::Parser;
use cli::{App, Cli};
use colored::*;
use std::env;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name prefix of the optional rolling log written to `LAUNCHER_LOG_DIR`.
const LOG_FILE_PREFIX: &str = "musicbot-launcher.log";

/// Logs go to stderr so stdout stays free for progress lines. When
/// `LAUNCHER_LOG_DIR` is set, a daily rolling file receives the same events.
fn init_logging() -> Option<WorkerGuard> {
    let (file_layer, guard) = match env::var_os("LAUNCHER_LOG_DIR") {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env feeds the same fallbacks as real environment variables (and RUST_LOG)
    dotenv::dotenv().ok();
    let log_guard = init_logging();

    let cli = Cli::parse();
    info!("Starting musicbot launcher...");

    match App::new(cli, log_guard).run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("Launcher failed: {:?}", e);
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::from(e.exit_code())
        },
    }
}
