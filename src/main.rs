//! GestureCall - hand gestures that click and navigate browser tabs.
//!
//! Main entry point for the GestureCall CLI.

mod adapters;
mod cli;
mod control;
mod cmd_classify;
mod cmd_run;
mod cmd_serve;
mod cmd_settings;

use std::path::Path;

use clap::Parser;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use gesturecall_config::{Config, ConfigLoader, ConfigValidator};

use crate::adapters::gesturecall_dir;
use crate::cli::{Cli, Commands};

/// Initialize tracing with console and file output.
///
/// Log files are written to ~/.gesturecall/logs/ with daily rotation.
fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = gesturecall_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("gesturecall")
        .filename_suffix("log")
        .max_log_files(14)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the writer alive for the program duration.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true).with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Load the config file, falling back to defaults when the default path is absent.
fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let config = if path.exists() {
        ConfigLoader::load(path)?
    } else if path == Path::new("config/default.toml") {
        ConfigLoader::load_or_default(None)?
    } else {
        // An explicit path that does not exist is an error.
        ConfigLoader::load(path)?
    };

    let result = ConfigValidator::validate(&config)?;
    for warning in &result.warnings {
        warn!("config {}: {}", warning.path, warning.message);
    }
    result.ensure_valid()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        None => cmd_run::run(&config, None, None).await,
        Some(Commands::Run { debug_url, tab_filter }) => cmd_run::run(&config, debug_url, tab_filter).await,
        Some(Commands::Serve { host, port }) => cmd_serve::serve(&config, host, port).await,
        Some(Commands::Classify { fixture, format }) => {
            info!("Classifying {}", fixture.display());
            cmd_classify::classify_fixture(&fixture, &format).await
        }
        Some(Commands::Settings { action }) => cmd_settings::handle_settings_command(&config, action).await,
    }
}
