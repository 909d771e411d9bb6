//! ente-timefix - Repair capture times of exported photos and videos
//!
//! Reads the JSON sidecars of an exported photo library and writes the
//! capture time back into each image's EXIF block and each video's
//! container metadata.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use ente_timefix::config::resolve_config_path;
use ente_timefix::process::preflight;
use ente_timefix::report::{hints_for, print_error, print_hint, print_log_path, print_report};
use ente_timefix::{Cli, Config, ExifCodec, Processor};
use std::path::{Path, PathBuf};
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", Config::sample_config());
        return Ok(());
    }

    let config = load_config(&cli)?;

    let log_path = get_log_path(&config)?;
    let guard = setup_logging(&config, cli.json_log, &log_path)?;

    info!(version = env!("CARGO_PKG_VERSION"), "ente-timefix starting");
    if config.verbose {
        info!(?config, "Configuration loaded");
    }

    let result = preflight(&config)
        .and_then(|rewriter| Processor::new(config, ExifCodec::new(), rewriter).run());

    match result {
        Ok(stats) => {
            print_report(&stats)?;
            print_log_path(&log_path.display().to_string());
            info!(log_file = %log_path.display(), "Processing complete. Log saved to");
            drop(guard);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, fatal = e.is_fatal(), "Processing failed");
            print_error(&e.to_string());
            for hint in hints_for(&e) {
                print_hint(hint);
            }
            drop(guard);
            std::process::exit(1);
        }
    }
}

/// Get the directory where the executable is located
fn get_executable_dir() -> Result<PathBuf> {
    let exe_path = std::env::current_exe()?;
    Ok(exe_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Log file for this run, under the configured log directory or `Log/`
/// next to the executable
fn get_log_path(config: &Config) -> Result<PathBuf> {
    let log_dir = match &config.log_dir {
        Some(dir) => dir.clone(),
        None => get_executable_dir()?.join("Log"),
    };
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    Ok(log_dir.join(format!("timefix_{}.log", timestamp)))
}

/// Load configuration from file or CLI arguments
fn load_config(cli: &Cli) -> Result<Config> {
    let config = if let Some(ref config_path) = cli.config {
        let file_config = Config::load_from_file(resolve_config_path(config_path))?;
        cli.merge_with_config(file_config)
    } else {
        cli.to_config()
    };

    Ok(config)
}

/// Setup logging (file + console)
fn setup_logging(config: &Config, json_log: bool, log_path: &Path) -> Result<WorkerGuard> {
    let level = if config.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if json_log {
        subscriber
            .with(fmt::layer().json().with_ansi(false).with_writer(non_blocking))
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(guard)
}
