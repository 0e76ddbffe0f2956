//! OSC Deck - interactive host for the action-to-OSC dispatch engine
//!
//! Loads the sender settings from the data directory, keeps them hot-reloaded
//! and drives the engine from a REPL.

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use crate::cli::CliCommand;
use osc_deck::config::watcher::SettingsWatcher;
use osc_deck::config::EngineSettings;
use osc_deck::engine::{Engine, ValueChanged};
use osc_deck::osc::TransportStatus;
use osc_deck::paths::AppPaths;

/// OSC Deck - send OSC from buttons and knobs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding sender_ip, sender_port, listener_port and engine.yaml
    #[arg(short, long, env = "OSC_DECK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let paths = AppPaths::detect(args.data_dir.clone());
    paths
        .ensure_directories()
        .with_context(|| format!("Failed to prepare {}", paths.data_dir.display()))?;

    let _log_guard = init_logging(&args.log_level, &paths.logs_dir)?;

    info!("Starting OSC Deck v{}...", env!("CARGO_PKG_VERSION"));
    info!(
        "Data directory: {} ({})",
        paths.data_dir.display(),
        if paths.is_portable { "portable" } else { "installed" }
    );

    let settings = EngineSettings::load(&paths.data_dir)
        .await
        .context("Failed to load engine settings")?;
    debug!("Engine settings: {:?}", settings);

    let engine = Engine::new(&settings, tokio::runtime::Handle::current())
        .with_data_dir(paths.data_dir.clone());

    engine.subscribe_status(Arc::new(|status: TransportStatus| {
        if status.is_active() {
            info!("{}", status);
        } else {
            warn!("{}", status);
        }
    }));
    engine.subscribe(Arc::new(|event: &ValueChanged| {
        println!(
            "  {} {} = {}",
            event.action.dimmed(),
            event.address.cyan(),
            event.value.normalize().to_string().green()
        );
    }));

    // Load sender settings with hot-reload watcher
    let (settings_watcher, initial) = SettingsWatcher::new(paths.data_dir.clone()).await?;
    let status = engine.apply_sender_settings(&initial).await;
    if !initial.is_configured() {
        warn!("{}", status);
    }

    run_app(&engine, settings_watcher, shutdown_signal()).await?;

    engine.shutdown();
    info!("OSC Deck shutdown complete");
    Ok(())
}

async fn run_app(
    engine: &Engine,
    mut settings_watcher: SettingsWatcher,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<()> {
    let (line_tx, mut line_rx) = mpsc::channel::<String>(16);
    let repl = cli::spawn_repl(line_tx);

    cli::print_help();

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = line_rx.recv() => {
                let Some(line) = line else {
                    break;
                };
                match CliCommand::parse(&line) {
                    Ok(command) => match cli::execute(engine, command) {
                        Ok(true) => {},
                        Ok(false) => break,
                        Err(e) => println!("  {} {:#}", "error:".red(), e),
                    },
                    Err(e) => println!("  {} {}", "error:".red(), e),
                }
            }

            // Sender settings edited on disk
            Some(settings) = settings_watcher.next_settings() => {
                info!("Sender settings changed, restarting OSC sender...");
                engine.apply_sender_settings(&settings).await;
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }
    }

    // The editor thread exits after forwarding quit, or on its next line once
    // the channel is closed
    drop(line_rx);
    drop(repl);
    Ok(())
}

/// Console plus daily-rolling file logging
///
/// The returned guard flushes the file writer on drop.
fn init_logging(level: &str, logs_dir: &Path) -> Result<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::daily(logs_dir, "osc-deck.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(guard)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
}
