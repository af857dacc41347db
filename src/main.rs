//! Capacitance Bridge Logger - Main Entry Point
//!
//! Runs a recording session against the simulated bridge and drives it from
//! console commands. Usage: `bridge-logger [config.toml]`

use anyhow::Context;
use bridge_logger::{
    backend::SimulatedBridge,
    config::{default_config_path, AppConfig, LoggingConfig},
    console::{ConsoleDisplay, HELP},
    session::{ControlCommand, Session},
    DisplaySink,
};
use crossbeam_channel::{bounded, select, tick, Receiver};
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info,bridge_logger=debug";

/// Lower bound on the display cadence so a zero interval does not spin
const MIN_DISPLAY_PERIOD: Duration = Duration::from_millis(50);

fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    let _log_guard = init_logging(&config.logging)?;

    tracing::info!("Starting bridge logger");

    let source = Box::new(SimulatedBridge::from_config(&config.source));
    let mut session = Session::start(config, source).context("Failed to start session")?;
    let mut display = ConsoleDisplay::new(std::io::stdout());
    let lines = spawn_stdin_reader()?;

    println!("{}", HELP);
    let mut ticker = tick(display_period(&session));

    loop {
        let mut retick = false;
        select! {
            recv(lines) -> line => {
                let Ok(line) = line else {
                    tracing::info!("Input closed");
                    break;
                };
                match line.parse::<ControlCommand>() {
                    Ok(command) => {
                        retick = matches!(command, ControlCommand::SetDisplayInterval(_));
                        if !session.apply(command, &mut display) {
                            break;
                        }
                    }
                    Err(_) if line.trim().is_empty() => {}
                    Err(e) => {
                        display.report_error(&e);
                        println!("{}", HELP);
                    }
                }
            }
            recv(ticker) -> _ => {
                session.refresh(&mut display);
                if !session.is_running() {
                    tracing::warn!("Sampling loop exited");
                    break;
                }
            }
        }
        if retick {
            ticker = tick(display_period(&session));
        }
    }

    // Signal the sampling loop to stop and wait for it
    tracing::info!("Shutting down...");
    let stats = session.shutdown().context("Failed to stop session")?;
    println!("{}", stats);

    Ok(())
}

/// Config from the first argument, else the data directory, else defaults
fn load_config() -> anyhow::Result<AppConfig> {
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        return AppConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }
    Ok(match default_config_path() {
        Some(path) if path.exists() => AppConfig::load_or_default(path),
        _ => AppConfig::default(),
    })
}

/// Console logging plus an optional daily rolling file
fn init_logging(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(logging.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER))
    })?;

    let (file_layer, guard) = match &logging.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "bridge-logger.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Forward stdin lines over a channel; the channel closes at end of input
fn spawn_stdin_reader() -> anyhow::Result<Receiver<String>> {
    let (tx, rx) = bounded(16);
    std::thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read input: {}", e);
                        break;
                    }
                }
            }
        })
        .context("Failed to spawn input thread")?;
    Ok(rx)
}

fn display_period(session: &Session) -> Duration {
    session
        .controller()
        .config()
        .display_period()
        .max(MIN_DISPLAY_PERIOD)
}
