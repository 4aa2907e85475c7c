//! Summarist - a terminal front end for the book-summary catalog.
//!
//! Sign in, search as you type, open books (premium ones are gated by plan),
//! and run the mock checkout, all from a line-oriented prompt.

mod app;
mod command;
mod prompt;

use anyhow::Result;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use summarist_core::Config;

use app::App;
use command::Command;
use prompt::Prompt;

/// Log file name prefix inside the log directory
const LOG_FILE_PREFIX: &str = "summarist.log";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to a daily file so they never interleave with the prompt. Use the
/// RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = match config.log_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Logging disabled: {}", e);
            return None;
        }
    };
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config ({}), using defaults", e);
            Config::default()
        }
    };

    let _log_guard = init_tracing(&config);
    info!("Summarist starting");

    let mut app = App::new(config)?;
    app.auto_login();

    println!("Summarist - type 'help' for commands.");
    println!("{}", app.status_line());

    let mut prompt = Prompt::new();
    let result = run(&mut app, &mut prompt).await;

    if let Err(e) = app.save_config() {
        warn!(error = %e, "Failed to save config");
    }
    info!("Summarist shutting down");
    result
}

async fn run(app: &mut App, prompt: &mut Prompt) -> Result<()> {
    loop {
        let Some(line) = prompt.line("> ").await? else {
            return Ok(());
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        if matches!(command, Command::Quit) {
            return Ok(());
        }
        if let Err(e) = app.handle(command, prompt).await {
            warn!(error = %e, "Command failed");
            println!("Error: {}", e);
        }
    }
}
