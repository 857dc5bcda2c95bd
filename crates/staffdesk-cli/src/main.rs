//! Staffdesk CLI - drives the dashboard's route access guard from a terminal.
//!
//! Sign in and out, check what a navigation would do, and replay a sequence
//! of navigations against an in-memory browser history.

mod commands;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use staffdesk_core::{Config, StoreBackend};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log file name inside `<data_dir>/logs`
const LOG_FILE: &str = "staffdesk.log";

#[derive(Parser)]
#[command(name = "staffdesk")]
#[command(author, version, about = "Staffdesk - HR dashboard access guard", long_about = None)]
struct Cli {
    /// Credential store backend (overrides config). `memory` lasts for a
    /// single command, so login and logout refuse it
    #[arg(long, global = true)]
    store: Option<StoreBackend>,

    /// Data directory for the credential file and logs (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store an encrypted session token
    Login {
        /// Token to store (prompted for when omitted)
        #[arg(long)]
        token: Option<String>,
    },

    /// Remove the stored session token
    Logout,

    /// Show what the guard decides for a location
    Check {
        location: String,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Navigate through locations in order and print the resulting history
    Visit {
        #[arg(required = true)]
        locations: Vec<String>,
    },

    /// Show authentication state and credential age
    Status,

    /// List dashboard routes
    Routes,

    /// Generate a random secret key
    Keygen,
}

/// Initialize the tracing subscriber for logging
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // RUST_LOG controls the level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match config.log_to_file.then(|| config.data_dir()) {
        Some(Ok(dir)) => {
            let appender = tracing_appender::rolling::daily(dir.join("logs"), LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        Some(Err(e)) => {
            eprintln!("File logging disabled: {e}");
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(store) = cli.store {
        config.store = store;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    let _log_guard = init_tracing(&config);
    info!(store = %config.store, "Staffdesk starting");

    match cli.command {
        Commands::Login { token } => commands::login(&config, token),
        Commands::Logout => commands::logout(&config),
        Commands::Check { location, json } => commands::check(&config, &location, json),
        Commands::Visit { locations } => commands::visit(&config, &locations),
        Commands::Status => commands::status(&config),
        Commands::Routes => commands::routes(),
        Commands::Keygen => commands::keygen(),
    }
}
