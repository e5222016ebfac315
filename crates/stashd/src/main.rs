//! stashd — the stash daemon.
//!
//! Ensures a store server is running (launching one if needed),
//! connects to it, and keeps the shared manager alive until a
//! termination signal arrives.
//!
//! # Usage
//!
//! ```text
//! stashd standalone --port 6379 --data-dir ./db
//! ```

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;

use stash_core::{StoreConfig, paths};
use stash_lifecycle::{ConnectOverrides, LaunchOptions, StoreManager, register_cleanup_handlers};

#[derive(Parser)]
#[command(name = "stashd", about = "stash daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the store supervisor in the foreground.
    Standalone {
        /// Store server port; overrides the configured URL's port.
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for the store server's database files.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Disable append-only durability.
        #[arg(long)]
        no_append_only: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,stashd=debug,stash_lifecycle=debug")
            }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Standalone {
            port,
            data_dir,
            no_append_only,
        } => run_standalone(port, data_dir, !no_append_only),
    }
}

fn run_standalone(
    port: Option<u16>,
    data_dir: Option<PathBuf>,
    append_only: bool,
) -> anyhow::Result<()> {
    info!("stash daemon starting");

    let mut config = StoreConfig::from_env();
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    config.data_dir = paths::ensure_dir(&config.data_dir, ".stash-db")?;

    let mut manager = StoreManager::new(config);

    let opts = LaunchOptions {
        port,
        append_only,
        ..Default::default()
    };
    let outcome = manager.launch(&opts);
    if !outcome.success() {
        bail!("store server is not available and could not be launched");
    }

    if !manager.connect(&ConnectOverrides {
        port,
        ..Default::default()
    }) {
        bail!("could not connect to the store server");
    }

    let manager = Arc::new(Mutex::new(manager));
    let _cleanup = register_cleanup_handlers(Arc::clone(&manager))?;

    info!("store ready, waiting for shutdown signal");

    // The signal watcher exits the process; nothing left to do here.
    loop {
        std::thread::park();
    }
}
