//! # ember-cli
//!
//! CLI harness for exercising the ember-sync engine against a configured
//! backend.
//!
//! ## Commands
//!
//! - `init`: Write the backend configuration
//! - `swipe`: Record a swipe (instant, offline-safe)
//! - `message`: Send a message in a match
//! - `read`: Mark a match's messages from a sender as read
//! - `sync`: Run one sync pass and print the report
//! - `full-sync`: Clear checkpoints and cached profiles, resync from epoch
//! - `stats`: Show per-table counts and the pending upload backlog
//! - `profiles` / `matches` / `messages`: Browse the local store
//!
//! ## Example
//!
//! ```bash
//! # Configure the backend
//! ember init --backend-url https://api.ember.app --api-key KEY --user-id me
//!
//! # Swipe right, works offline
//! ember swipe some-user
//!
//! # Reconcile with the backend
//! ember sync
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use ember_engine::{EngineConfig, HttpRemote, NetworkMonitor, SyncEngine};
use ember_store::SqliteStore;
use ember_types::UserId;

mod commands;
mod config;

use commands::{browse, init, message, status, swipe, sync};
use config::CliConfig;

/// CLI harness for the ember-sync engine.
#[derive(Parser, Debug)]
#[command(name = "ember")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for the configuration and local database
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the backend configuration
    Init {
        /// Base URL of the remote service
        #[arg(long)]
        backend_url: Option<String>,

        /// API key for the remote service
        #[arg(long)]
        api_key: String,

        /// User id this device is signed in as
        #[arg(long)]
        user_id: String,
    },

    /// Record a swipe on another user
    Swipe {
        /// The user being swiped on
        swiped_id: String,

        /// Swipe left instead of right
        #[arg(long, conflicts_with = "super_like")]
        pass: bool,

        /// Make it a super like
        #[arg(long = "super")]
        super_like: bool,
    },

    /// Send a message in a match
    Message {
        /// The match to message in
        match_id: String,

        /// Message body
        content: String,

        /// Attach a media URL (sends an image message)
        #[arg(long)]
        media_url: Option<String>,
    },

    /// Mark messages from a sender as read
    Read {
        /// The match the messages belong to
        match_id: String,

        /// The sender whose messages to mark
        sender_id: String,
    },

    /// Run one sync pass
    Sync,

    /// Clear checkpoints and cached profiles, then resync from the epoch
    FullSync,

    /// Show per-table counts and the pending upload backlog
    Stats,

    /// List browsable profiles from the local store
    Profiles {
        /// Maximum number of profiles to list
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// List the signed-in user's matches
    Matches,

    /// List the messages in a match
    Messages {
        /// The match to list
        match_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    if let Commands::Init {
        backend_url,
        api_key,
        user_id,
    } = &cli.command
    {
        return init::run(&data_dir, backend_url.as_deref(), api_key, user_id).await;
    }

    let config = CliConfig::load(&data_dir).await?;
    let engine = build_engine(&config, &data_dir).await?;

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Swipe {
            swiped_id,
            pass,
            super_like,
        } => swipe::run(&engine, &swiped_id, !pass, super_like).await?,
        Commands::Message {
            match_id,
            content,
            media_url,
        } => message::send(&engine, &match_id, content, media_url).await?,
        Commands::Read {
            match_id,
            sender_id,
        } => message::mark_read(&engine, &match_id, &sender_id).await?,
        Commands::Sync => sync::run(&engine).await?,
        Commands::FullSync => sync::run_full(&engine).await?,
        Commands::Stats => status::run(&engine).await?,
        Commands::Profiles { limit } => browse::profiles(&engine, limit).await?,
        Commands::Matches => browse::matches(&engine).await?,
        Commands::Messages { match_id } => browse::messages(&engine, &match_id).await?,
    }

    Ok(())
}

/// Build the engine from the stored configuration.
async fn build_engine(config: &CliConfig, data_dir: &std::path::Path) -> Result<SyncEngine> {
    let store = SqliteStore::open(&config.database_path(data_dir))
        .await
        .context("Failed to open local database")?;
    let remote = HttpRemote::new(&config.backend_url, &config.api_key);
    let network = Arc::new(NetworkMonitor::new(true));

    let engine = SyncEngine::new(
        Arc::new(store),
        Arc::new(remote),
        network,
        EngineConfig::default().with_page_size(config.page_size),
    );
    engine.set_active_user(UserId::new(config.user_id.clone()));
    Ok(engine)
}

/// Get the default data directory for ember-cli.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("app", "ember", "ember-cli")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
