use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{
    remote_engine, AiImportCommand, CategoryCommand, ConfigCommand, DefaultListCommand,
    ImportCommand, ListCommand, ShareCommand, SharedCommand, SupermarketCommand, SyncCommand,
};
use config::Config;
use shoplist::sync::{SyncSession, SyncSettings};
use shoplist::{FileStore, Stores};

#[derive(Parser)]
#[command(name = "shoplist")]
#[command(version)]
#[command(about = "Offline-first shopping lists with sync and link sharing", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage shopping lists
    List(ListCommand),

    /// Manage default lists (item templates)
    DefaultList(DefaultListCommand),

    /// Manage supermarkets and their aisle order
    Supermarket(SupermarketCommand),

    /// Manage categories
    Category(CategoryCommand),

    /// Produce a share link
    Share(ShareCommand),

    /// Import a share link or code
    Import(ImportCommand),

    /// Import items from AI-generated JSON or CSV
    AiImport(AiImportCommand),

    /// Sync with the remote store
    Sync(SyncCommand),

    /// Manage remote shared documents
    Shared(SharedCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shoplist=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;
    let stores = Stores::new(Arc::new(FileStore::new(config.data_dir.value.clone())));

    // Auto-sync around local commands: pull, run, push.
    let session = if is_local_command(&cli.command) {
        auto_sync_session(&config, &stores)
    } else {
        None
    };
    let command = execute_command(&cli.command, &stores, &config);
    match &session {
        Some(session) => session.run_local(command).await,
        None => command.await,
    }
}

async fn execute_command(
    command: &Option<Commands>,
    stores: &Stores,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Some(Commands::List(cmd)) => cmd.run(stores)?,
        Some(Commands::DefaultList(cmd)) => cmd.run(stores)?,
        Some(Commands::Supermarket(cmd)) => cmd.run(stores)?,
        Some(Commands::Category(cmd)) => cmd.run(stores)?,
        Some(Commands::Share(cmd)) => cmd.run(stores, config)?,
        Some(Commands::Import(cmd)) => cmd.run(stores)?,
        Some(Commands::AiImport(cmd)) => cmd.run(stores)?,
        Some(Commands::Sync(cmd)) => cmd.run(stores, config).await?,
        Some(Commands::Shared(cmd)) => cmd.run(stores, config).await?,
        Some(Commands::Config(cmd)) => cmd.run(config, stores)?,
        None => println!("Use --help to see available commands"),
    }
    Ok(())
}

/// Starts a session when a remote is configured and auto-sync is on.
fn auto_sync_session(config: &Config, stores: &Stores) -> Option<SyncSession> {
    if !config.remote.is_configured() {
        return None;
    }
    match SyncSettings::load(stores) {
        Ok(settings) if settings.auto_sync => {}
        Ok(_) => return None,
        Err(e) => {
            tracing::warn!("Could not read sync settings: {}", e);
            return None;
        }
    }
    let (engine, token) = remote_engine(config, stores).ok()?;
    Some(SyncSession::start(engine, token))
}

/// Commands that read or write local entities.
fn is_local_command(cmd: &Option<Commands>) -> bool {
    matches!(
        cmd,
        Some(
            Commands::List(_)
                | Commands::DefaultList(_)
                | Commands::Supermarket(_)
                | Commands::Category(_)
                | Commands::Share(_)
                | Commands::Import(_)
                | Commands::AiImport(_)
        )
    )
}
