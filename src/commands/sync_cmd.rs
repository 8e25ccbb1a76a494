//! Sync CLI commands for replicating local data with the remote store.

use clap::{Args, Subcommand};

use shoplist::sync::{
    ItemSyncStatus, PullOutcome, SyncMeta, SyncRegistry, SyncSession, SyncSettings, Tracked,
};
use shoplist::Stores;

use super::remote_engine;
use crate::config::Config;

/// Sync with the remote store
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Upload local data
    Push,

    /// Download remote data if it is newer
    Pull,

    /// Pull, then push (run once after obtaining a token)
    Login,

    /// Show sync configuration and per-entity sync state
    Status,

    /// Show or change auto-sync settings
    Settings {
        /// Push automatically after local changes
        #[arg(long)]
        auto_sync: Option<bool>,

        /// Quiet period before an automatic push, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Forget sync state on this device
    Logout,
}

#[derive(Default)]
struct Tally {
    synced: usize,
    dirty: usize,
    never: usize,
}

impl Tally {
    fn count<T: Tracked>(&mut self, registry: &SyncRegistry, entities: &[T]) {
        for entity in entities {
            match registry.status_of(entity) {
                ItemSyncStatus::Synced => self.synced += 1,
                ItemSyncStatus::Dirty => self.dirty += 1,
                ItemSyncStatus::Never => self.never += 1,
            }
        }
    }
}

impl SyncCommand {
    pub async fn run(&self, stores: &Stores, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            None | Some(SyncSubcommand::Push) => {
                let (engine, token) = remote_engine(config, stores)?;
                let updated_at = engine.push(&token).await?;
                println!("Pushed local data ({})", updated_at.format("%Y-%m-%d %H:%M:%S"));
                Ok(())
            }

            Some(SyncSubcommand::Pull) => {
                let (engine, token) = remote_engine(config, stores)?;
                let outcome = engine.pull(&token).await?;
                print_pull(outcome);
                Ok(())
            }

            Some(SyncSubcommand::Login) => {
                let (engine, token) = remote_engine(config, stores)?;
                let (_session, outcome) = SyncSession::login(engine, token).await?;
                print_pull(outcome);
                println!("Pushed local data. Sync is active.");
                Ok(())
            }

            Some(SyncSubcommand::Status) => self.status(stores, config),

            Some(SyncSubcommand::Settings {
                auto_sync,
                delay_ms,
            }) => {
                let mut settings = SyncSettings::load(stores)?;
                if auto_sync.is_some() || delay_ms.is_some() {
                    if let Some(auto_sync) = auto_sync {
                        settings.auto_sync = *auto_sync;
                    }
                    if let Some(delay_ms) = delay_ms {
                        settings.delay_ms = *delay_ms;
                    }
                    settings = settings.clamped();
                    settings.save(stores)?;
                }
                println!(
                    "Auto-sync: {}",
                    if settings.auto_sync { "enabled" } else { "disabled" }
                );
                println!("Delay:     {} ms", settings.delay_ms);
                Ok(())
            }

            Some(SyncSubcommand::Logout) => {
                match remote_engine(config, stores) {
                    Ok((engine, token)) => SyncSession::start(engine, token).logout()?,
                    Err(_) => SyncMeta::clear(stores)?,
                }
                println!("Sync state cleared.");
                if config.remote.token.is_some() {
                    println!("Remove remote.token from your config (or unset SHOPLIST_TOKEN) to stop syncing.");
                }
                Ok(())
            }
        }
    }

    fn status(&self, stores: &Stores, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        println!("Sync Configuration");
        println!("==================");
        println!();

        match &config.remote.server_url {
            Some(url) => println!("Server:    {}", url),
            None => {
                println!("Status: Not configured");
                println!();
                println!("To enable sync, add to your config file:");
                println!();
                println!("  remote:");
                println!("    server_url: \"https://sync.example.com\"");
                println!();
                println!("Or set environment variables:");
                println!("  SHOPLIST_SERVER_URL, SHOPLIST_TOKEN");
                return Ok(());
            }
        }
        println!(
            "Token:     {}",
            if config.remote.token.is_some() { "set" } else { "missing" }
        );

        let settings = SyncSettings::load(stores)?;
        println!(
            "Auto-sync: {} ({} ms)",
            if settings.auto_sync { "enabled" } else { "disabled" },
            settings.delay_ms
        );

        let meta = SyncMeta::load(stores)?;
        match meta.last_sync {
            Some(at) => println!("Last sync: {}", at.format("%Y-%m-%d %H:%M:%S")),
            None => println!("Last sync: never"),
        }
        println!();

        let registry = SyncRegistry::load(stores)?;
        let mut tally = Tally::default();
        tally.count(&registry, &stores.lists().get_all()?);
        tally.count(&registry, &stores.default_lists().get_all()?);
        tally.count(&registry, &stores.supermarkets().get_all()?);
        println!(
            "Entities:  {} synced, {} changed, {} never synced",
            tally.synced, tally.dirty, tally.never
        );
        Ok(())
    }
}

fn print_pull(outcome: PullOutcome) {
    match outcome {
        PullOutcome::NoRemote => println!("No remote data yet."),
        PullOutcome::Pulled => println!("Pulled newer remote data."),
        PullOutcome::LocalNewer => println!("Already up to date."),
    }
}
