//! Configuration CLI commands.
//!
//! File and environment settings live in [`Config`]; auto-sync settings
//! live in the local store and are shown alongside.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;

use shoplist::sync::SyncSettings;
use shoplist::Stores;

use super::OutputFormat;
use crate::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show effective settings and where each one comes from
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Report settings that would keep sharing or sync from working
    Check,

    /// Write a commented config file
    Init {
        /// Where to write it (default: the platform config path)
        path: Option<PathBuf>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

const TEMPLATE: &str = r#"# shoplist configuration
# Environment variables take precedence over this file.

# Local data (SHOPLIST_DATA_DIR). Relative paths start at this file.
# data_dir: ~/.local/share/shoplist

# Base of generated share links (SHOPLIST_SHARE_URL)
share_base_url: https://shoplist.app/

# Remote sync (SHOPLIST_SERVER_URL, SHOPLIST_TOKEN).
# Auto-sync itself is toggled with `shoplist sync settings`.
# remote:
#   server_url: https://sync.example.com
#   token: <token>
"#;

#[derive(Serialize)]
struct Report<'a> {
    #[serde(flatten)]
    config: &'a Config,
    sync: SyncSettings,
    problems: Vec<String>,
}

impl ConfigCommand {
    pub fn run(&self, config: &Config, stores: &Stores) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                let report = Report {
                    config,
                    sync: SyncSettings::load(stores)?,
                    problems: config.problems(),
                };
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                    OutputFormat::Text => print_report(&report),
                }
                Ok(())
            }

            ConfigSubcommand::Check => {
                let problems = config.problems();
                if problems.is_empty() {
                    println!("Configuration OK");
                    return Ok(());
                }
                for problem in &problems {
                    println!("- {}", problem);
                }
                Err(format!("{} configuration problem(s)", problems.len()).into())
            }

            ConfigSubcommand::Init { path, force } => {
                let path = path.clone().unwrap_or_else(Config::default_config_path);
                if path.exists() && !force {
                    return Err(format!(
                        "{} already exists (use --force to replace it)",
                        path.display()
                    )
                    .into());
                }
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, TEMPLATE)?;
                println!("Wrote {}", path.display());
                Ok(())
            }
        }
    }
}

fn print_report(report: &Report<'_>) {
    let config = report.config;
    match &config.config_file {
        Some(path) => println!("Config file:    {}", path.display()),
        None => println!(
            "Config file:    {} (not found)",
            Config::default_config_path().display()
        ),
    }
    println!(
        "Data dir:       {} ({})",
        config.data_dir.value.display(),
        config.data_dir.source
    );
    println!(
        "Share links:    {} ({})",
        config.share_base_url.value, config.share_base_url.source
    );
    println!(
        "Sync server:    {}",
        config.remote.server_url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "Sync token:     {}",
        if config.remote.token.is_some() { "(set)" } else { "(not set)" }
    );
    println!(
        "Auto-sync:      {} after {} ms",
        if report.sync.auto_sync { "on" } else { "off" },
        report.sync.delay_ms
    );
    for problem in &report.problems {
        println!("Warning: {}", problem);
    }
}
