//! Link sharing and import CLI commands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use shoplist::import::{import_payload, parse_ai_items, ImportMode, IMPORTED_NAME};
use shoplist::{ShareKind, SharePayload, Stores};

use super::supermarket::find_supermarket;
use crate::config::Config;

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    List,
    DefaultList,
    Supermarket,
    Categories,
}

impl From<KindArg> for ShareKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::List => ShareKind::List,
            KindArg::DefaultList => ShareKind::DefaultList,
            KindArg::Supermarket => ShareKind::Supermarket,
            KindArg::Categories => ShareKind::Categories,
        }
    }
}

#[derive(Args)]
pub struct ShareCommand {
    #[command(subcommand)]
    pub command: ShareSubcommand,

    /// Print only the encoded payload instead of a full link
    #[arg(long, global = true)]
    pub code: bool,
}

#[derive(Subcommand)]
pub enum ShareSubcommand {
    /// Share a shopping list
    List {
        /// List ID or name
        list: String,
    },

    /// Share a default list (the flagged default if omitted)
    DefaultList {
        /// Default list ID or name
        list: Option<String>,
    },

    /// Share a supermarket with the custom categories it uses
    Supermarket {
        /// Supermarket ID or name
        supermarket: String,
    },

    /// Share all custom categories
    Categories,
}

impl ShareCommand {
    pub fn run(&self, stores: &Stores, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let payload = share_payload(stores, &self.command)?;
        if self.code {
            println!("{}", payload.encode());
        } else {
            println!("{}", payload.share_url(&config.share_base_url.value));
        }
        Ok(())
    }
}

/// Builds the payload for a share subcommand.
pub(super) fn share_payload(
    stores: &Stores,
    command: &ShareSubcommand,
) -> Result<SharePayload, Box<dyn std::error::Error>> {
    match command {
        ShareSubcommand::List { list } => {
            let lists = stores.lists();
            let found = match lists.get(list)? {
                Some(l) => Some(l),
                None => lists.find_by_name(list)?,
            };
            let found = found.ok_or_else(|| format!("List not found: {}", list))?;
            Ok(SharePayload::from_list(&found))
        }
        ShareSubcommand::DefaultList { list } => {
            let defaults = stores.default_lists();
            let found = match list {
                Some(key) => match defaults.get(key)? {
                    Some(l) => Some(l),
                    None => defaults.find_by_name(key)?,
                },
                None => defaults.default_list()?,
            };
            let found = found.ok_or("Default list not found")?;
            Ok(SharePayload::from_default_list(&found))
        }
        ShareSubcommand::Supermarket { supermarket } => {
            let sm = find_supermarket(stores, supermarket)?;
            let custom = stores.categories().get_all()?;
            Ok(SharePayload::from_supermarket(&sm, &custom))
        }
        ShareSubcommand::Categories => {
            let custom = stores.categories().get_all()?;
            if custom.is_empty() {
                return Err("No custom categories to share".into());
            }
            Ok(SharePayload::from_categories(&custom))
        }
    }
}

#[derive(Args)]
pub struct ImportCommand {
    /// Share link, or an encoded payload together with --kind
    pub input: String,

    /// Kind of a bare encoded payload
    #[arg(long, short, value_enum)]
    pub kind: Option<KindArg>,

    /// new, overwrite or merge (by name)
    #[arg(long, short, default_value = "new")]
    pub mode: ImportMode,
}

impl ImportCommand {
    pub fn run(&self, stores: &Stores) -> Result<(), Box<dyn std::error::Error>> {
        let payload = decode_input(&self.input, self.kind)?;
        let outcome = import_payload(stores, payload, self.mode)?;
        println!("{}", outcome);
        Ok(())
    }
}

fn decode_input(input: &str, kind: Option<KindArg>) -> Result<SharePayload, Box<dyn std::error::Error>> {
    let input = input.trim();
    let decoded = if input.contains('?') || input.contains("://") {
        SharePayload::from_url(input)
    } else {
        let kind = kind.ok_or("A bare payload needs --kind")?;
        SharePayload::decode(kind.into(), input)
    };
    decoded.ok_or_else(|| "Could not decode the shared data".into())
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum AiTarget {
    #[default]
    List,
    DefaultList,
}

#[derive(Args)]
pub struct AiImportCommand {
    /// File with JSON or CSV items ("-" for stdin)
    pub file: PathBuf,

    /// Name of the list to create or match
    #[arg(long, short)]
    pub name: Option<String>,

    /// Import into a shopping list or a default list
    #[arg(long, short, value_enum, default_value = "list")]
    pub target: AiTarget,

    /// new, overwrite or merge (by name)
    #[arg(long, short, default_value = "new")]
    pub mode: ImportMode,
}

impl AiImportCommand {
    pub fn run(&self, stores: &Stores) -> Result<(), Box<dyn std::error::Error>> {
        let text = if self.file.as_os_str() == "-" {
            std::io::read_to_string(std::io::stdin())?
        } else {
            std::fs::read_to_string(&self.file)?
        };
        let items = parse_ai_items(&text)?;
        let count = items.len();

        let payload = match self.target {
            AiTarget::List => SharePayload::List {
                name: self.name.clone().unwrap_or_else(|| IMPORTED_NAME.to_string()),
                items,
            },
            AiTarget::DefaultList => SharePayload::DefaultList {
                name: self.name.clone(),
                items,
            },
        };
        let outcome = import_payload(stores, payload, self.mode)?;
        println!("Parsed {} item(s). {}", count, outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoplist::models::{CategoryId, DefaultItem};

    fn payload() -> SharePayload {
        SharePayload::List {
            name: "Weekly".into(),
            items: vec![DefaultItem::new("Latte", CategoryId::Builtin(2), "1 L")],
        }
    }

    #[test]
    fn test_decode_link() {
        let url = payload().share_url("https://shoplist.app/");
        assert_eq!(decode_input(&url, None).unwrap(), payload());
    }

    #[test]
    fn test_decode_bare_code_needs_kind() {
        let code = payload().encode();
        assert!(decode_input(&code, None).is_err());
        assert_eq!(decode_input(&code, Some(KindArg::List)).unwrap(), payload());
    }

    #[test]
    fn test_share_payload_for_missing_list() {
        let stores = Stores::in_memory();
        let command = ShareSubcommand::List {
            list: "nope".into(),
        };
        assert!(share_payload(&stores, &command).is_err());
    }
}
