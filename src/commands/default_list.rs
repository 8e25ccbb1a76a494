//! Default list CLI commands.
//!
//! Default lists are templates: their items seed new shopping lists.

use clap::{Args, Subcommand};

use shoplist::models::{category_label, DefaultItem, DefaultList};
use shoplist::stores::{DefaultListUpdate, NewDefaultList};
use shoplist::Stores;

use super::{parse_category, OutputFormat};

#[derive(Args)]
pub struct DefaultListCommand {
    #[command(subcommand)]
    pub command: DefaultListSubcommand,
}

#[derive(Subcommand)]
pub enum DefaultListSubcommand {
    /// List all default lists
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a default list's items (the flagged default if omitted)
    Show {
        /// Default list ID or name
        list: Option<String>,
    },

    /// Create a default list
    Create {
        /// Name of the default list
        name: String,

        /// Flag it as the default
        #[arg(long)]
        default: bool,
    },

    /// Rename a default list
    Rename {
        /// Default list ID or name
        list: String,

        /// New name
        name: String,
    },

    /// Delete a default list
    Delete {
        /// Default list ID or name
        list: String,
    },

    /// Flag a default list as the default
    SetDefault {
        /// Default list ID or name
        list: String,
    },

    /// Add an item
    Add {
        /// Item name
        name: String,

        /// Default list ID or name (the flagged default if omitted)
        #[arg(long, short)]
        list: Option<String>,

        /// Category (ID or name)
        #[arg(long)]
        category: Option<String>,

        /// Quantity
        #[arg(long, short)]
        qty: Option<String>,
    },

    /// Remove the item at a position (as shown by `show`, starting at 1)
    Remove {
        position: usize,

        /// Default list ID or name (the flagged default if omitted)
        #[arg(long, short)]
        list: Option<String>,
    },
}

impl DefaultListCommand {
    pub fn run(&self, stores: &Stores) -> Result<(), Box<dyn std::error::Error>> {
        let defaults = stores.default_lists();
        match &self.command {
            DefaultListSubcommand::List { format } => {
                let all = defaults.get_all()?;
                if all.is_empty() {
                    println!("No default lists found");
                    return Ok(());
                }
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&all)?),
                    OutputFormat::Text => {
                        for list in &all {
                            let flag = if list.is_default { "*" } else { " " };
                            println!("{} {:<36}  {} ({} items)", flag, list.id, list.name, list.items.len());
                        }
                    }
                }
                Ok(())
            }

            DefaultListSubcommand::Show { list } => {
                let list = resolve(stores, list.as_deref())?;
                let custom = stores.categories().get_all()?;
                println!("{}{}", list.name, if list.is_default { " (default)" } else { "" });
                for (i, item) in list.items.iter().enumerate() {
                    println!(
                        "  {:>2}. {} {} {}",
                        i + 1,
                        item.name,
                        item.quantity,
                        category_label(&item.category_id, &custom)
                    );
                }
                Ok(())
            }

            DefaultListSubcommand::Create { name, default } => {
                if name.trim().is_empty() {
                    return Err("Default list name cannot be empty".into());
                }
                let created = defaults.create(NewDefaultList {
                    name: name.trim().to_string(),
                    items: Vec::new(),
                    is_default: *default,
                })?;
                println!("Created default list '{}'", created.name);
                Ok(())
            }

            DefaultListSubcommand::Rename { list, name } => {
                let found = resolve(stores, Some(list))?;
                let update = DefaultListUpdate {
                    name: Some(name.clone()),
                    ..Default::default()
                };
                defaults.update(&found.id, update)?;
                println!("Renamed '{}' to '{}'", found.name, name.trim());
                Ok(())
            }

            DefaultListSubcommand::Delete { list } => {
                let found = resolve(stores, Some(list))?;
                defaults.delete(&found.id)?;
                println!("Deleted default list '{}'", found.name);
                Ok(())
            }

            DefaultListSubcommand::SetDefault { list } => {
                let found = resolve(stores, Some(list))?;
                defaults.set_default(&found.id)?;
                println!("'{}' is now the default list", found.name);
                Ok(())
            }

            DefaultListSubcommand::Add {
                name,
                list,
                category,
                qty,
            } => {
                let found = resolve(stores, list.as_deref())?;
                let custom = stores.categories().get_all()?;
                let category_id = category
                    .as_deref()
                    .map(|c| parse_category(c, &custom))
                    .unwrap_or_default();
                let item = DefaultItem::new(name.as_str(), category_id, qty.clone().unwrap_or_default());
                defaults.add_item(&found.id, item)?;
                println!("Added '{}' to '{}'", name.trim(), found.name);
                Ok(())
            }

            DefaultListSubcommand::Remove { position, list } => {
                let found = resolve(stores, list.as_deref())?;
                let index = position
                    .checked_sub(1)
                    .filter(|i| *i < found.items.len())
                    .ok_or_else(|| format!("No item at position {} in '{}'", position, found.name))?;
                defaults.remove_item(&found.id, index)?;
                println!("Removed '{}' from '{}'", found.items[index].name, found.name);
                Ok(())
            }
        }
    }
}

/// Finds a default list by ID or name, or the flagged default if `key` is
/// `None`.
fn resolve(stores: &Stores, key: Option<&str>) -> Result<DefaultList, Box<dyn std::error::Error>> {
    let defaults = stores.default_lists();
    let found = match key {
        Some(key) => match defaults.get(key)? {
            Some(list) => Some(list),
            None => defaults.find_by_name(key)?,
        },
        None => defaults.default_list()?,
    };
    found.ok_or_else(|| match key {
        Some(key) => format!("Default list not found: {}", key).into(),
        None => "No default list yet. Create one with 'default-list create'.".into(),
    })
}
