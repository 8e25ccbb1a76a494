//! Supermarket CLI commands.

use clap::{Args, Subcommand};

use shoplist::models::{category_label, Supermarket};
use shoplist::stores::{NewSupermarket, SupermarketUpdate};
use shoplist::Stores;

use super::{parse_category, OutputFormat};

#[derive(Args)]
pub struct SupermarketCommand {
    #[command(subcommand)]
    pub command: SupermarketSubcommand,
}

#[derive(Subcommand)]
pub enum SupermarketSubcommand {
    /// List all supermarkets
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a supermarket's aisle order
    Show {
        /// Supermarket ID or name
        supermarket: String,
    },

    /// Create a supermarket
    Create {
        /// Name of the supermarket
        name: String,

        /// Categories in aisle order (IDs or names, comma-separated)
        #[arg(long, short, value_delimiter = ',')]
        order: Vec<String>,
    },

    /// Replace a supermarket's aisle order
    Order {
        /// Supermarket ID or name
        supermarket: String,

        /// Categories in aisle order (IDs or names)
        #[arg(required = true, value_delimiter = ',')]
        categories: Vec<String>,
    },

    /// Rename a supermarket
    Rename {
        /// Supermarket ID or name
        supermarket: String,

        /// New name
        name: String,
    },

    /// Delete a supermarket
    Delete {
        /// Supermarket ID or name
        supermarket: String,
    },
}

impl SupermarketCommand {
    pub fn run(&self, stores: &Stores) -> Result<(), Box<dyn std::error::Error>> {
        let supermarkets = stores.supermarkets();
        match &self.command {
            SupermarketSubcommand::List { format } => {
                let all = supermarkets.get_all()?;
                if all.is_empty() {
                    println!("No supermarkets found");
                    return Ok(());
                }
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&all)?),
                    OutputFormat::Text => {
                        for sm in &all {
                            println!("{:<12}  {} ({} categories)", sm.id, sm.name, sm.category_order.len());
                        }
                    }
                }
                Ok(())
            }

            SupermarketSubcommand::Show { supermarket } => {
                let sm = find_supermarket(stores, supermarket)?;
                let custom = stores.categories().get_all()?;
                println!("{}", sm.name);
                for (i, category) in sm.category_order.iter().enumerate() {
                    println!("  {:>2}. {}", i + 1, category_label(category, &custom));
                }
                Ok(())
            }

            SupermarketSubcommand::Create { name, order } => {
                if name.trim().is_empty() {
                    return Err("Supermarket name cannot be empty".into());
                }
                let custom = stores.categories().get_all()?;
                let created = supermarkets.create(NewSupermarket {
                    name: name.clone(),
                    category_order: order.iter().map(|c| parse_category(c, &custom)).collect(),
                })?;
                println!("Created supermarket '{}' ({})", created.name, created.id);
                Ok(())
            }

            SupermarketSubcommand::Order {
                supermarket,
                categories,
            } => {
                let sm = find_supermarket(stores, supermarket)?;
                let custom = stores.categories().get_all()?;
                let update = SupermarketUpdate {
                    category_order: Some(categories.iter().map(|c| parse_category(c, &custom)).collect()),
                    ..Default::default()
                };
                supermarkets.update(&sm.id, update)?;
                println!("Updated aisle order of '{}'", sm.name);
                Ok(())
            }

            SupermarketSubcommand::Rename { supermarket, name } => {
                let sm = find_supermarket(stores, supermarket)?;
                let update = SupermarketUpdate {
                    name: Some(name.clone()),
                    ..Default::default()
                };
                supermarkets.update(&sm.id, update)?;
                println!("Renamed '{}' to '{}'", sm.name, name.trim());
                Ok(())
            }

            SupermarketSubcommand::Delete { supermarket } => {
                let sm = find_supermarket(stores, supermarket)?;
                supermarkets.delete(&sm.id)?;
                println!("Deleted supermarket '{}'", sm.name);
                Ok(())
            }
        }
    }
}

/// Finds a supermarket by ID, then by name.
pub(super) fn find_supermarket(
    stores: &Stores,
    key: &str,
) -> Result<Supermarket, Box<dyn std::error::Error>> {
    let supermarkets = stores.supermarkets();
    let found = match supermarkets.get(key)? {
        Some(sm) => Some(sm),
        None => supermarkets.find_by_name(key)?,
    };
    found.ok_or_else(|| format!("Supermarket not found: {}", key).into())
}
