//! Category CLI commands.

use clap::{Args, Subcommand};

use shoplist::models::{CustomCategory, BUILTIN_CATEGORIES};
use shoplist::stores::CategoryUpdate;
use shoplist::Stores;

use super::OutputFormat;

#[derive(Args)]
pub struct CategoryCommand {
    #[command(subcommand)]
    pub command: CategorySubcommand,
}

#[derive(Subcommand)]
pub enum CategorySubcommand {
    /// List built-in and custom categories
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a custom category
    Add {
        /// Category name
        name: String,

        /// Emoji (default: 📦)
        #[arg(long, short)]
        emoji: Option<String>,
    },

    /// Update a custom category
    Update {
        /// Custom category ID or name
        category: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New emoji
        #[arg(long, short)]
        emoji: Option<String>,
    },

    /// Delete a custom category
    Delete {
        /// Custom category ID or name
        category: String,
    },
}

impl CategoryCommand {
    pub fn run(&self, stores: &Stores) -> Result<(), Box<dyn std::error::Error>> {
        let categories = stores.categories();
        match &self.command {
            CategorySubcommand::List { format } => {
                let custom = categories.get_all()?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&custom)?),
                    OutputFormat::Text => {
                        println!("Built-in");
                        for c in BUILTIN_CATEGORIES.iter() {
                            println!("  {:>12}  {} {}", c.id, c.emoji, c.name);
                        }
                        if !custom.is_empty() {
                            println!("\nCustom");
                            for c in &custom {
                                println!("  {:>12}  {} {}", c.id, c.emoji, c.name);
                            }
                        }
                    }
                }
                Ok(())
            }

            CategorySubcommand::Add { name, emoji } => {
                if name.trim().is_empty() {
                    return Err("Category name cannot be empty".into());
                }
                let created = categories.create(name, emoji.as_deref())?;
                println!("Created category {} {} ({})", created.emoji, created.name, created.id);
                Ok(())
            }

            CategorySubcommand::Update {
                category,
                name,
                emoji,
            } => {
                if name.is_none() && emoji.is_none() {
                    return Err("Nothing to update. Provide --name or --emoji.".into());
                }
                let found = find_custom(stores, category)?;
                let update = CategoryUpdate {
                    name: name.clone(),
                    emoji: emoji.clone(),
                };
                categories.update(&found.id, update)?;
                println!("Updated category '{}'", found.name);
                Ok(())
            }

            CategorySubcommand::Delete { category } => {
                let found = find_custom(stores, category)?;
                categories.delete(&found.id)?;
                println!("Deleted category '{}'", found.name);
                Ok(())
            }
        }
    }
}

fn find_custom(stores: &Stores, key: &str) -> Result<CustomCategory, Box<dyn std::error::Error>> {
    let lower = key.trim().to_lowercase();
    stores
        .categories()
        .get_all()?
        .into_iter()
        .find(|c| c.id == key || c.name.to_lowercase() == lower)
        .ok_or_else(|| format!("Custom category not found: {}", key).into())
}
