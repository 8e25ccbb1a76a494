//! Shopping list CLI commands.

use clap::{Args, Subcommand, ValueEnum};

use shoplist::models::{category_label, CategoryId, Item, ListStatus, ShoppingList};
use shoplist::stores::{ListStore, ListUpdate, NewList};
use shoplist::Stores;

use super::{parse_category, truncate, OutputFormat};

#[derive(Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Preparing,
    Ready,
}

impl From<StatusArg> for ListStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Preparing => ListStatus::InPreparation,
            StatusArg::Ready => ListStatus::ReadyToPurchase,
        }
    }
}

#[derive(Args)]
pub struct ListCommand {
    #[command(subcommand)]
    pub command: ListSubcommand,
}

#[derive(Subcommand)]
pub enum ListSubcommand {
    /// List all shopping lists
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a list's items
    Show {
        /// List ID or name
        list: String,

        /// Arrange items by this supermarket's aisle order
        #[arg(long, short)]
        supermarket: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a new list
    Create {
        /// Name of the list
        name: String,

        /// Seed items from a default list (can be repeated)
        #[arg(long = "from", value_name = "DEFAULT_LIST")]
        from: Vec<String>,
    },

    /// Rename a list
    Rename {
        /// List ID or name
        list: String,

        /// New name
        name: String,
    },

    /// Delete a list
    Delete {
        /// List ID or name
        list: String,
    },

    /// Add an item to a list
    Add {
        /// List ID or name
        list: String,

        /// Item name
        name: String,

        /// Category (ID or name)
        #[arg(long)]
        category: Option<String>,

        /// Quantity (e.g., "2", "500 g")
        #[arg(long, short)]
        qty: Option<String>,
    },

    /// Remove an item from a list
    Remove {
        /// List ID or name
        list: String,

        /// Item name
        item: String,
    },

    /// Toggle an item's checked state
    Check {
        /// List ID or name
        list: String,

        /// Item name
        item: String,
    },

    /// Set a list's status
    Status {
        /// List ID or name
        list: String,

        #[arg(value_enum)]
        status: StatusArg,
    },

    /// Assign a supermarket to a list
    Assign {
        /// List ID or name
        list: String,

        /// Supermarket ID or name; omit to clear
        supermarket: Option<String>,
    },
}

impl ListCommand {
    pub fn run(&self, stores: &Stores) -> Result<(), Box<dyn std::error::Error>> {
        let lists = stores.lists();
        match &self.command {
            ListSubcommand::List { format } => {
                let all = lists.get_all()?;
                if all.is_empty() {
                    println!("No lists found");
                    return Ok(());
                }
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&all)?),
                    OutputFormat::Text => {
                        println!("{:<36}  {:<30}  {:>5}  {:>4}  STATUS", "ID", "NAME", "ITEMS", "DONE");
                        println!("{}", "-".repeat(96));
                        for list in &all {
                            println!(
                                "{:<36}  {:<30}  {:>5}  {:>3}%  {}",
                                list.id,
                                truncate(&list.name, 30),
                                list.items.len(),
                                list.progress(),
                                list.status
                            );
                        }
                        println!("\nTotal: {} list(s)", all.len());
                    }
                }
                Ok(())
            }

            ListSubcommand::Show {
                list,
                supermarket,
                format,
            } => {
                let list = find_list(&lists, list)?;
                if let OutputFormat::Json = format {
                    println!("{}", serde_json::to_string_pretty(&list)?);
                    return Ok(());
                }

                let custom = stores.categories().get_all()?;
                println!("{} ({}, {}% done)", list.name, list.status, list.progress());
                println!();

                let supermarket = match supermarket.as_deref().or(list.supermarket_id.as_deref()) {
                    Some(key) => Some(super::supermarket::find_supermarket(stores, key)?),
                    None => None,
                };
                let groups = match &supermarket {
                    Some(sm) => {
                        println!("Arranged for {}", sm.name);
                        sm.arrange(&list.items)
                    }
                    None => group_by_category(&list),
                };
                for (category, items) in groups {
                    println!("{}", category_label(&category, &custom));
                    for item in items {
                        print_item(item);
                    }
                }
                Ok(())
            }

            ListSubcommand::Create { name, from } => {
                if name.trim().is_empty() {
                    return Err("List name cannot be empty".into());
                }
                let new = if from.is_empty() {
                    NewList::named(name)
                } else {
                    let defaults = stores.default_lists();
                    let mut sources = Vec::new();
                    for key in from {
                        let found = match defaults.get(key)? {
                            Some(dl) => Some(dl),
                            None => defaults.find_by_name(key)?,
                        };
                        sources.push(found.ok_or_else(|| format!("Default list not found: {}", key))?);
                    }
                    NewList::from_defaults(name, &sources)
                };
                let created = lists.create(new)?;
                println!("Created list '{}' with {} item(s)", created.name, created.items.len());
                Ok(())
            }

            ListSubcommand::Rename { list, name } => {
                let found = find_list(&lists, list)?;
                let update = ListUpdate {
                    name: Some(name.clone()),
                    ..Default::default()
                };
                lists.update(&found.id, update)?;
                println!("Renamed '{}' to '{}'", found.name, name.trim());
                Ok(())
            }

            ListSubcommand::Delete { list } => {
                let found = find_list(&lists, list)?;
                lists.delete(&found.id)?;
                println!("Deleted list '{}'", found.name);
                Ok(())
            }

            ListSubcommand::Add {
                list,
                name,
                category,
                qty,
            } => {
                if name.trim().is_empty() {
                    return Err("Item name cannot be empty".into());
                }
                let found = find_list(&lists, list)?;
                let custom = stores.categories().get_all()?;
                let category_id = category
                    .as_deref()
                    .map(|c| parse_category(c, &custom))
                    .unwrap_or_default();
                let item = Item::new(name, category_id, qty.clone().unwrap_or_default());
                lists.add_item(&found.id, item)?;
                println!("Added '{}' to '{}'", name.trim(), found.name);
                Ok(())
            }

            ListSubcommand::Remove { list, item } => {
                let found = find_list(&lists, list)?;
                let target = find_item(&found, item)?;
                lists.remove_item(&found.id, &target.id)?;
                println!("Removed '{}' from '{}'", target.name, found.name);
                Ok(())
            }

            ListSubcommand::Check { list, item } => {
                let found = find_list(&lists, list)?;
                let target = find_item(&found, item)?;
                lists.toggle_item(&found.id, &target.id)?;
                let state = if target.checked { "unchecked" } else { "checked" };
                println!("{} '{}'", state, target.name);
                Ok(())
            }

            ListSubcommand::Status { list, status } => {
                let found = find_list(&lists, list)?;
                let status = ListStatus::from(*status);
                lists.set_status(&found.id, status)?;
                println!("'{}' is now {}", found.name, status);
                Ok(())
            }

            ListSubcommand::Assign { list, supermarket } => {
                let found = find_list(&lists, list)?;
                let supermarket_id = match supermarket {
                    Some(key) => Some(super::supermarket::find_supermarket(stores, key)?.id),
                    None => None,
                };
                let update = ListUpdate {
                    supermarket_id: Some(supermarket_id),
                    ..Default::default()
                };
                lists.update(&found.id, update)?;
                println!("Updated supermarket of '{}'", found.name);
                Ok(())
            }
        }
    }
}

fn find_list(lists: &ListStore, key: &str) -> Result<ShoppingList, Box<dyn std::error::Error>> {
    let found = match lists.get(key)? {
        Some(list) => Some(list),
        None => lists.find_by_name(key)?,
    };
    found.ok_or_else(|| format!("List not found: {}", key).into())
}

fn find_item(list: &ShoppingList, name: &str) -> Result<Item, Box<dyn std::error::Error>> {
    list.find_item(name)
        .cloned()
        .ok_or_else(|| format!("Item not found in '{}': {}", list.name, name).into())
}

/// Groups items by category in first-seen order.
fn group_by_category(list: &ShoppingList) -> Vec<(CategoryId, Vec<&Item>)> {
    let mut groups: Vec<(CategoryId, Vec<&Item>)> = Vec::new();
    for item in &list.items {
        match groups.iter_mut().find(|(c, _)| c == &item.category_id) {
            Some((_, items)) => items.push(item),
            None => groups.push((item.category_id.clone(), vec![item])),
        }
    }
    groups
}

fn print_item(item: &Item) {
    let mark = if item.checked { "[x]" } else { "[ ]" };
    if item.quantity.is_empty() {
        println!("  {} {}", mark, item.name);
    } else {
        println!("  {} {} ({})", mark, item.name, item.quantity);
    }
}
