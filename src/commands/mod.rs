mod category;
mod config_cmd;
mod default_list;
mod list;
mod share_cmd;
mod shared;
mod supermarket;
mod sync_cmd;

pub use category::CategoryCommand;
pub use config_cmd::ConfigCommand;
pub use default_list::DefaultListCommand;
pub use list::ListCommand;
pub use share_cmd::{AiImportCommand, ImportCommand, ShareCommand};
pub use shared::SharedCommand;
pub use supermarket::SupermarketCommand;
pub use sync_cmd::SyncCommand;

use std::sync::Arc;

use clap::ValueEnum;
use shoplist::models::{builtin, CategoryId, CustomCategory, BUILTIN_CATEGORIES};
use shoplist::sync::{AuthToken, HttpRemote, SyncEngine, SyncError};
use shoplist::Stores;

use crate::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Resolves a category argument.
///
/// Accepts a built-in ID, a built-in name, a custom category ID or a custom
/// category name (names are case-insensitive). Anything else is "Other".
pub fn parse_category(arg: &str, custom: &[CustomCategory]) -> CategoryId {
    let arg = arg.trim();
    let lower = arg.to_lowercase();
    if let CategoryId::Builtin(id) = CategoryId::from(arg) {
        if builtin(id).is_some() {
            return CategoryId::Builtin(id);
        }
    }
    if let Some(c) = BUILTIN_CATEGORIES
        .iter()
        .find(|c| c.name.to_lowercase() == lower || c.legacy_key == lower)
    {
        return CategoryId::Builtin(c.id);
    }
    custom
        .iter()
        .find(|c| c.id == arg || c.name.to_lowercase() == lower)
        .map(CustomCategory::category_id)
        .unwrap_or_else(CategoryId::other)
}

/// Truncates `text` to `width` characters for table output.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let head: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Builds a sync engine against the configured remote.
pub fn remote_engine(config: &Config, stores: &Stores) -> Result<(SyncEngine, AuthToken), SyncError> {
    let server_url = config
        .remote
        .server_url
        .as_deref()
        .ok_or(SyncError::NotConfigured)?;
    let token = config
        .remote
        .token
        .clone()
        .ok_or(SyncError::NotAuthenticated)?;
    let remote = Arc::new(HttpRemote::new(server_url));
    Ok((SyncEngine::new(stores.clone(), remote), AuthToken::new(token)))
}
