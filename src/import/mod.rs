//! Importing shared or generated entities into local state.

mod ai;
mod merge;
mod quantity;

pub use ai::parse_ai_items;
pub use merge::{import_payload, merge_items, ImportOutcome, IMPORTED_NAME};
pub use quantity::{combine_items, merge_quantity};

use std::fmt;
use std::str::FromStr;

use crate::share::ShareKind;
use crate::stores::StoreError;

/// How an incoming entity is combined with local data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Insert as an additional entity, even on a name collision.
    #[default]
    New,
    /// Replace the content of the entity with the same name.
    Overwrite,
    /// Combine items into the entity with the same name.
    Merge,
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportMode::New => write!(f, "new"),
            ImportMode::Overwrite => write!(f, "overwrite"),
            ImportMode::Merge => write!(f, "merge"),
        }
    }
}

impl FromStr for ImportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" | "add" => Ok(ImportMode::New),
            "overwrite" | "replace" => Ok(ImportMode::Overwrite),
            "merge" => Ok(ImportMode::Merge),
            _ => Err(format!(
                "Invalid import mode '{}'. Valid options: new, overwrite, merge",
                s
            )),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Nothing to import: {0}")]
    Malformed(String),

    #[error("Import mode '{mode}' is not supported for a {kind}")]
    UnsupportedMode { mode: ImportMode, kind: ShareKind },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("add".parse::<ImportMode>().unwrap(), ImportMode::New);
        assert_eq!("MERGE".parse::<ImportMode>().unwrap(), ImportMode::Merge);
        assert!("sideways".parse::<ImportMode>().is_err());
    }
}
