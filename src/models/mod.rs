mod category;
mod default_list;
mod shopping_list;
mod supermarket;

pub use category::{
    builtin, category_label, legacy_builtin_id, resolve_legacy_category_id, BuiltinCategory,
    CategoryId, CustomCategory, BUILTIN_CATEGORIES, CUSTOM_PREFIX, OTHER,
};
pub use default_list::{DefaultItem, DefaultList};
pub use shopping_list::{new_id, Item, ListStatus, ShoppingList};
pub use supermarket::Supermarket;
