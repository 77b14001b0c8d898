//! Custom-item catalog boundary.
//!
//! The custom-item plugin owns item definitions; the core only asks whether an
//! id exists and asks for a stack of it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A built item stack handed back to the host for placement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStack {
    /// Custom item id.
    pub item_id: String,
    /// Stack size.
    pub amount: u32,
}

impl ItemStack {
    /// Creates a stack.
    #[must_use]
    pub fn new(item_id: impl Into<String>, amount: u32) -> Self {
        Self {
            item_id: item_id.into(),
            amount,
        }
    }
}

/// Custom-item catalog (implemented by the host adapter).
pub trait ItemCatalog: Send + Sync {
    /// Returns true if the item id is defined.
    fn exists(&self, item_id: &str) -> bool;

    /// Builds a single item of `item_id`, or `None` if it cannot be built.
    fn build(&self, item_id: &str) -> Option<ItemStack>;

    /// Builds a stack of `amount` items.
    fn build_stack(&self, item_id: &str, amount: u32) -> Option<ItemStack> {
        self.build(item_id).map(|mut stack| {
            stack.amount = amount;
            stack
        })
    }
}

/// In-memory catalog backed by a fixed id set.
#[derive(Clone, Debug, Default)]
pub struct MemoryCatalog {
    ids: HashSet<String>,
}

impl MemoryCatalog {
    /// Creates a catalog containing `ids`.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of defined items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if no item is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl ItemCatalog for MemoryCatalog {
    fn exists(&self, item_id: &str) -> bool {
        self.ids.contains(item_id)
    }

    fn build(&self, item_id: &str) -> Option<ItemStack> {
        self.exists(item_id).then(|| ItemStack::new(item_id, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_catalog_builds_known_items_only() {
        let catalog = MemoryCatalog::new(["ruby", "sapphire"]);
        assert_eq!(catalog.build_stack("ruby", 4), Some(ItemStack::new("ruby", 4)));
        assert_eq!(catalog.build("onyx"), None);
        assert_eq!(catalog.len(), 2);
    }
}
