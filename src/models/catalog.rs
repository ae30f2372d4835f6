use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ItemId;

/// A car in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: ItemId,
    /// Make, model and year, e.g. "toyota camry 2020". Not unique.
    pub title: String,
    /// Free-form feature description; missing values are stored as ""
    pub features: String,
}

impl Item {
    pub fn new(id: i64, title: impl Into<String>, features: impl Into<String>) -> Self {
        Self {
            id: ItemId(id),
            title: title.into(),
            features: features.into(),
        }
    }
}

/// Immutable table of cars, in load order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<Item>,
    positions: HashMap<ItemId, usize>,
}

impl Catalog {
    /// Creates a catalog. If an id repeats, lookups by id resolve to its first row.
    pub fn new(items: Vec<Item>) -> Self {
        let mut positions = HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            positions.entry(item.id).or_insert(idx);
        }
        Self { items, positions }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Row position of an item, used as the tie-break order for rankings
    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.position(id).map(|idx| &self.items[idx])
    }

    pub fn title_of(&self, id: ItemId) -> Option<&str> {
        self.get(id).map(|item| item.title.as_str())
    }
}

impl FromIterator<Item> for Catalog {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Lookup key for a title: lower-case with whitespace runs collapsed to one space
pub fn normalize_title_key(title: &str) -> String {
    title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
