use serde::{Deserialize, Serialize};
use std::fmt::Display;

mod catalog;
mod interactions;
mod scores;

pub use catalog::{normalize_title_key, Catalog, Item};
pub use interactions::{InteractionLog, Rating};
pub use scores::{align, blend, ScoreSeries, ScoredItem, ScoredTitle, NORMALIZATION_EPSILON};

/// Identifier for a car in the catalog (`carID` column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

/// Identifier for a user in the ratings table (`userID` column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
