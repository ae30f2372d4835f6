use serde::{Deserialize, Serialize};

use super::{ItemId, UserId};

/// One rating event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    /// Higher means stronger preference
    pub value: f64,
}

impl Rating {
    pub fn new(user_id: i64, item_id: i64, value: f64) -> Self {
        Self {
            user_id: UserId(user_id),
            item_id: ItemId(item_id),
            value,
        }
    }
}

/// Immutable table of ratings, in load order
///
/// Duplicates for the same (user, car) pair are kept here; the collaborative
/// model resolves them when it builds its matrix.
#[derive(Debug, Clone, Default)]
pub struct InteractionLog {
    ratings: Vec<Rating>,
}

impl InteractionLog {
    pub fn new(ratings: Vec<Rating>) -> Self {
        Self { ratings }
    }

    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// Cars rated by a user, in table order, possibly with repeats
    pub fn items_rated_by(&self, user_id: UserId) -> impl Iterator<Item = ItemId> + '_ {
        self.ratings
            .iter()
            .filter(move |r| r.user_id == user_id)
            .map(|r| r.item_id)
    }
}

impl FromIterator<Rating> for InteractionLog {
    fn from_iter<T: IntoIterator<Item = Rating>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
