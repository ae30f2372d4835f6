use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use super::ItemId;

/// Guards min-max normalization against an all-equal score distribution
pub const NORMALIZATION_EPSILON: f64 = 1e-9;

/// One entry of a score series
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ScoredItem {
    pub id: ItemId,
    pub score: f64,
}

/// Ordered mapping from car id to score, produced per query
///
/// Order is meaningful: it is the tie-break order for [`ScoreSeries::top_k`].
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct ScoreSeries {
    entries: Vec<ScoredItem>,
}

impl ScoreSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: ItemId, score: f64) {
        self.entries.push(ScoredItem { id, score });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredItem> {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    pub fn get(&self, id: ItemId) -> Option<f64> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.score)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn retain<F: FnMut(&ScoredItem) -> bool>(&mut self, f: F) {
        self.entries.retain(f);
    }

    /// Rescales scores to [0, 1] with `(s - min) / (max - min + eps)`
    pub fn min_max_normalize(mut self) -> Self {
        let (min, max) = self
            .entries
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
                (lo.min(e.score), hi.max(e.score))
            });
        let range = max - min + NORMALIZATION_EPSILON;
        for entry in &mut self.entries {
            entry.score = (entry.score - min) / range;
        }
        self
    }

    /// Keeps the `n` highest scores; equal scores keep their current relative order
    pub fn top_k(mut self, n: usize) -> Self {
        self.entries
            .sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        self.entries.truncate(n);
        self
    }

    /// Reorders entries by `rank(id)`; ids without a rank go last in current order
    pub fn order_by<F: Fn(ItemId) -> Option<usize>>(mut self, rank: F) -> Self {
        self.entries
            .sort_by_key(|e| rank(e.id).unwrap_or(usize::MAX));
        self
    }
}

impl FromIterator<(ItemId, f64)> for ScoreSeries {
    fn from_iter<T: IntoIterator<Item = (ItemId, f64)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(id, score)| ScoredItem { id, score })
                .collect(),
        }
    }
}

/// A score mapped back to its display title
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoredTitle {
    pub id: ItemId,
    pub title: String,
    pub score: f64,
}

/// Aligns two series on the union of their ids
///
/// An id missing from one side gets score 0 on that side; nothing is dropped.
/// Both outputs share one order: ids of `left` first, then ids only in `right`.
pub fn align(left: &ScoreSeries, right: &ScoreSeries) -> (ScoreSeries, ScoreSeries) {
    let right_scores: HashMap<ItemId, f64> = right.iter().map(|e| (e.id, e.score)).collect();
    let left_ids: HashSet<ItemId> = left.ids().collect();

    let mut aligned_left = ScoreSeries::new();
    let mut aligned_right = ScoreSeries::new();

    for entry in left.iter() {
        aligned_left.push(entry.id, entry.score);
        aligned_right.push(entry.id, right_scores.get(&entry.id).copied().unwrap_or(0.0));
    }
    for entry in right.iter().filter(|e| !left_ids.contains(&e.id)) {
        aligned_left.push(entry.id, 0.0);
        aligned_right.push(entry.id, entry.score);
    }

    (aligned_left, aligned_right)
}

/// `alpha * cf + (1 - alpha) * cb` over the zero-filled union of both series
pub fn blend(alpha: f64, cf: &ScoreSeries, cb: &ScoreSeries) -> ScoreSeries {
    let (cf, cb) = align(cf, cb);
    cf.iter()
        .zip(cb.iter())
        .map(|(c, b)| (c.id, alpha * c.score + (1.0 - alpha) * b.score))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(pairs: &[(i64, f64)]) -> ScoreSeries {
        pairs.iter().map(|&(id, s)| (ItemId(id), s)).collect()
    }

    #[test]
    fn test_min_max_normalize_range() {
        let normalized = series(&[(1, 2.0), (2, 4.0), (3, 3.0)]).min_max_normalize();
        assert!(normalized.get(ItemId(1)).unwrap().abs() < 1e-12);
        assert!((normalized.get(ItemId(2)).unwrap() - 1.0).abs() < 1e-6);
        assert!((normalized.get(ItemId(3)).unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_min_max_normalize_all_equal_is_zero() {
        let normalized = series(&[(1, 0.7), (2, 0.7)]).min_max_normalize();
        assert!(normalized.iter().all(|e| e.score == 0.0));
    }

    #[test]
    fn test_min_max_normalize_empty() {
        assert!(ScoreSeries::new().min_max_normalize().is_empty());
    }

    #[test]
    fn test_top_k_is_stable_on_ties() {
        let top = series(&[(1, 0.5), (2, 0.9), (3, 0.5), (4, 0.5)]).top_k(3);
        let ids: Vec<ItemId> = top.ids().collect();
        assert_eq!(ids, vec![ItemId(2), ItemId(1), ItemId(3)]);
    }

    #[test]
    fn test_order_by_rank() {
        let ordered = series(&[(3, 0.1), (9, 0.2), (1, 0.3)])
            .order_by(|id| if id == ItemId(9) { None } else { Some(id.0 as usize) });
        let ids: Vec<ItemId> = ordered.ids().collect();
        assert_eq!(ids, vec![ItemId(1), ItemId(3), ItemId(9)]);
    }

    #[test]
    fn test_align_zero_fills_union() {
        let (l, r) = align(&series(&[(1, 0.4), (2, 0.6)]), &series(&[(2, 0.1), (3, 0.8)]));
        assert_eq!(l, series(&[(1, 0.4), (2, 0.6), (3, 0.0)]));
        assert_eq!(r, series(&[(1, 0.0), (2, 0.1), (3, 0.8)]));
    }

    #[test]
    fn test_blend_weights() {
        let cf = series(&[(1, 1.0)]);
        let cb = series(&[(2, 1.0)]);
        let blended = blend(0.25, &cf, &cb);
        assert_eq!(blended.get(ItemId(1)), Some(0.25));
        assert_eq!(blended.get(ItemId(2)), Some(0.75));
    }
}
