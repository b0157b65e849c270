//! Query pairs and relevance sets

use std::collections::HashSet;
use std::hash::Hash;

/// Ground-truth items for one query, deduplicated for O(1) membership tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevanceSet<T: Eq + Hash> {
    items: HashSet<T>,
}

impl<T: Eq + Hash> RelevanceSet<T> {
    /// Build a set from a raw ground-truth sequence; duplicates collapse.
    pub fn from_sequence(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    /// Number of distinct relevant items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: Eq + Hash> Default for RelevanceSet<T> {
    fn default() -> Self {
        Self {
            items: HashSet::new(),
        }
    }
}

impl<T: Eq + Hash> FromIterator<T> for RelevanceSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_sequence(iter)
    }
}

/// One evaluation unit: a predicted ranking and the set of items that are
/// actually relevant for it.
///
/// The relevance set is derived once at construction and shared by every
/// metric computed on the pair. Predictions keep their order and any
/// duplicates; each position is scored on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPair<T: Eq + Hash> {
    predictions: Vec<T>,
    relevant: RelevanceSet<T>,
}

impl<T: Eq + Hash> QueryPair<T> {
    /// Create a pair from a ranked prediction list and a raw ground-truth sequence
    pub fn new(predictions: Vec<T>, ground_truth: impl IntoIterator<Item = T>) -> Self {
        Self {
            predictions,
            relevant: RelevanceSet::from_sequence(ground_truth),
        }
    }

    /// Create a pair from arbitrary iterables (used by adapters that do not
    /// hold `Vec`s)
    pub fn from_iterables<P, G>(predictions: P, ground_truth: G) -> Self
    where
        P: IntoIterator<Item = T>,
        G: IntoIterator<Item = T>,
    {
        Self::new(predictions.into_iter().collect(), ground_truth)
    }

    pub fn predictions(&self) -> &[T] {
        &self.predictions
    }

    pub fn relevant(&self) -> &RelevanceSet<T> {
        &self.relevant
    }
}

impl<T: Eq + Hash> From<(Vec<T>, Vec<T>)> for QueryPair<T> {
    fn from((predictions, ground_truth): (Vec<T>, Vec<T>)) -> Self {
        Self::new(predictions, ground_truth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relevance_set_dedups() {
        let set = RelevanceSet::from_sequence(vec![3, 2, 4, 2, 3]);
        assert_eq!(set.len(), 3);
        assert!(set.contains(&2));
        assert!(!set.contains(&1));
    }

    #[test]
    fn test_empty_relevance_set_is_valid() {
        let set: RelevanceSet<&str> = RelevanceSet::from_sequence(Vec::new());
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_query_pair_keeps_prediction_order_and_duplicates() {
        let pair = QueryPair::new(vec!["b", "a", "b"], vec!["a", "a"]);
        assert_eq!(pair.predictions(), &["b", "a", "b"]);
        assert_eq!(pair.relevant().len(), 1);
    }

    #[test]
    fn test_from_iterables_accepts_any_collection() {
        let ground_truth: std::collections::BTreeSet<u32> = [1, 2].into_iter().collect();
        let pair = QueryPair::from_iterables(std::iter::once(5).chain(1..3), ground_truth);
        assert_eq!(pair.predictions(), &[5, 1, 2]);
        assert!(pair.relevant().contains(&1));
    }
}
