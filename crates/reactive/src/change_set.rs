//! Buffered elementary changes and their consolidated form.
//!
//! A `ChangeBatch` holds the `(identity, index)` pairs reported during one
//! transaction, one bucket per change kind. Pairs are deduplicated, so a
//! store repeating an event has no effect. `ConsolidatedChanges` is what the
//! batch reduces to once the transaction ends.

use core::hash::Hash;
use hashbrown::HashSet;
use tidemark_core::IndexSet;

/// Deduplicated per-kind buckets of `(identity, index)` pairs.
///
/// Removal indices refer to the ordering before the transaction, insertion
/// indices to the ordering after it. A move is recorded as a removal at its
/// source plus an insertion at its destination.
#[derive(Clone, Debug)]
pub struct ChangeBatch<Id> {
    insertions: HashSet<(Id, usize)>,
    removals: HashSet<(Id, usize)>,
    updatings: HashSet<(Id, usize)>,
}

impl<Id> Default for ChangeBatch<Id> {
    fn default() -> Self {
        Self {
            insertions: HashSet::new(),
            removals: HashSet::new(),
            updatings: HashSet::new(),
        }
    }
}

impl<Id: Clone + Eq + Hash> ChangeBatch<Id> {
    /// Creates an empty batch.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an insertion. Returns false if the pair was already present.
    #[inline]
    pub fn insert(&mut self, id: Id, index: usize) -> bool {
        self.insertions.insert((id, index))
    }

    /// Records a removal. Returns false if the pair was already present.
    #[inline]
    pub fn remove(&mut self, id: Id, index: usize) -> bool {
        self.removals.insert((id, index))
    }

    /// Records an update. Returns false if the pair was already present.
    #[inline]
    pub fn update(&mut self, id: Id, index: usize) -> bool {
        self.updatings.insert((id, index))
    }

    /// Records a move as a removal at `from` and an insertion at `to`.
    pub fn record_move(&mut self, id: Id, from: usize, to: usize) {
        self.removals.insert((id.clone(), from));
        self.insertions.insert((id, to));
    }

    pub fn insertions(&self) -> &HashSet<(Id, usize)> {
        &self.insertions
    }

    pub fn removals(&self) -> &HashSet<(Id, usize)> {
        &self.removals
    }

    pub fn updatings(&self) -> &HashSet<(Id, usize)> {
        &self.updatings
    }

    /// Returns true if nothing has been recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty() && self.removals.is_empty() && self.updatings.is_empty()
    }

    /// Returns the number of distinct pairs across all buckets.
    #[inline]
    pub fn len(&self) -> usize {
        self.insertions.len() + self.removals.len() + self.updatings.len()
    }

    /// Identities present in both the removal and insertion buckets.
    pub fn moved(&self) -> HashSet<Id> {
        let removed: HashSet<&Id> = self.removals.iter().map(|(id, _)| id).collect();
        self.insertions
            .iter()
            .filter(|(id, _)| removed.contains(id))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Reduces the buckets to index sets. `selected` is left empty; the
    /// accumulator fills it from its selection snapshot.
    pub fn consolidate(&self) -> ConsolidatedChanges<Id> {
        ConsolidatedChanges {
            removed: indexes(&self.removals),
            inserted: indexes(&self.insertions),
            updated: indexes(&self.updatings),
            selected: IndexSet::new(),
            moved: self.moved(),
        }
    }

    /// Clears all buckets.
    pub fn clear(&mut self) {
        self.insertions.clear();
        self.removals.clear();
        self.updatings.clear();
    }
}

fn indexes<Id>(bucket: &HashSet<(Id, usize)>) -> IndexSet {
    bucket.iter().map(|(_, index)| *index).collect()
}

/// The result of one transaction, as delivered to a sink.
#[derive(Clone, Debug)]
pub struct ConsolidatedChanges<Id> {
    /// Pre-change positions of removed rows.
    pub removed: IndexSet,
    /// Post-change positions of inserted rows.
    pub inserted: IndexSet,
    /// Positions of rows updated in place.
    pub updated: IndexSet,
    /// Post-change positions of selected rows that moved.
    pub selected: IndexSet,
    /// Identities removed and re-inserted during the transaction.
    pub moved: HashSet<Id>,
}

impl<Id> Default for ConsolidatedChanges<Id> {
    fn default() -> Self {
        Self {
            removed: IndexSet::new(),
            inserted: IndexSet::new(),
            updated: IndexSet::new(),
            selected: IndexSet::new(),
            moved: HashSet::new(),
        }
    }
}

impl<Id> ConsolidatedChanges<Id> {
    /// Returns true if no index set carries anything.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
            && self.inserted.is_empty()
            && self.updated.is_empty()
            && self.selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_batch_new() {
        let batch = ChangeBatch::<u64>::new();
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
        assert!(batch.consolidate().is_empty());
    }

    #[test]
    fn test_change_batch_dedup() {
        let mut batch = ChangeBatch::new();
        assert!(batch.insert(1u64, 4));
        assert!(!batch.insert(1u64, 4));
        assert!(batch.insert(2u64, 4));
        assert_eq!(batch.insertions().len(), 2);

        // Same index from two records collapses in the index set
        let changes = batch.consolidate();
        assert_eq!(changes.inserted, IndexSet::from([4]));
    }

    #[test]
    fn test_change_batch_move() {
        let mut batch = ChangeBatch::new();
        batch.record_move(7u64, 3, 7);

        let changes = batch.consolidate();
        assert_eq!(changes.removed, IndexSet::from([3]));
        assert_eq!(changes.inserted, IndexSet::from([7]));
        assert!(changes.moved.contains(&7));
        assert_eq!(changes.moved.len(), 1);
    }

    #[test]
    fn test_change_batch_remove_and_insert_is_moved() {
        let mut batch = ChangeBatch::new();
        batch.remove(1u64, 0);
        batch.insert(1u64, 5);
        batch.insert(2u64, 1);
        batch.update(3u64, 2);

        let changes = batch.consolidate();
        assert_eq!(changes.moved.len(), 1);
        assert!(changes.moved.contains(&1));
        assert_eq!(changes.updated, IndexSet::from([2]));
    }

    #[test]
    fn test_change_batch_clear() {
        let mut batch = ChangeBatch::new();
        batch.insert(1u64, 0);
        batch.remove(2u64, 1);
        batch.update(3u64, 2);
        assert_eq!(batch.len(), 3);

        batch.clear();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_consolidated_is_empty_ignores_moved() {
        let mut changes = ConsolidatedChanges::<u64>::default();
        assert!(changes.is_empty());
        changes.selected.insert(3);
        assert!(!changes.is_empty());
    }
}
