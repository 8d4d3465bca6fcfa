//! Selection snapshots taken across a transaction.
//!
//! Rows that move are removed and re-inserted by the consumer, which drops
//! their selection. Capturing the selected identities before the transaction
//! lets the accumulator report where those rows ended up.

use alloc::rc::Rc;
use core::hash::Hash;
use hashbrown::HashSet;
use tidemark_core::{IndexSet, Record};
use tracing::warn;

/// Captures selections into identity snapshots.
pub struct SelectionTracker;

impl SelectionTracker {
    /// Maps selected positions in `objects` to record identities.
    ///
    /// Positions past the end of `objects` are skipped.
    pub fn capture<R: Record>(selection: &IndexSet, objects: &[Rc<R>]) -> SelectionSnapshot<R::Id> {
        let mut ids = HashSet::with_capacity(selection.len());
        for index in selection {
            match objects.get(index) {
                Some(record) => {
                    ids.insert(record.id());
                }
                None => warn!(index, count = objects.len(), "selected index out of range"),
            }
        }
        SelectionSnapshot { ids }
    }
}

/// Identities selected when a transaction started.
#[derive(Clone, Debug)]
pub struct SelectionSnapshot<Id> {
    ids: HashSet<Id>,
}

impl<Id> Default for SelectionSnapshot<Id> {
    fn default() -> Self {
        Self { ids: HashSet::new() }
    }
}

impl<Id: Eq + Hash> SelectionSnapshot<Id> {
    pub fn contains(&self, id: &Id) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Post-change positions in `objects` of selected records that moved.
    pub fn restore<R>(&self, moved: &HashSet<Id>, objects: &[Rc<R>]) -> IndexSet
    where
        R: Record<Id = Id>,
    {
        if self.ids.is_empty() || moved.is_empty() {
            return IndexSet::new();
        }
        objects
            .iter()
            .enumerate()
            .filter(|(_, record)| {
                let id = record.id();
                moved.contains(&id) && self.ids.contains(&id)
            })
            .map(|(index, _)| index)
            .collect()
    }
}
