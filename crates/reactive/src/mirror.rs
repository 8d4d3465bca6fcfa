//! A sink that keeps a list of identities in step with the view.
//!
//! `ListMirror` behaves like a list widget: it applies removals against the
//! old positions, then insertions against the new ones, reading inserted rows
//! from the store. Its selection shifts with those edits the way a widget's
//! would, so selected rows that move lose their selection until `did_select`
//! restores it.

use crate::sink::ChangeSink;
use alloc::vec::Vec;
use tidemark_core::{IndexSet, Record};
use tidemark_store::{AnyStore, StoreDataSource};
use tracing::warn;

/// Mirrors the identities of a store's view through sink callbacks.
pub struct ListMirror<R: Record> {
    source: AnyStore<R>,
    ids: Vec<R::Id>,
    selection: IndexSet,
    last_updated: IndexSet,
}

impl<R: Record> ListMirror<R> {
    /// Creates a mirror holding the current contents of `source`.
    pub fn new(source: AnyStore<R>) -> Self {
        let ids = source.objects().iter().map(|r| r.id()).collect();
        Self {
            source,
            ids,
            selection: IndexSet::new(),
            last_updated: IndexSet::new(),
        }
    }

    /// The mirrored identities, in view order.
    pub fn ids(&self) -> &[R::Id] {
        &self.ids
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn selection(&self) -> &IndexSet {
        &self.selection
    }

    /// Selects `selection`, ignoring positions past the end.
    pub fn select(&mut self, selection: IndexSet) {
        let len = self.ids.len();
        self.selection = selection.into_iter().filter(|&i| i < len).collect();
    }

    /// Identities of the selected rows, in view order.
    pub fn selected_ids(&self) -> Vec<R::Id> {
        self.selection
            .iter()
            .filter_map(|i| self.ids.get(i).cloned())
            .collect()
    }

    /// Rows reported as updated by the last transaction.
    pub fn last_updated(&self) -> &IndexSet {
        &self.last_updated
    }

    /// Returns true if the mirror matches the store's current view.
    pub fn is_in_sync(&self) -> bool {
        let objects = self.source.objects();
        objects.len() == self.ids.len()
            && objects.iter().zip(&self.ids).all(|(record, id)| &record.id() == id)
    }
}

impl<R: Record> ChangeSink for ListMirror<R> {
    fn will_change_content(&mut self) {
        self.last_updated.clear();
    }

    fn did_remove(&mut self, indexes: &IndexSet) {
        for index in indexes.iter_rev() {
            if index >= self.ids.len() {
                warn!(index, len = self.ids.len(), "removal out of range");
                continue;
            }
            self.ids.remove(index);
        }

        // Removed rows lose their selection, the rest close the gap
        let mut shift = 0;
        let mut removed = indexes.iter().peekable();
        let mut selection = IndexSet::new();
        for selected in self.selection.iter() {
            while removed.next_if(|&r| r < selected).is_some() {
                shift += 1;
            }
            if removed.peek() != Some(&selected) {
                selection.insert(selected - shift);
            }
        }
        self.selection = selection;
    }

    fn did_insert(&mut self, indexes: &IndexSet) {
        for index in indexes.iter() {
            let Some(record) = self.source.object_at(index) else {
                warn!(index, "inserted row missing from store");
                continue;
            };
            if index > self.ids.len() {
                warn!(index, len = self.ids.len(), "insertion out of range");
                continue;
            }
            self.ids.insert(index, record.id());
            self.selection = self
                .selection
                .iter()
                .map(|s| if s >= index { s + 1 } else { s })
                .collect();
        }
    }

    fn did_update(&mut self, indexes: &IndexSet) {
        self.last_updated = indexes.clone();
    }

    fn did_select(&mut self, indexes: &IndexSet) {
        self.selection.extend(indexes.iter());
    }

    fn did_change_content(&mut self) {}

    fn did_reload_content(&mut self) {
        self.ids = self.source.objects().iter().map(|r| r.id()).collect();
        self.selection.clear();
        self.last_updated.clear();
    }

    fn current_selection(&self) -> IndexSet {
        self.selection.clone()
    }
}
