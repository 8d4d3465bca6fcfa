//! The consumer-facing notification contract.

use tidemark_core::IndexSet;

/// Receives consolidated changes, once per transaction.
///
/// A transaction is delivered as
///
/// ```text
/// will_change_content, did_remove, did_insert, did_update, did_select, did_change_content
/// ```
///
/// with every index set present even when empty. A refetch is delivered as a
/// lone `did_reload_content`. Removal and update indices refer to the view
/// before the transaction. Insertion and selection indices refer to the view
/// after it, ready to apply once removals are done.
pub trait ChangeSink {
    fn will_change_content(&mut self);

    fn did_remove(&mut self, indexes: &IndexSet);

    fn did_insert(&mut self, indexes: &IndexSet);

    /// Rows whose content changed in place, at their old positions.
    fn did_update(&mut self, indexes: &IndexSet);

    /// Rows that moved while selected, at their new positions.
    fn did_select(&mut self, indexes: &IndexSet);

    fn did_change_content(&mut self);

    /// The whole view was refetched; discard anything derived from it.
    fn did_reload_content(&mut self);

    /// Positions currently selected, sampled when a transaction starts.
    fn current_selection(&self) -> IndexSet {
        IndexSet::new()
    }
}
