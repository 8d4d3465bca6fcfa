//! A sink that records every call it receives.

use crate::sink::ChangeSink;
use alloc::vec::Vec;
use tidemark_core::IndexSet;

/// One call received by a [`ChangeLog`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkEvent {
    WillChangeContent,
    DidRemove(IndexSet),
    DidInsert(IndexSet),
    DidUpdate(IndexSet),
    DidSelect(IndexSet),
    DidChangeContent,
    DidReloadContent,
}

/// Records sink calls in order, with a selection the caller controls.
#[derive(Clone, Debug, Default)]
pub struct ChangeLog {
    events: Vec<SinkEvent>,
    selection: IndexSet,
}

impl ChangeLog {
    /// Creates an empty log with nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty log reporting `selection` as selected.
    pub fn with_selection(selection: IndexSet) -> Self {
        Self {
            events: Vec::new(),
            selection,
        }
    }

    pub fn set_selection(&mut self, selection: IndexSet) {
        self.selection = selection;
    }

    #[inline]
    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    /// Drains the recorded events.
    pub fn take_events(&mut self) -> Vec<SinkEvent> {
        core::mem::take(&mut self.events)
    }

    /// Number of completed transactions recorded.
    pub fn transaction_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SinkEvent::DidChangeContent))
            .count()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl ChangeSink for ChangeLog {
    fn will_change_content(&mut self) {
        self.events.push(SinkEvent::WillChangeContent);
    }

    fn did_remove(&mut self, indexes: &IndexSet) {
        self.events.push(SinkEvent::DidRemove(indexes.clone()));
    }

    fn did_insert(&mut self, indexes: &IndexSet) {
        self.events.push(SinkEvent::DidInsert(indexes.clone()));
    }

    fn did_update(&mut self, indexes: &IndexSet) {
        self.events.push(SinkEvent::DidUpdate(indexes.clone()));
    }

    fn did_select(&mut self, indexes: &IndexSet) {
        self.events.push(SinkEvent::DidSelect(indexes.clone()));
    }

    fn did_change_content(&mut self) {
        self.events.push(SinkEvent::DidChangeContent);
    }

    fn did_reload_content(&mut self) {
        self.events.push(SinkEvent::DidReloadContent);
    }

    fn current_selection(&self) -> IndexSet {
        self.selection.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_log_records_in_order() {
        let mut log = ChangeLog::new();
        log.will_change_content();
        log.did_insert(&IndexSet::from([1]));
        log.did_change_content();

        assert_eq!(
            log.events(),
            &[
                SinkEvent::WillChangeContent,
                SinkEvent::DidInsert(IndexSet::from([1])),
                SinkEvent::DidChangeContent,
            ]
        );
        assert_eq!(log.transaction_count(), 1);
    }

    #[test]
    fn test_change_log_take_events() {
        let mut log = ChangeLog::new();
        log.did_reload_content();
        assert_eq!(log.take_events(), alloc::vec![SinkEvent::DidReloadContent]);
        assert!(log.is_empty());
    }

    #[test]
    fn test_change_log_selection() {
        let log = ChangeLog::with_selection(IndexSet::from([2, 4]));
        assert_eq!(log.current_selection(), IndexSet::from([2, 4]));
        assert!(ChangeLog::new().current_selection().is_empty());
    }
}
