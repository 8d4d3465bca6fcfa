//! Elementary change events and the observer contract that receives them.
//!
//! A store reports one transaction as:
//!
//! ```text
//! will_change, (did_remove | did_insert | did_move | did_update)*, did_change
//! ```
//!
//! or, after a refetch, as a single `did_reload` with no elementary events.
//! Removal, update and move-source indices refer to the ordering before the
//! transaction; insertion and move-destination indices refer to the ordering
//! after it.

use alloc::rc::Rc;
use tidemark_core::{ProtocolError, Record};

/// Result of delivering one event to an observer.
pub type ObserverResult = Result<(), ProtocolError>;

/// One atomic change to the view, for a single record.
#[derive(Debug)]
pub enum ElementaryChange<R> {
    Insert { record: Rc<R>, index: usize },
    Remove { record: Rc<R>, index: usize },
    Update { record: Rc<R>, index: usize },
    Move { record: Rc<R>, from: usize, to: usize },
}

impl<R> Clone for ElementaryChange<R> {
    fn clone(&self) -> Self {
        match self {
            ElementaryChange::Insert { record, index } => ElementaryChange::Insert {
                record: Rc::clone(record),
                index: *index,
            },
            ElementaryChange::Remove { record, index } => ElementaryChange::Remove {
                record: Rc::clone(record),
                index: *index,
            },
            ElementaryChange::Update { record, index } => ElementaryChange::Update {
                record: Rc::clone(record),
                index: *index,
            },
            ElementaryChange::Move { record, from, to } => ElementaryChange::Move {
                record: Rc::clone(record),
                from: *from,
                to: *to,
            },
        }
    }
}

impl<R: Record> ElementaryChange<R> {
    /// Returns the record this change is about.
    pub fn record(&self) -> &Rc<R> {
        match self {
            ElementaryChange::Insert { record, .. }
            | ElementaryChange::Remove { record, .. }
            | ElementaryChange::Update { record, .. }
            | ElementaryChange::Move { record, .. } => record,
        }
    }

    /// Returns the event name, as used in logs and protocol errors.
    pub fn event_name(&self) -> &'static str {
        match self {
            ElementaryChange::Insert { .. } => "did_insert",
            ElementaryChange::Remove { .. } => "did_remove",
            ElementaryChange::Update { .. } => "did_update",
            ElementaryChange::Move { .. } => "did_move",
        }
    }

    /// Delivers this change to the matching observer callback.
    pub fn deliver<O: StoreObserver<R> + ?Sized>(&self, observer: &mut O) -> ObserverResult {
        match self {
            ElementaryChange::Insert { record, index } => observer.did_insert(record, *index),
            ElementaryChange::Remove { record, index } => observer.did_remove(record, *index),
            ElementaryChange::Update { record, index } => observer.did_update(record, *index),
            ElementaryChange::Move { record, from, to } => observer.did_move(record, *from, *to),
        }
    }
}

/// Receives the change feed of a snapshot store.
///
/// A store holds at most one observer, and only weakly. Every callback may
/// reject an event that arrives in a state that forbids it.
pub trait StoreObserver<R: Record> {
    /// A transaction is about to start. The store still exposes the old ordering.
    fn will_change(&mut self) -> ObserverResult;

    fn did_insert(&mut self, record: &R, index: usize) -> ObserverResult;

    fn did_remove(&mut self, record: &R, index: usize) -> ObserverResult;

    fn did_update(&mut self, record: &R, index: usize) -> ObserverResult;

    fn did_move(&mut self, record: &R, from: usize, to: usize) -> ObserverResult;

    /// The transaction is complete. The store exposes the new ordering.
    fn did_change(&mut self) -> ObserverResult;

    /// The whole view was refetched; previous indices are meaningless.
    fn did_reload(&mut self) -> ObserverResult;
}
