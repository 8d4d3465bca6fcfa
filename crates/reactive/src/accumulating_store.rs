//! A snapshot store wired to its own change accumulator.

use crate::accumulator::ChangeAccumulator;
use crate::sink::ChangeSink;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use tidemark_core::{Error, ProtocolError, Record, Result};
use tidemark_store::{
    AnyStore, CommitSummary, FetchRequest, Mutation, SnapshotStore, StoreDataSource,
};
use tracing::error;

/// Owns a [`SnapshotStore`] and the [`ChangeAccumulator`] observing it.
///
/// Consumers attach a sink here and read the view through the same handle
/// they commit through.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use tidemark_core::{Entity, IndexSet};
/// use tidemark_reactive::{AccumulatingStore, ChangeLog, SinkEvent};
/// use tidemark_store::{FetchRequest, Mutation, SnapshotStore, SortDescriptor};
///
/// let store = SnapshotStore::new(vec![SortDescriptor::ascending("rank")]).unwrap();
/// let tracked = AccumulatingStore::new(store);
/// tracked.perform_fetch(FetchRequest::new()).unwrap();
///
/// let log = Rc::new(RefCell::new(ChangeLog::new()));
/// tracked.set_sink(&log);
///
/// tracked
///     .commit(vec![Mutation::Insert(Entity::new(1).with("rank", 1i64))])
///     .unwrap();
/// assert!(log
///     .borrow()
///     .events()
///     .contains(&SinkEvent::DidInsert(IndexSet::from([0]))));
/// ```
pub struct AccumulatingStore<R: Record + 'static> {
    store: SnapshotStore<R>,
    accumulator: Rc<RefCell<ChangeAccumulator<R>>>,
}

impl<R: Record + 'static> AccumulatingStore<R> {
    /// Registers a fresh accumulator as the observer of `store`.
    pub fn new(store: SnapshotStore<R>) -> Self {
        let accumulator = Rc::new(RefCell::new(ChangeAccumulator::new(AnyStore::new(
            store.clone(),
        ))));
        store.set_observer(&accumulator);
        Self { store, accumulator }
    }

    pub fn store(&self) -> &SnapshotStore<R> {
        &self.store
    }

    pub fn accumulator(&self) -> &Rc<RefCell<ChangeAccumulator<R>>> {
        &self.accumulator
    }

    /// Attaches the sink the accumulator reports to.
    pub fn set_sink<S: ChangeSink + 'static>(&self, sink: &Rc<RefCell<S>>) {
        self.accumulator.borrow_mut().set_sink(sink);
    }

    pub fn objects(&self) -> Vec<Rc<R>> {
        self.store.objects()
    }

    pub fn count(&self) -> usize {
        self.store.count()
    }

    pub fn object_at(&self, index: usize) -> Option<Rc<R>> {
        self.store.object_at(index)
    }

    /// Refetches the store, unless a transaction is open.
    pub fn perform_fetch(&self, request: FetchRequest) -> Result<()> {
        // Already borrowed means a store event is being dispatched right now
        let mid_transaction = self
            .accumulator
            .try_borrow()
            .map_or(true, |accumulator| accumulator.is_accumulating());
        if mid_transaction {
            error!("perform_fetch called during an open transaction");
            return Err(Error::Protocol(ProtocolError::FetchDuringTransaction));
        }
        self.store.perform_fetch(request)
    }

    pub fn commit(&self, mutations: Vec<Mutation<R>>) -> Result<CommitSummary> {
        self.store.commit(mutations)
    }
}

impl<R: Record + 'static> Clone for AccumulatingStore<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            accumulator: Rc::clone(&self.accumulator),
        }
    }
}

impl<R: Record + 'static> StoreDataSource for AccumulatingStore<R> {
    type Record = R;

    fn objects(&self) -> Vec<Rc<R>> {
        AccumulatingStore::objects(self)
    }

    fn count(&self) -> usize {
        AccumulatingStore::count(self)
    }

    fn object_at(&self, index: usize) -> Option<Rc<R>> {
        AccumulatingStore::object_at(self, index)
    }

    fn perform_fetch(&self, request: FetchRequest) -> Result<()> {
        AccumulatingStore::perform_fetch(self, request)
    }
}
