//! The change accumulator.
//!
//! `ChangeAccumulator` observes a snapshot store, buffers the elementary
//! events of one transaction into a [`ChangeBatch`], and when the transaction
//! ends delivers them to a [`ChangeSink`] as consolidated index sets.
//!
//! # State machine
//!
//! ```text
//!            will_change
//!   Idle ─────────────────▶ Accumulating ──┐ did_insert / did_remove /
//!    ▲ ▲                        │    ▲     │ did_update / did_move
//!    │ └──────── did_change ────┘    └─────┘
//!    └────────── did_reload (from either state)
//! ```
//!
//! Elementary events and `did_change` are rejected while Idle without
//! changing anything. A second `will_change` is rejected and aborts the open
//! transaction.
//!
//! # Busy sinks
//!
//! The sink is often the same object that drives the store, so it may
//! already be borrowed when a transaction starts or ends. A busy sink is
//! treated as having no selection at `will_change`. At `did_change` or
//! `did_reload` the transaction still closes, nothing is emitted, and the
//! call fails with [`ProtocolError::Reentrant`]. The sink is then out of
//! date and should reload from the store.

use crate::change_set::{ChangeBatch, ConsolidatedChanges};
use crate::selection::{SelectionSnapshot, SelectionTracker};
use crate::sink::ChangeSink;
use alloc::rc::{Rc, Weak};
use core::cell::RefCell;
use tidemark_core::{IndexSet, ProtocolError, Record};
use tidemark_store::{AnyStore, ObserverResult, StoreDataSource, StoreObserver};
use tracing::{debug, error, trace, warn};

/// Where the accumulator is in the transaction protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccumulatorState {
    Idle,
    Accumulating,
}

/// Buffers store events and reports them to a sink once per transaction.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use tidemark_core::{Entity, IndexSet};
/// use tidemark_reactive::{ChangeAccumulator, ChangeLog};
/// use tidemark_store::{AnyStore, FetchRequest, SnapshotStore, SortDescriptor, StoreObserver};
///
/// let store = SnapshotStore::<Entity>::new(vec![SortDescriptor::ascending("rank")]).unwrap();
/// store.perform_fetch(FetchRequest::new()).unwrap();
///
/// let log = Rc::new(RefCell::new(ChangeLog::new()));
/// let mut accumulator = ChangeAccumulator::new(AnyStore::new(store));
/// accumulator.set_sink(&log);
///
/// let record = Entity::new(1).with("rank", 1i64);
/// accumulator.will_change().unwrap();
/// accumulator.did_move(&record, 3, 7).unwrap();
/// let changes = accumulator.end_transaction().unwrap();
///
/// assert_eq!(changes.removed, IndexSet::from([3]));
/// assert_eq!(changes.inserted, IndexSet::from([7]));
/// assert!(changes.moved.contains(&1));
/// assert_eq!(log.borrow().events().len(), 6);
/// ```
pub struct ChangeAccumulator<R: Record> {
    source: AnyStore<R>,
    sink: Option<Weak<RefCell<dyn ChangeSink>>>,
    state: AccumulatorState,
    batch: ChangeBatch<R::Id>,
    selection: Option<SelectionSnapshot<R::Id>>,
}

impl<R: Record> ChangeAccumulator<R> {
    /// Creates an idle accumulator reading selections and post-change
    /// positions from `source`.
    pub fn new(source: AnyStore<R>) -> Self {
        Self {
            source,
            sink: None,
            state: AccumulatorState::Idle,
            batch: ChangeBatch::new(),
            selection: None,
        }
    }

    /// Attaches the sink, replacing any previous one.
    ///
    /// Only a weak reference is kept. Once the sink is dropped the
    /// accumulator keeps tracking transactions and emits nothing.
    pub fn set_sink<S: ChangeSink + 'static>(&mut self, sink: &Rc<RefCell<S>>) {
        let sink: Rc<RefCell<dyn ChangeSink>> = sink.clone();
        self.sink = Some(Rc::downgrade(&sink));
    }

    /// Detaches the sink.
    pub fn clear_sink(&mut self) {
        self.sink = None;
    }

    /// Returns true if a sink is attached and alive.
    pub fn has_sink(&self) -> bool {
        self.sink.as_ref().map_or(false, |weak| weak.strong_count() > 0)
    }

    #[inline]
    pub fn state(&self) -> AccumulatorState {
        self.state
    }

    #[inline]
    pub fn is_accumulating(&self) -> bool {
        self.state == AccumulatorState::Accumulating
    }

    /// The changes buffered so far in the open transaction.
    #[inline]
    pub fn batch(&self) -> &ChangeBatch<R::Id> {
        &self.batch
    }

    /// The selection captured when the open transaction started.
    pub fn selection(&self) -> Option<&SelectionSnapshot<R::Id>> {
        self.selection.as_ref()
    }

    /// Closes the open transaction and delivers its consolidated changes.
    ///
    /// `did_change` calls this and drops the result. Fails with `Reentrant`,
    /// after closing the transaction, if the sink is busy.
    pub fn end_transaction(&mut self) -> Result<ConsolidatedChanges<R::Id>, ProtocolError> {
        self.require_accumulating("did_change")?;

        let mut changes = self.batch.consolidate();
        if let Some(selection) = self.selection.take() {
            changes.selected = selection.restore(&changes.moved, &self.source.objects());
        }
        self.batch.clear();
        self.state = AccumulatorState::Idle;

        debug!(
            removed = changes.removed.len(),
            inserted = changes.inserted.len(),
            updated = changes.updated.len(),
            selected = changes.selected.len(),
            moved = changes.moved.len(),
            "transaction consolidated"
        );

        if let Some(sink) = self.sink() {
            let Ok(mut sink) = sink.try_borrow_mut() else {
                error!("sink busy; consolidated changes not delivered");
                return Err(ProtocolError::Reentrant { event: "did_change" });
            };
            sink.will_change_content();
            sink.did_remove(&changes.removed);
            sink.did_insert(&changes.inserted);
            sink.did_update(&changes.updated);
            sink.did_select(&changes.selected);
            sink.did_change_content();
        }
        Ok(changes)
    }

    fn sink(&self) -> Option<Rc<RefCell<dyn ChangeSink>>> {
        self.sink.as_ref().and_then(Weak::upgrade)
    }

    fn require_accumulating(&self, event: &'static str) -> ObserverResult {
        if self.is_accumulating() {
            return Ok(());
        }
        error!(event, "event received while idle");
        Err(ProtocolError::NotAccumulating { event })
    }

    fn reset(&mut self) {
        self.batch.clear();
        self.selection = None;
        self.state = AccumulatorState::Idle;
    }

    fn current_selection(&self) -> IndexSet {
        let Some(sink) = self.sink() else {
            return IndexSet::new();
        };
        let selected = match sink.try_borrow() {
            Ok(sink) => sink.current_selection(),
            Err(_) => {
                warn!("sink busy at will_change; selection not captured");
                IndexSet::new()
            }
        };
        selected
    }
}

impl<R: Record> StoreObserver<R> for ChangeAccumulator<R> {
    fn will_change(&mut self) -> ObserverResult {
        if self.is_accumulating() {
            error!(
                buffered = self.batch.len(),
                "will_change while accumulating; aborting open transaction"
            );
            self.reset();
            return Err(ProtocolError::AlreadyAccumulating);
        }

        let selected = self.current_selection();
        let snapshot = SelectionTracker::capture(&selected, &self.source.objects());
        trace!(selected = snapshot.len(), "captured selection");
        self.selection = Some(snapshot);
        self.state = AccumulatorState::Accumulating;
        debug!("transaction started");
        Ok(())
    }

    fn did_insert(&mut self, record: &R, index: usize) -> ObserverResult {
        self.require_accumulating("did_insert")?;
        trace!(id = ?record.id(), index, "buffer insertion");
        self.batch.insert(record.id(), index);
        Ok(())
    }

    fn did_remove(&mut self, record: &R, index: usize) -> ObserverResult {
        self.require_accumulating("did_remove")?;
        trace!(id = ?record.id(), index, "buffer removal");
        self.batch.remove(record.id(), index);
        Ok(())
    }

    fn did_update(&mut self, record: &R, index: usize) -> ObserverResult {
        self.require_accumulating("did_update")?;
        trace!(id = ?record.id(), index, "buffer update");
        self.batch.update(record.id(), index);
        Ok(())
    }

    fn did_move(&mut self, record: &R, from: usize, to: usize) -> ObserverResult {
        self.require_accumulating("did_move")?;
        trace!(id = ?record.id(), from, to, "buffer move");
        self.batch.record_move(record.id(), from, to);
        Ok(())
    }

    fn did_change(&mut self) -> ObserverResult {
        self.end_transaction().map(|_| ())
    }

    fn did_reload(&mut self) -> ObserverResult {
        if self.is_accumulating() {
            debug!(discarded = self.batch.len(), "reload discards open transaction");
        }
        self.reset();
        let Some(sink) = self.sink() else {
            return Ok(());
        };
        let Ok(mut sink) = sink.try_borrow_mut() else {
            error!("sink busy; reload not delivered");
            return Err(ProtocolError::Reentrant { event: "did_reload" });
        };
        sink.did_reload_content();
        Ok(())
    }
}
