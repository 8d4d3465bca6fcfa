//! In-memory ordered snapshot store.
//!
//! `SnapshotStore` holds a set of records, materializes a filtered and sorted
//! view of them on `perform_fetch`, and after every `commit` reports how the
//! view changed through its [`StoreObserver`].
//!
//! The store is a cheap-clone handle over shared single-threaded state. It
//! never holds a borrow of that state while calling the observer, so the
//! observer may read the store from inside any callback. Fetching or
//! committing from inside a commit's callbacks is rejected with a
//! [`ProtocolError`].

use crate::change::{ElementaryChange, ObserverResult, StoreObserver};
use crate::data_source::StoreDataSource;
use crate::diff::diff_orderings;
use crate::fetch::{FetchRequest, SortDescriptor};
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use hashbrown::HashSet;
use tidemark_core::{Error, ProtocolError, QueryError, Record, Result};
use tracing::{debug, error, trace, warn};

/// Record storage backend: HashMap or BTreeMap keyed by record id.
#[cfg(feature = "hash-store")]
type RecordMap<R> = hashbrown::HashMap<<R as Record>::Id, Rc<R>>;
#[cfg(not(feature = "hash-store"))]
type RecordMap<R> = alloc::collections::BTreeMap<<R as Record>::Id, Rc<R>>;

/// One write in a commit.
#[derive(Debug)]
pub enum Mutation<R: Record> {
    /// Adds a record. Fails if its id is already present.
    Insert(R),
    /// Replaces the record with the same id. Fails if absent.
    Update(R),
    /// Deletes the record with this id. Fails if absent.
    Delete(R::Id),
}

/// Counts of the elementary changes a commit produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub inserted: usize,
    pub removed: usize,
    pub updated: usize,
    pub moved: usize,
}

impl CommitSummary {
    fn from_changes<R: Record>(changes: &[ElementaryChange<R>]) -> Self {
        let mut summary = Self::default();
        for change in changes {
            match change {
                ElementaryChange::Insert { .. } => summary.inserted += 1,
                ElementaryChange::Remove { .. } => summary.removed += 1,
                ElementaryChange::Update { .. } => summary.updated += 1,
                ElementaryChange::Move { .. } => summary.moved += 1,
            }
        }
        summary
    }

    /// Returns true if the commit did not change the view.
    pub fn is_empty(&self) -> bool {
        self.inserted + self.removed + self.updated + self.moved == 0
    }
}

struct StoreState<R: Record> {
    records: RecordMap<R>,
    request: FetchRequest,
    /// None until the first successful fetch.
    fetched: Option<Vec<Rc<R>>>,
}

type ObserverSlot<R> = Option<Weak<RefCell<dyn StoreObserver<R>>>>;

/// An in-memory, sorted and filtered view over a set of records.
///
/// # Example
///
/// ```rust
/// use tidemark_core::Entity;
/// use tidemark_store::{FetchRequest, Mutation, SnapshotStore, SortDescriptor};
///
/// let store = SnapshotStore::new(vec![SortDescriptor::ascending("rank")]).unwrap();
/// store.perform_fetch(FetchRequest::new()).unwrap();
///
/// store
///     .commit(vec![
///         Mutation::Insert(Entity::new(1).with("rank", 20i64)),
///         Mutation::Insert(Entity::new(2).with("rank", 10i64)),
///     ])
///     .unwrap();
///
/// let ids: Vec<u64> = store.objects().iter().map(|r| r.id()).collect();
/// assert_eq!(ids, vec![2, 1]);
/// ```
pub struct SnapshotStore<R: Record> {
    state: Rc<RefCell<StoreState<R>>>,
    observer: Rc<RefCell<ObserverSlot<R>>>,
    /// Set from `will_change` until `did_change` has been delivered.
    dispatching: Rc<Cell<bool>>,
}

impl<R: Record> Clone for SnapshotStore<R> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            observer: Rc::clone(&self.observer),
            dispatching: Rc::clone(&self.dispatching),
        }
    }
}

impl<R: Record + 'static> SnapshotStore<R> {
    /// Creates an empty store ordered by `sort_descriptors`.
    ///
    /// At least one descriptor is required.
    pub fn new(sort_descriptors: Vec<SortDescriptor>) -> Result<Self> {
        if sort_descriptors.is_empty() {
            return Err(QueryError::MissingSortDescriptor.into());
        }
        let state = StoreState {
            records: RecordMap::<R>::default(),
            request: FetchRequest::new().with_sort_descriptors(sort_descriptors),
            fetched: None,
        };
        Ok(Self {
            state: Rc::new(RefCell::new(state)),
            observer: Rc::new(RefCell::new(None)),
            dispatching: Rc::new(Cell::new(false)),
        })
    }

    /// Creates a store pre-populated with `records`. Nothing is fetched yet.
    pub fn with_records(
        sort_descriptors: Vec<SortDescriptor>,
        records: impl IntoIterator<Item = R>,
    ) -> Result<Self> {
        let store = Self::new(sort_descriptors)?;
        {
            let mut state = store.state.borrow_mut();
            for record in records {
                let id = record.id();
                if state.records.contains_key(&id) {
                    return Err(Error::duplicate_record(id));
                }
                state.records.insert(id, Rc::new(record));
            }
        }
        Ok(store)
    }

    /// Registers the single observer, replacing any previous one.
    ///
    /// The store keeps only a weak reference; dropping the observer silently
    /// detaches it.
    pub fn set_observer<O>(&self, observer: &Rc<RefCell<O>>)
    where
        O: StoreObserver<R> + 'static,
    {
        let observer: Rc<RefCell<dyn StoreObserver<R>>> = observer.clone();
        *self.observer.borrow_mut() = Some(Rc::downgrade(&observer));
    }

    /// Detaches the observer.
    pub fn clear_observer(&self) {
        *self.observer.borrow_mut() = None;
    }

    /// Returns true if an observer is attached and alive.
    pub fn has_observer(&self) -> bool {
        self.observer
            .borrow()
            .as_ref()
            .map_or(false, |weak| weak.strong_count() > 0)
    }

    /// Returns true while a commit is delivering its events.
    pub fn in_transaction(&self) -> bool {
        self.dispatching.get()
    }

    /// Returns true once a fetch has succeeded.
    pub fn is_fetched(&self) -> bool {
        self.state.borrow().fetched.is_some()
    }

    /// Returns the request currently in effect.
    pub fn fetch_request(&self) -> FetchRequest {
        self.state.borrow().request.clone()
    }

    /// The current materialized view. Empty before the first fetch.
    pub fn objects(&self) -> Vec<Rc<R>> {
        self.state.borrow().fetched.clone().unwrap_or_default()
    }

    /// Number of records in the view.
    pub fn count(&self) -> usize {
        self.state.borrow().fetched.as_ref().map_or(0, Vec::len)
    }

    pub fn object_at(&self, index: usize) -> Option<Rc<R>> {
        self.state.borrow().fetched.as_ref()?.get(index).cloned()
    }

    /// Position of the record with `id` in the view.
    pub fn index_of(&self, id: &R::Id) -> Option<usize> {
        self.state
            .borrow()
            .fetched
            .as_ref()?
            .iter()
            .position(|record| &record.id() == id)
    }

    /// Looks up a stored record, whether or not it is in the view.
    pub fn get(&self, id: &R::Id) -> Option<Rc<R>> {
        self.state.borrow().records.get(id).cloned()
    }

    /// Number of stored records, including ones filtered out of the view.
    pub fn record_count(&self) -> usize {
        self.state.borrow().records.len()
    }

    /// Re-executes the query and reports `did_reload`.
    ///
    /// An empty descriptor list in `request` keeps the current ordering. On a
    /// query error the previous view and request stay in place and nothing is
    /// reported. Fails with `FetchDuringTransaction` while a commit is
    /// delivering its events.
    pub fn perform_fetch(&self, request: FetchRequest) -> Result<()> {
        if self.dispatching.get() {
            error!("perform_fetch called during an open transaction");
            return Err(ProtocolError::FetchDuringTransaction.into());
        }
        {
            let mut state = self.state.borrow_mut();
            let request = request.resolve_against(&state.request);
            let fetched = request.materialize(state.records.values())?;
            debug!(count = fetched.len(), "fetched snapshot");
            state.request = request;
            state.fetched = Some(fetched);
        }

        self.notify("did_reload", |observer| observer.did_reload())
            .map_err(|err| {
                error!(%err, "observer rejected did_reload");
                Error::from(err)
            })
    }

    /// Applies `mutations` atomically and reports the resulting view changes.
    ///
    /// Every mutation is validated before any is applied. When the commit
    /// changes the view, the observer sees `will_change` while the store
    /// still exposes the old ordering, then each elementary change and
    /// `did_change` against the new ordering. A commit that leaves the view
    /// untouched reports nothing. Fails with `CommitDuringTransaction`,
    /// without applying anything, when called from inside those callbacks.
    pub fn commit(&self, mutations: Vec<Mutation<R>>) -> Result<CommitSummary> {
        if self.dispatching.get() {
            error!("commit called during an open transaction");
            return Err(ProtocolError::CommitDuringTransaction.into());
        }
        let (changes, next_view) = {
            let mut state = self.state.borrow_mut();
            let mut records = state.records.clone();
            let mut touched: HashSet<R::Id> = HashSet::new();

            for mutation in mutations {
                match mutation {
                    Mutation::Insert(record) => {
                        let id = record.id();
                        if records.contains_key(&id) {
                            return Err(Error::duplicate_record(id));
                        }
                        touched.insert(id.clone());
                        records.insert(id, Rc::new(record));
                    }
                    Mutation::Update(record) => {
                        let id = record.id();
                        if !records.contains_key(&id) {
                            return Err(Error::record_not_found(id));
                        }
                        touched.insert(id.clone());
                        records.insert(id, Rc::new(record));
                    }
                    Mutation::Delete(id) => {
                        if records.remove(&id).is_none() {
                            return Err(Error::record_not_found(id));
                        }
                        touched.insert(id);
                    }
                }
            }

            if state.fetched.is_none() {
                warn!("commit before first fetch; no change events reported");
                state.records = records;
                return Ok(CommitSummary::default());
            }

            let next_view = state.request.materialize(records.values())?;
            let old_view = state.fetched.as_deref().unwrap_or(&[]);
            let changes = diff_orderings(old_view, &next_view, &touched);
            state.records = records;
            if changes.is_empty() {
                state.fetched = Some(next_view);
                trace!("commit left the view unchanged");
                return Ok(CommitSummary::default());
            }
            (changes, next_view)
        };

        let summary = CommitSummary::from_changes(&changes);
        debug!(
            inserted = summary.inserted,
            removed = summary.removed,
            updated = summary.updated,
            moved = summary.moved,
            "committed"
        );

        let mut first_error: Option<ProtocolError> = None;
        let mut record_error = |result: ObserverResult, event: &'static str| {
            if let Err(err) = result {
                error!(%err, event, "observer rejected event");
                first_error.get_or_insert(err);
            }
        };

        self.dispatching.set(true);
        record_error(
            self.notify("will_change", |observer| observer.will_change()),
            "will_change",
        );
        self.state.borrow_mut().fetched = Some(next_view);
        for change in &changes {
            let event = change.event_name();
            record_error(self.notify(event, |observer| change.deliver(observer)), event);
        }
        record_error(
            self.notify("did_change", |observer| observer.did_change()),
            "did_change",
        );
        self.dispatching.set(false);

        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(summary),
        }
    }

    /// Calls `f` with the observer, if one is alive.
    ///
    /// An observer that is already borrowed misses the event and the call
    /// fails with `Reentrant`.
    fn notify<F>(&self, event: &'static str, f: F) -> ObserverResult
    where
        F: FnOnce(&mut dyn StoreObserver<R>) -> ObserverResult,
    {
        let observer = self.observer.borrow().as_ref().and_then(Weak::upgrade);
        let Some(observer) = observer else {
            return Ok(());
        };
        let Ok(mut observer) = observer.try_borrow_mut() else {
            error!(event, "observer busy; event not delivered");
            return Err(ProtocolError::Reentrant { event });
        };
        f(&mut *observer)
    }
}

impl<R: Record + 'static> StoreDataSource for SnapshotStore<R> {
    type Record = R;

    fn objects(&self) -> Vec<Rc<R>> {
        SnapshotStore::objects(self)
    }

    fn count(&self) -> usize {
        SnapshotStore::count(self)
    }

    fn object_at(&self, index: usize) -> Option<Rc<R>> {
        SnapshotStore::object_at(self, index)
    }

    fn perform_fetch(&self, request: FetchRequest) -> Result<()> {
        SnapshotStore::perform_fetch(self, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Predicate;
    use alloc::string::String;
    use alloc::vec;
    use tidemark_core::{Entity, EntityId};

    /// Observer that records every callback as a string.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        reject_will_change: bool,
    }

    impl StoreObserver<Entity> for Recorder {
        fn will_change(&mut self) -> ObserverResult {
            self.events.push("will_change".into());
            if self.reject_will_change {
                return Err(ProtocolError::AlreadyAccumulating);
            }
            Ok(())
        }
        fn did_insert(&mut self, record: &Entity, index: usize) -> ObserverResult {
            self.events.push(alloc::format!("insert {} @{}", record.id(), index));
            Ok(())
        }
        fn did_remove(&mut self, record: &Entity, index: usize) -> ObserverResult {
            self.events.push(alloc::format!("remove {} @{}", record.id(), index));
            Ok(())
        }
        fn did_update(&mut self, record: &Entity, index: usize) -> ObserverResult {
            self.events.push(alloc::format!("update {} @{}", record.id(), index));
            Ok(())
        }
        fn did_move(&mut self, record: &Entity, from: usize, to: usize) -> ObserverResult {
            self.events.push(alloc::format!("move {} {}->{}", record.id(), from, to));
            Ok(())
        }
        fn did_change(&mut self) -> ObserverResult {
            self.events.push("did_change".into());
            Ok(())
        }
        fn did_reload(&mut self) -> ObserverResult {
            self.events.push("did_reload".into());
            Ok(())
        }
    }

    fn note(id: EntityId, rank: i64) -> Entity {
        Entity::new(id).with("rank", rank).with("done", false)
    }

    fn by_rank() -> Vec<SortDescriptor> {
        vec![SortDescriptor::ascending("rank")]
    }

    fn fetched_store(notes: Vec<Entity>) -> (SnapshotStore<Entity>, Rc<RefCell<Recorder>>) {
        let store = SnapshotStore::with_records(by_rank(), notes).unwrap();
        store.perform_fetch(FetchRequest::new()).unwrap();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        store.set_observer(&recorder);
        (store, recorder)
    }

    fn ids(store: &SnapshotStore<Entity>) -> Vec<EntityId> {
        store.objects().iter().map(|r| r.id()).collect()
    }

    #[test]
    fn test_new_requires_sort_descriptor() {
        let err = SnapshotStore::<Entity>::new(vec![]).err().unwrap();
        assert_eq!(err, Error::Query(QueryError::MissingSortDescriptor));
    }

    #[test]
    fn test_with_records_rejects_duplicates() {
        let err = SnapshotStore::with_records(by_rank(), vec![note(1, 1), note(1, 2)])
            .err()
            .unwrap();
        assert!(matches!(err, Error::DuplicateRecord { .. }));
    }

    #[test]
    fn test_view_empty_before_fetch() {
        let store = SnapshotStore::with_records(by_rank(), vec![note(1, 1)]).unwrap();
        assert!(!store.is_fetched());
        assert_eq!(store.count(), 0);
        assert_eq!(store.record_count(), 1);
        assert!(store.get(&1).is_some());
    }

    #[test]
    fn test_commit_before_fetch_reports_nothing() {
        let store = SnapshotStore::new(by_rank()).unwrap();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        store.set_observer(&recorder);

        let summary = store.commit(vec![Mutation::Insert(note(1, 1))]).unwrap();
        assert!(summary.is_empty());
        assert!(recorder.borrow().events.is_empty());
        assert_eq!(store.record_count(), 1);
    }

    #[test]
    fn test_perform_fetch_reports_reload() {
        let (store, recorder) = fetched_store(vec![note(1, 30), note(2, 10)]);
        store
            .perform_fetch(FetchRequest::new().sort_by(SortDescriptor::descending("rank")))
            .unwrap();
        assert_eq!(recorder.borrow().events, vec!["did_reload"]);
        assert_eq!(ids(&store), vec![1, 2]);
    }

    #[test]
    fn test_perform_fetch_with_predicate() {
        let mut done = note(3, 5);
        done.set("done", true);
        let (store, _recorder) = fetched_store(vec![note(1, 30), note(2, 10), done]);

        store
            .perform_fetch(FetchRequest::new().predicate(Predicate::eq("done", false)))
            .unwrap();
        assert_eq!(ids(&store), vec![2, 1]);
        assert_eq!(store.fetch_request().sort_descriptors(), &by_rank()[..]);
    }

    #[test]
    fn test_perform_fetch_error_keeps_previous_view() {
        let (store, recorder) = fetched_store(vec![note(1, 30), note(2, 10)]);
        let err = store
            .perform_fetch(FetchRequest::new().sort_by(SortDescriptor::ascending("title")))
            .unwrap_err();

        assert_eq!(err, Error::Query(QueryError::unknown_key("title")));
        assert_eq!(ids(&store), vec![2, 1]);
        assert_eq!(store.fetch_request().sort_descriptors(), &by_rank()[..]);
        assert!(recorder.borrow().events.is_empty());
    }

    #[test]
    fn test_commit_insert_reports_bracketed_events() {
        let (store, recorder) = fetched_store(vec![note(1, 10), note(2, 30)]);
        let summary = store.commit(vec![Mutation::Insert(note(3, 20))]).unwrap();

        assert_eq!(summary.inserted, 1);
        assert_eq!(ids(&store), vec![1, 3, 2]);
        assert_eq!(
            recorder.borrow().events,
            vec!["will_change", "insert 3 @1", "did_change"]
        );
    }

    #[test]
    fn test_commit_update_that_reorders_is_a_move() {
        let (store, recorder) = fetched_store(vec![note(1, 10), note(2, 20), note(3, 30)]);
        store.commit(vec![Mutation::Update(note(1, 40))]).unwrap();

        assert_eq!(ids(&store), vec![2, 3, 1]);
        assert_eq!(
            recorder.borrow().events,
            vec!["will_change", "move 1 0->2", "did_change"]
        );
    }

    #[test]
    fn test_commit_update_in_place() {
        let (store, recorder) = fetched_store(vec![note(1, 10), note(2, 20)]);
        let mut renamed = note(2, 20);
        renamed.set("title", "Renamed");
        store.commit(vec![Mutation::Update(renamed)]).unwrap();

        assert_eq!(
            recorder.borrow().events,
            vec!["will_change", "update 2 @1", "did_change"]
        );
        assert_eq!(
            store.object_at(1).unwrap().get("title"),
            Some(&tidemark_core::Value::from("Renamed"))
        );
    }

    #[test]
    fn test_commit_update_out_of_filter_is_a_removal() {
        let (store, recorder) = fetched_store(vec![note(1, 10), note(2, 20)]);
        store
            .perform_fetch(FetchRequest::new().predicate(Predicate::eq("done", false)))
            .unwrap();
        recorder.borrow_mut().events.clear();

        let mut finished = note(1, 10);
        finished.set("done", true);
        store.commit(vec![Mutation::Update(finished)]).unwrap();

        assert_eq!(ids(&store), vec![2]);
        assert_eq!(
            recorder.borrow().events,
            vec!["will_change", "remove 1 @0", "did_change"]
        );
    }

    #[test]
    fn test_commit_delete() {
        let (store, recorder) = fetched_store(vec![note(1, 10), note(2, 20)]);
        let summary = store.commit(vec![Mutation::Delete(1)]).unwrap();

        assert_eq!(summary.removed, 1);
        assert_eq!(
            recorder.borrow().events,
            vec!["will_change", "remove 1 @0", "did_change"]
        );
    }

    #[test]
    fn test_commit_is_atomic() {
        let (store, recorder) = fetched_store(vec![note(1, 10)]);
        let err = store
            .commit(vec![Mutation::Insert(note(2, 20)), Mutation::Delete(99)])
            .unwrap_err();

        assert!(matches!(err, Error::RecordNotFound { .. }));
        assert_eq!(store.record_count(), 1);
        assert!(recorder.borrow().events.is_empty());
    }

    #[test]
    fn test_commit_query_error_keeps_state() {
        let (store, recorder) = fetched_store(vec![note(1, 10)]);
        let err = store
            .commit(vec![Mutation::Insert(Entity::new(2).with("done", false))])
            .unwrap_err();

        assert_eq!(err, Error::Query(QueryError::unknown_key("rank")));
        assert_eq!(store.record_count(), 1);
        assert!(recorder.borrow().events.is_empty());
    }

    #[test]
    fn test_insert_then_delete_in_one_commit_is_silent() {
        let (store, recorder) = fetched_store(vec![note(1, 10)]);
        let summary = store
            .commit(vec![Mutation::Insert(note(2, 20)), Mutation::Delete(2)])
            .unwrap();

        assert!(summary.is_empty());
        assert!(recorder.borrow().events.is_empty());
    }

    #[test]
    fn test_observer_sees_old_view_at_will_change() {
        struct Peek {
            store: SnapshotStore<Entity>,
            seen: Vec<usize>,
        }
        impl StoreObserver<Entity> for Peek {
            fn will_change(&mut self) -> ObserverResult {
                self.seen.push(self.store.count());
                Ok(())
            }
            fn did_insert(&mut self, _: &Entity, _: usize) -> ObserverResult {
                Ok(())
            }
            fn did_remove(&mut self, _: &Entity, _: usize) -> ObserverResult {
                Ok(())
            }
            fn did_update(&mut self, _: &Entity, _: usize) -> ObserverResult {
                Ok(())
            }
            fn did_move(&mut self, _: &Entity, _: usize, _: usize) -> ObserverResult {
                Ok(())
            }
            fn did_change(&mut self) -> ObserverResult {
                self.seen.push(self.store.count());
                Ok(())
            }
            fn did_reload(&mut self) -> ObserverResult {
                Ok(())
            }
        }

        let store = SnapshotStore::with_records(by_rank(), vec![note(1, 10)]).unwrap();
        store.perform_fetch(FetchRequest::new()).unwrap();
        let peek = Rc::new(RefCell::new(Peek {
            store: store.clone(),
            seen: Vec::new(),
        }));
        store.set_observer(&peek);

        store.commit(vec![Mutation::Insert(note(2, 20))]).unwrap();
        assert_eq!(peek.borrow().seen, vec![1, 2]);
    }

    #[test]
    fn test_observer_errors_surface_from_commit() {
        let (store, recorder) = fetched_store(vec![note(1, 10)]);
        recorder.borrow_mut().reject_will_change = true;

        let err = store.commit(vec![Mutation::Insert(note(2, 20))]).unwrap_err();
        assert_eq!(err, Error::Protocol(ProtocolError::AlreadyAccumulating));
        // The commit itself still landed
        assert_eq!(ids(&store), vec![1, 2]);
    }

    #[test]
    fn test_dropped_observer_detaches() {
        let (store, recorder) = fetched_store(vec![note(1, 10)]);
        assert!(store.has_observer());
        drop(recorder);
        assert!(!store.has_observer());
        store.commit(vec![Mutation::Insert(note(2, 20))]).unwrap();
        assert_eq!(store.count(), 2);
    }

    /// Observer that writes back to the store from inside `did_insert`.
    struct Meddler {
        store: SnapshotStore<Entity>,
        fetched: Option<Result<()>>,
        committed: Option<Result<CommitSummary>>,
        seen: Vec<usize>,
    }

    impl StoreObserver<Entity> for Meddler {
        fn will_change(&mut self) -> ObserverResult {
            Ok(())
        }
        fn did_insert(&mut self, _: &Entity, index: usize) -> ObserverResult {
            self.seen.push(index);
            self.fetched = Some(
                self.store
                    .perform_fetch(FetchRequest::new().sort_by(SortDescriptor::descending("rank"))),
            );
            self.committed = Some(self.store.commit(vec![Mutation::Delete(1)]));
            Ok(())
        }
        fn did_remove(&mut self, _: &Entity, _: usize) -> ObserverResult {
            Ok(())
        }
        fn did_update(&mut self, _: &Entity, _: usize) -> ObserverResult {
            Ok(())
        }
        fn did_move(&mut self, _: &Entity, _: usize, _: usize) -> ObserverResult {
            Ok(())
        }
        fn did_change(&mut self) -> ObserverResult {
            Ok(())
        }
        fn did_reload(&mut self) -> ObserverResult {
            Ok(())
        }
    }

    #[test]
    fn test_writes_from_observer_are_rejected() {
        let store = SnapshotStore::with_records(by_rank(), vec![note(1, 10)]).unwrap();
        store.perform_fetch(FetchRequest::new()).unwrap();
        let meddler = Rc::new(RefCell::new(Meddler {
            store: store.clone(),
            fetched: None,
            committed: None,
            seen: Vec::new(),
        }));
        store.set_observer(&meddler);

        store
            .commit(vec![Mutation::Insert(note(2, 20)), Mutation::Insert(note(3, 30))])
            .unwrap();

        let meddler = meddler.borrow();
        assert_eq!(
            meddler.fetched,
            Some(Err(Error::Protocol(ProtocolError::FetchDuringTransaction)))
        );
        assert_eq!(
            meddler.committed,
            Some(Err(Error::Protocol(ProtocolError::CommitDuringTransaction)))
        );
        // Both insertions still index into the committed ordering
        assert_eq!(meddler.seen, vec![1, 2]);
        assert_eq!(ids(&store), vec![1, 2, 3]);
        assert_eq!(store.fetch_request().sort_descriptors(), &by_rank()[..]);
        assert!(!store.in_transaction());
    }

    #[test]
    fn test_busy_observer_misses_events() {
        let (store, recorder) = fetched_store(vec![note(1, 10)]);
        {
            let _held = recorder.borrow_mut();
            let err = store.commit(vec![Mutation::Insert(note(2, 20))]).unwrap_err();
            assert_eq!(
                err,
                Error::Protocol(ProtocolError::Reentrant { event: "will_change" })
            );

            let err = store.perform_fetch(FetchRequest::new()).unwrap_err();
            assert_eq!(err, Error::Protocol(ProtocolError::Reentrant { event: "did_reload" }));
        }
        assert_eq!(ids(&store), vec![1, 2]);
        assert!(!store.in_transaction());

        store.commit(vec![Mutation::Delete(2)]).unwrap();
        assert_eq!(
            recorder.borrow().events,
            vec!["will_change", "remove 2 @1", "did_change"]
        );
    }

    #[test]
    fn test_index_of() {
        let (store, _recorder) = fetched_store(vec![note(1, 20), note(2, 10)]);
        assert_eq!(store.index_of(&1), Some(1));
        assert_eq!(store.index_of(&2), Some(0));
        assert_eq!(store.index_of(&3), None);
    }
}
