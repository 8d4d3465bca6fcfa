//! The read-and-refetch surface consumers depend on.

use crate::fetch::FetchRequest;
use alloc::rc::Rc;
use alloc::vec::Vec;
use tidemark_core::{Record, Result};

/// A source of an ordered, refetchable view of records.
///
/// Implemented by [`SnapshotStore`](crate::SnapshotStore) and by wrappers
/// around it that add their own checks before delegating.
pub trait StoreDataSource {
    type Record: Record;

    /// The current view, in order.
    fn objects(&self) -> Vec<Rc<Self::Record>>;

    fn count(&self) -> usize {
        self.objects().len()
    }

    fn object_at(&self, index: usize) -> Option<Rc<Self::Record>> {
        self.objects().get(index).cloned()
    }

    /// Re-executes the query, reporting a reload to the observer.
    fn perform_fetch(&self, request: FetchRequest) -> Result<()>;
}

/// A type-erased, shared [`StoreDataSource`].
pub struct AnyStore<R: Record> {
    inner: Rc<dyn StoreDataSource<Record = R>>,
}

impl<R: Record> AnyStore<R> {
    pub fn new<S>(source: S) -> Self
    where
        S: StoreDataSource<Record = R> + 'static,
    {
        Self {
            inner: Rc::new(source),
        }
    }
}

impl<R: Record> Clone for AnyStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R: Record> core::fmt::Debug for AnyStore<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AnyStore")
            .field("count", &self.inner.count())
            .finish()
    }
}

impl<R: Record> StoreDataSource for AnyStore<R> {
    type Record = R;

    fn objects(&self) -> Vec<Rc<R>> {
        self.inner.objects()
    }

    fn count(&self) -> usize {
        self.inner.count()
    }

    fn object_at(&self, index: usize) -> Option<Rc<R>> {
        self.inner.object_at(index)
    }

    fn perform_fetch(&self, request: FetchRequest) -> Result<()> {
        self.inner.perform_fetch(request)
    }
}
