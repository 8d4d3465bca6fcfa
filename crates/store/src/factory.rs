//! Create, edit, duplicate and delete records, one commit per call.

use crate::snapshot::{Mutation, SnapshotStore};
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use tidemark_core::{Duplicate, Error, MutableRecord, Result, Value};
use tracing::debug;

type ErrorHandler = Box<dyn Fn(&Error)>;

/// Thin CRUD layer over a [`SnapshotStore`].
///
/// Every method builds one batch of mutations and commits it. Failures are
/// handed to the error handler, if any, then returned. Duplication is only
/// available for records that implement [`Duplicate`].
pub struct ObjectFactory<R: MutableRecord + 'static> {
    store: SnapshotStore<R>,
    error_handler: Option<ErrorHandler>,
}

impl<R: MutableRecord + 'static> ObjectFactory<R> {
    pub fn new(store: SnapshotStore<R>) -> Self {
        Self {
            store,
            error_handler: None,
        }
    }

    /// Installs a callback invoked with every save error.
    pub fn on_error(mut self, handler: impl Fn(&Error) + 'static) -> Self {
        self.error_handler = Some(Box::new(handler));
        self
    }

    pub fn store(&self) -> &SnapshotStore<R> {
        &self.store
    }

    /// Inserts an empty record with a fresh id.
    pub fn new_object(&self) -> Result<R::Id> {
        self.new_object_configured(|_| {})
    }

    /// Inserts a record with a fresh id and one field set.
    pub fn new_object_with(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<R::Id> {
        let (key, value) = (key.into(), value.into());
        self.new_object_configured(move |record| record.set_field(&key, value))
    }

    /// Inserts a record with a fresh id after letting `configure` fill it in.
    pub fn new_object_configured(&self, configure: impl FnOnce(&mut R)) -> Result<R::Id> {
        let mut record = R::create();
        configure(&mut record);
        let id = record.id();
        self.save(Vec::from([Mutation::Insert(record)]))?;
        Ok(id)
    }

    /// Sets `key` to `value` on one record.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>, id: R::Id) -> Result<()> {
        self.set_many(key, value, &[id]).map(|_| ())
    }

    /// Sets `key` to `value` on every record in `ids`.
    pub fn set_many(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
        ids: &[R::Id],
    ) -> Result<Vec<R::Id>> {
        let (key, value) = (key.into(), value.into());
        self.update(ids, |record| record.set_field(&key, value.clone()))
    }

    /// Applies `edit` to every record in `ids`, touching each one.
    pub fn update(&self, ids: &[R::Id], mut edit: impl FnMut(&mut R)) -> Result<Vec<R::Id>> {
        let mut mutations = Vec::with_capacity(ids.len());
        for id in ids {
            let mut record = match self.store.get(id) {
                Some(current) => (*current).clone(),
                None => return Err(self.report(Error::record_not_found(id))),
            };
            edit(&mut record);
            record.touch();
            mutations.push(Mutation::Update(record));
        }
        self.save(mutations)?;
        Ok(ids.to_vec())
    }

    pub fn delete(&self, id: R::Id) -> Result<()> {
        self.delete_many(&[id]).map(|_| ())
    }

    pub fn delete_many(&self, ids: &[R::Id]) -> Result<Vec<R::Id>> {
        let mutations = ids.iter().cloned().map(Mutation::Delete).collect();
        self.save(mutations)?;
        Ok(ids.to_vec())
    }

    fn save(&self, mutations: Vec<Mutation<R>>) -> Result<()> {
        let summary = self.store.commit(mutations).map_err(|err| self.report(err))?;
        debug!(?summary, "saved");
        Ok(())
    }

    fn report(&self, err: Error) -> Error {
        if let Some(handler) = &self.error_handler {
            handler(&err);
        }
        err
    }
}

impl<R: MutableRecord + Duplicate + 'static> ObjectFactory<R> {
    /// Inserts a copy of a record under a fresh id.
    pub fn duplicate(&self, id: R::Id) -> Result<R::Id> {
        let mut copies = self.duplicate_many(&[id])?;
        Ok(copies.swap_remove(0))
    }

    /// Inserts a copy of every record in `ids`, returning the new ids in order.
    pub fn duplicate_many(&self, ids: &[R::Id]) -> Result<Vec<R::Id>> {
        let mut copies = Vec::with_capacity(ids.len());
        let mut mutations = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(original) = self.store.get(id) else {
                return Err(self.report(Error::record_not_found(id)));
            };
            let copy = original.duplicate();
            copies.push(copy.id());
            mutations.push(Mutation::Insert(copy));
        }
        self.save(mutations)?;
        Ok(copies)
    }
}
