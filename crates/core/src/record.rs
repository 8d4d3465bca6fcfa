//! Records tracked by Tidemark.
//!
//! The change-tracking layer only cares about two things a record can tell
//! it: a stable identity and named field values. Identity must survive every
//! mutation, because the same record shows up in different change buckets
//! with different attribute values during one transaction.

use crate::value::Value;
use alloc::collections::BTreeMap;
use alloc::string::String;
use core::fmt::Debug;
use core::hash::Hash;
use core::sync::atomic::{AtomicU64, Ordering};

/// A persisted entity observed through a snapshot store.
pub trait Record: Debug {
    /// Stable identity key. Never derived from attribute values.
    type Id: Clone + Eq + Ord + Hash + Debug;

    /// Returns the identity of this record.
    fn id(&self) -> Self::Id;

    /// Returns the value stored under `key`, or None if the record has no
    /// such field.
    fn field(&self, key: &str) -> Option<Value>;
}

/// Record types that can produce a copy of themselves under a fresh identity.
pub trait Duplicate: Record {
    fn duplicate(&self) -> Self;
}

/// Record types that can be created empty and written field by field.
pub trait MutableRecord: Record + Clone {
    /// A new record with no fields under a fresh identity.
    fn create() -> Self;

    /// Writes `value` under `key`.
    fn set_field(&mut self, key: &str, value: Value);

    /// Called once on every saved edit.
    fn touch(&mut self) {}
}

/// Unique identifier for an entity.
pub type EntityId = u64;

/// Global entity ID counter for generating unique ids.
static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// Gets the next unique entity ID.
pub fn next_entity_id() -> EntityId {
    NEXT_ENTITY_ID.fetch_add(1, Ordering::SeqCst)
}

/// Sets the next entity ID only if it's greater than the current value.
pub fn set_next_entity_id_if_greater(id: EntityId) {
    NEXT_ENTITY_ID.fetch_max(id, Ordering::SeqCst);
}

/// A general-purpose record: an id, a version and named fields.
#[derive(Clone, Debug)]
pub struct Entity {
    id: EntityId,
    /// Incremented on each update.
    version: u64,
    fields: BTreeMap<String, Value>,
}

impl Entity {
    /// Creates an empty entity with the given ID. Version starts at 1.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            version: 1,
            fields: BTreeMap::new(),
        }
    }

    /// Creates an empty entity with an automatically assigned ID.
    pub fn create() -> Self {
        Self::new(next_entity_id())
    }

    /// Builder-style field assignment.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Increments the version number and returns the new value.
    #[inline]
    pub fn increment_version(&mut self) -> u64 {
        self.version = self.version.wrapping_add(1);
        self.version
    }

    /// Gets the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Sets a field, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Removes a field, returning its value.
    pub fn unset(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Iterates over fields in key order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Record for Entity {
    type Id = EntityId;

    #[inline]
    fn id(&self) -> EntityId {
        self.id
    }

    fn field(&self, key: &str) -> Option<Value> {
        self.fields.get(key).cloned()
    }
}

impl Duplicate for Entity {
    fn duplicate(&self) -> Self {
        Self {
            id: next_entity_id(),
            version: 1,
            fields: self.fields.clone(),
        }
    }
}

impl MutableRecord for Entity {
    fn create() -> Self {
        Self::new(next_entity_id())
    }

    fn set_field(&mut self, key: &str, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// Bumps the version.
    fn touch(&mut self) {
        self.increment_version();
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.fields == other.fields
    }
}
