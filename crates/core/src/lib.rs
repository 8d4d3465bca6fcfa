//! Tidemark Core - Core types shared by the Tidemark crates.
//!
//! This crate provides the vocabulary the change-tracking layer speaks:
//!
//! - `Record`: identity plus named fields, implemented by anything a store can hold
//! - `MutableRecord` / `Duplicate`: what object factories need to create and copy records
//! - `Entity`: a ready-made record with an id, a version and `Value` fields
//! - `Value` / `DataType`: field values with a total order for sorting
//! - `IndexSet`: ordered positions within a view, the unit of every diff
//! - `Error`: `QueryError` and `ProtocolError` plus store-level failures
//!
//! # Example
//!
//! ```rust
//! use tidemark_core::{Entity, IndexSet, Record, Value};
//!
//! let note = Entity::new(7).with("title", "Groceries").with("rank", 2i64);
//! assert_eq!(Record::id(&note), 7);
//! assert_eq!(note.field("rank"), Some(Value::Int64(2)));
//!
//! let removed = IndexSet::from([4, 5, 6, 9]);
//! assert_eq!(removed.ranges(), vec![4..7, 9..10]);
//! ```

#![no_std]

extern crate alloc;

mod error;
mod index_set;
mod record;
mod types;
mod value;

pub use error::{Error, ProtocolError, QueryError, Result};
pub use index_set::IndexSet;
pub use record::{
    next_entity_id, set_next_entity_id_if_greater, Duplicate, Entity, EntityId, MutableRecord,
    Record,
};
pub use types::DataType;
pub use value::Value;
