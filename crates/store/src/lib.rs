//! Tidemark Store - In-memory ordered snapshot store.
//!
//! This crate provides the producer side of the change feed:
//!
//! - `SnapshotStore`: records materialized into a filtered, sorted view
//! - `FetchRequest` / `SortDescriptor` / `Predicate`: what the view contains
//! - `StoreObserver`: the elementary event contract a store reports through
//! - `StoreDataSource` / `AnyStore`: the read-and-refetch surface, type-erased
//! - `ObjectFactory`: create, edit, duplicate and delete records
//!
//! # Example
//!
//! ```rust
//! use tidemark_core::Entity;
//! use tidemark_store::{FetchRequest, Mutation, Predicate, SnapshotStore, SortDescriptor};
//!
//! let store = SnapshotStore::with_records(
//!     vec![SortDescriptor::ascending("rank")],
//!     vec![
//!         Entity::new(1).with("rank", 2i64).with("done", false),
//!         Entity::new(2).with("rank", 1i64).with("done", true),
//!     ],
//! )
//! .unwrap();
//!
//! store
//!     .perform_fetch(FetchRequest::new().predicate(Predicate::eq("done", false)))
//!     .unwrap();
//! assert_eq!(store.count(), 1);
//!
//! let summary = store
//!     .commit(vec![Mutation::Insert(Entity::new(3).with("rank", 0i64).with("done", false))])
//!     .unwrap();
//! assert_eq!(summary.inserted, 1);
//! assert_eq!(store.object_at(0).unwrap().id(), 3);
//! ```

#![no_std]

extern crate alloc;

pub mod change;
pub mod data_source;
pub mod diff;
pub mod factory;
pub mod fetch;
pub mod predicate;
pub mod snapshot;

pub use change::{ElementaryChange, ObserverResult, StoreObserver};
pub use data_source::{AnyStore, StoreDataSource};
pub use diff::diff_orderings;
pub use factory::ObjectFactory;
pub use fetch::{FetchRequest, SortDescriptor};
pub use predicate::{CompareOp, Predicate};
pub use snapshot::{CommitSummary, Mutation, SnapshotStore};
