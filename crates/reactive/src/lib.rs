//! Tidemark Reactive - Consolidated change notifications for snapshot stores.
//!
//! A snapshot store reports each transaction as a stream of elementary
//! events. This crate buffers that stream and hands consumers one batch per
//! transaction, as index sets ready to apply to a list.
//!
//! # Core Concepts
//!
//! - `ChangeAccumulator`: observes a store and consolidates its events
//! - `ChangeBatch` / `ConsolidatedChanges`: buffered and reduced changes
//! - `ChangeSink`: the consumer-facing notification contract
//! - `SelectionTracker`: carries the selection of moved rows across a transaction
//! - `AccumulatingStore`: a store and its accumulator behind one handle
//! - `ChangeLog` / `ListMirror`: ready-made sinks
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use tidemark_core::{Entity, IndexSet};
//! use tidemark_reactive::{AccumulatingStore, ListMirror};
//! use tidemark_store::{AnyStore, FetchRequest, Mutation, SnapshotStore, SortDescriptor};
//!
//! let store = SnapshotStore::with_records(
//!     vec![SortDescriptor::ascending("rank")],
//!     (1..=4).map(|id| Entity::new(id).with("rank", id as i64)),
//! )
//! .unwrap();
//! let tracked = AccumulatingStore::new(store);
//! tracked.perform_fetch(FetchRequest::new()).unwrap();
//!
//! let mirror = Rc::new(RefCell::new(ListMirror::new(AnyStore::new(tracked.clone()))));
//! mirror.borrow_mut().select(IndexSet::from([0]));
//! tracked.set_sink(&mirror);
//!
//! // Record 1 moves to the end and keeps its selection
//! tracked
//!     .commit(vec![Mutation::Update(Entity::new(1).with("rank", 9i64))])
//!     .unwrap();
//!
//! assert_eq!(mirror.borrow().ids(), &[2, 3, 4, 1]);
//! assert_eq!(mirror.borrow().selected_ids(), vec![1]);
//! ```

#![no_std]

extern crate alloc;

pub mod accumulating_store;
pub mod accumulator;
pub mod change_log;
pub mod change_set;
pub mod mirror;
pub mod selection;
pub mod sink;

pub use accumulating_store::AccumulatingStore;
pub use accumulator::{AccumulatorState, ChangeAccumulator};
pub use change_log::{ChangeLog, SinkEvent};
pub use change_set::{ChangeBatch, ConsolidatedChanges};
pub use mirror::ListMirror;
pub use selection::{SelectionSnapshot, SelectionTracker};
pub use sink::ChangeSink;

// Re-export commonly used types from dependencies
pub use tidemark_core::IndexSet;
pub use tidemark_store::{AnyStore, StoreDataSource, StoreObserver};
