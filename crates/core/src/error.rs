//! Error types for Tidemark.
//!
//! Two failure families matter to the change-tracking layer:
//!
//! - [`QueryError`]: the store could not evaluate a predicate or sort
//!   descriptor. Reported to whoever asked for the fetch or commit.
//! - [`ProtocolError`]: an event arrived in a state that forbids it. This is a
//!   defect in the store integration, never a user-facing condition.

use crate::types::DataType;
use alloc::string::String;
use thiserror::Error;

/// Result type alias for Tidemark operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Predicate or sort evaluation failed at the store boundary.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The store was configured without any sort descriptor.
    #[error("store requires at least one sort descriptor")]
    MissingSortDescriptor,
    /// A record has no field with the given key.
    #[error("unknown key: {key}")]
    UnknownKey { key: String },
    /// Two values of incompatible types were ordered against each other.
    #[error("type mismatch on key {key}: expected {expected}, got {got}")]
    TypeMismatch {
        key: String,
        expected: DataType,
        got: DataType,
    },
}

/// Change events delivered out of order by the store integration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// An elementary event or `did_change` arrived outside a transaction.
    #[error("{event} received while no transaction is open")]
    NotAccumulating { event: &'static str },
    /// `will_change` arrived while a transaction was already open.
    #[error("will_change received while a transaction is already open")]
    AlreadyAccumulating,
    /// A fetch was requested while a transaction was open.
    #[error("perform_fetch called while a transaction is open")]
    FetchDuringTransaction,
    /// A commit was started from inside another commit's notifications.
    #[error("commit called while a transaction is open")]
    CommitDuringTransaction,
    /// An event reached an observer or sink that was already borrowed.
    #[error("{event} delivered to a receiver that is already in use")]
    Reentrant { event: &'static str },
}

/// Error type for Tidemark operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("query error: {0}")]
    Query(#[from] QueryError),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// No record with the given id exists in the store.
    #[error("record not found: {id}")]
    RecordNotFound { id: String },
    /// A record with the given id already exists in the store.
    #[error("duplicate record: {id}")]
    DuplicateRecord { id: String },
}

impl Error {
    /// Creates a record-not-found error from any printable id.
    pub fn record_not_found(id: impl core::fmt::Debug) -> Self {
        Error::RecordNotFound {
            id: alloc::format!("{:?}", id),
        }
    }

    /// Creates a duplicate-record error from any printable id.
    pub fn duplicate_record(id: impl core::fmt::Debug) -> Self {
        Error::DuplicateRecord {
            id: alloc::format!("{:?}", id),
        }
    }

    /// Returns true if this error reports a broken event protocol.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }
}

impl QueryError {
    /// Creates an unknown key error.
    pub fn unknown_key(key: impl Into<String>) -> Self {
        QueryError::UnknownKey { key: key.into() }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(key: impl Into<String>, expected: DataType, got: DataType) -> Self {
        QueryError::TypeMismatch {
            key: key.into(),
            expected,
            got,
        }
    }
}
