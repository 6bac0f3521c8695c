use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures surfaced by a store backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The transaction aborted due to a concurrent conflict (serialization
    /// failure, deadlock). The whole operation is safe to retry.
    #[error("transient store failure (retry the operation): {0}")]
    Transient(String),

    /// A database constraint rejected the write (unique index, foreign key).
    #[error("constraint conflict: {0}")]
    Conflict(String),

    /// Any other backend failure (connection loss, corrupt row, ...).
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
