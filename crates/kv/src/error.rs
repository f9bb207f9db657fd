//! Errors produced by the key-value substrate.

use wcdb_core::WcdbError;

/// Errors narrow to `wcdb-kv`, converted into [`WcdbError`] at the crate
/// boundary (mirrors the teacher's per-layer error pattern).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KvError {
    /// No table registered under this name.
    #[error("no such table: {0}")]
    NoSuchTable(String),

    /// A cursor was advanced past the end of its row set.
    #[error("cursor exhausted")]
    CursorExhausted,

    /// A second writer attempted to open a transaction while one was
    /// already in progress against the same store. The in-memory backend
    /// is single-writer per `Store` (no distinct processes contend for
    /// its lock), so this maps to a transient, retryable condition rather
    /// than a genuine deadlock.
    #[error("store is already locked for writing")]
    WriteLocked,
}

impl From<KvError> for WcdbError {
    fn from(err: KvError) -> Self {
        match err {
            KvError::WriteLocked => WcdbError::Deadlock,
            other => WcdbError::KvStore(other.to_string()),
        }
    }
}
