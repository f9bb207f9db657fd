//! Unified error type for the working-copy engine.
//!
//! `WcdbError` is the canonical error type returned by every public crate
//! in this workspace (§7). Lower layers define their own narrower error
//! enums (`wcdb_kv::KvError`, `wcdb_trail::TrailError`) and convert into
//! this type at their public boundary, mirroring how a legacy per-layer
//! error is folded into a single top-level error for callers.

use crate::types::RelPath;
use thiserror::Error;

/// Result type alias used throughout the workspace.
pub type WcdbResult<T> = std::result::Result<T, WcdbError>;

/// The unified error type (§7 "Error Handling Design").
#[derive(Debug, Error)]
pub enum WcdbError {
    /// No node at the given path in any tree.
    #[error("path not found: {path}")]
    PathNotFound {
        /// The relpath that had no node.
        path: RelPath,
    },

    /// An operation's preconditions expected a specific node status.
    #[error("unexpected status at {path}: {detail}")]
    PathUnexpectedStatus {
        /// The relpath in the unexpected state.
        path: RelPath,
        /// What was expected vs. found.
        detail: String,
    },

    /// The resolver walked to the filesystem root without finding a WC.
    #[error("'{path}' is not a working copy")]
    NotWorkingCopy {
        /// The path that was searched from.
        path: String,
    },

    /// The DB format is too old or too new for this build.
    #[error("unsupported working copy format {found} (supported: {min}..={max})")]
    UnsupportedFormat {
        /// The format version found on disk.
        found: u32,
        /// Minimum format this build accepts.
        min: u32,
        /// Maximum (current) format this build writes.
        max: u32,
    },

    /// DB format predates current and auto-upgrade was disabled.
    #[error("working copy at format {found} requires upgrade to {current}")]
    UpgradeRequired {
        /// The format version found on disk.
        found: u32,
        /// The current format this build would upgrade to.
        current: u32,
    },

    /// The work queue was non-empty when an empty queue was required.
    #[error("cleanup required: {pending} work item(s) pending in '{wcroot}'")]
    CleanupRequired {
        /// Root of the working copy with pending work.
        wcroot: String,
        /// Number of pending work items.
        pending: usize,
    },

    /// An existing lock conflicts with the requested operation.
    #[error("'{path}' is already locked")]
    Locked {
        /// The path that is locked.
        path: RelPath,
    },

    /// A release was attempted without prior ownership.
    #[error("'{path}' is not locked by this process")]
    NotLocked {
        /// The path that was not locked.
        path: RelPath,
    },

    /// Attempted to copy a subtree containing an authorization-denied node.
    #[error("cannot copy '{path}': subtree contains an unreadable node")]
    AuthzUnreadable {
        /// Root of the attempted copy.
        path: RelPath,
    },

    /// Revert of a non-root, or non-recursive revert with modifications below.
    #[error("invalid operation depth for '{path}': {detail}")]
    InvalidOperationDepth {
        /// The path the operation targeted.
        path: RelPath,
        /// Why the requested depth is invalid.
        detail: String,
    },

    /// An on-disk invariant was violated.
    #[error("corrupt working copy state: {message}")]
    Corrupt {
        /// Description of the violated invariant.
        message: String,
    },

    /// A strings-table lookup found no row for the given key.
    #[error("no such string: {key}")]
    NoSuchString {
        /// The string key that was not found.
        key: String,
    },

    /// A representations-table lookup found no row for the given key.
    #[error("no such representation: {key}")]
    NoSuchRepresentation {
        /// The representation key that was not found.
        key: String,
    },

    /// No `PRISTINE` row for the given SHA-1 (§4.7).
    #[error("pristine text '{sha1}' not present")]
    NoSuchPristine {
        /// Hex SHA-1 of the missing pristine text.
        sha1: String,
    },

    /// The on-disk pristine store and the `PRISTINE` table disagree about
    /// whether a text is present (§4.7's always-on consistency check).
    #[error("pristine text '{sha1}' inconsistent between DB and disk: {detail}")]
    PristineInconsistent {
        /// Hex SHA-1 of the inconsistent pristine text.
        sha1: String,
        /// What disagreed.
        detail: String,
    },

    /// Retried internally by the transaction runner; a caller should never
    /// observe this variant escape a completed `run_txn` call.
    #[error("transaction deadlock (internal, should have been retried)")]
    Deadlock,

    /// A cooperative cancellation callback requested abort.
    #[error("operation cancelled")]
    Cancelled,

    /// The operation names a real but intentionally unimplemented API
    /// (`op_move`, `op_modified` — see §9's open questions).
    #[error("not implemented: {operation}")]
    NotImplemented {
        /// Name of the unimplemented operation.
        operation: String,
    },

    /// Wrapped filesystem I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped key-value store error.
    #[error("kv store error: {0}")]
    KvStore(String),
}

impl WcdbError {
    /// True for errors the transaction runner should retry (§4.1). Only
    /// [`WcdbError::Deadlock`] is retryable; it is expected to be consumed
    /// internally and never observed by callers of a completed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WcdbError::Deadlock)
    }

    pub fn is_deadlock(&self) -> bool {
        matches!(self, WcdbError::Deadlock)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WcdbError::PathNotFound { .. }
                | WcdbError::NoSuchString { .. }
                | WcdbError::NoSuchRepresentation { .. }
                | WcdbError::NoSuchPristine { .. }
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, WcdbError::Locked { .. })
    }

    pub fn not_found(path: RelPath) -> Self {
        WcdbError::PathNotFound { path }
    }

    pub fn unexpected_status(path: RelPath, detail: impl Into<String>) -> Self {
        WcdbError::PathUnexpectedStatus {
            path,
            detail: detail.into(),
        }
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        WcdbError::Corrupt {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadlock_is_the_only_retryable_kind() {
        assert!(WcdbError::Deadlock.is_retryable());
        assert!(!WcdbError::not_found(RelPath::new("a")).is_retryable());
        assert!(!WcdbError::Cancelled.is_retryable());
    }

    #[test]
    fn not_found_classification_covers_three_kinds() {
        assert!(WcdbError::not_found(RelPath::new("a")).is_not_found());
        assert!(WcdbError::NoSuchString { key: "k".into() }.is_not_found());
        assert!(WcdbError::NoSuchRepresentation { key: "k".into() }.is_not_found());
        assert!(!WcdbError::Cancelled.is_not_found());
    }

    #[test]
    fn display_messages_are_human_readable() {
        let e = WcdbError::UnsupportedFormat {
            found: 2,
            min: 4,
            max: 9,
        };
        let msg = e.to_string();
        assert!(msg.contains("2"));
        assert!(msg.contains("4"));
        assert!(msg.contains("9"));
    }
}
