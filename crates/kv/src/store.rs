//! The transactional store: a named collection of [`Table`]s with
//! snapshot-isolated, all-or-nothing write transactions.
//!
//! Per §5's single-threaded-per-working-copy scheduling model there is at
//! most one writer against a given `Store` at a time; a second concurrent
//! `begin()` call observes [`KvError::WriteLocked`], which `wcdb-trail`
//! maps to a retryable condition exactly as it would a BDB
//! `DB_LOCK_DEADLOCK`.

use rustc_hash::FxHashMap;

use crate::error::KvError;
use crate::table::Table;

/// A collection of named [`Table`]s, opened for transactional access via
/// [`Store::begin`].
#[derive(Debug, Default)]
pub struct Store {
    tables: parking_lot::RwLock<FxHashMap<String, Table>>,
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    /// Registers an empty table under `name` if one doesn't already exist.
    pub fn create_table(&self, name: &str) {
        self.tables
            .write()
            .entry(name.to_string())
            .or_insert_with(Table::new);
    }

    /// Reads a single table without opening a write transaction.
    pub fn with_table<R>(&self, name: &str, f: impl FnOnce(&Table) -> R) -> Result<R, KvError> {
        let guard = self.tables.read();
        let table = guard
            .get(name)
            .ok_or_else(|| KvError::NoSuchTable(name.to_string()))?;
        Ok(f(table))
    }

    /// Opens a write transaction. Takes a snapshot of every table so the
    /// transaction's mutations are invisible to readers until [`Txn::commit`].
    pub fn begin(&self) -> Result<Txn<'_>, KvError> {
        let guard = self.tables.try_write().ok_or(KvError::WriteLocked)?;
        let working = guard.clone();
        Ok(Txn {
            guard,
            working,
        })
    }
}

/// A write transaction in progress against a [`Store`].
///
/// Holds the store's write lock for its entire lifetime (the teacher's
/// engine schedules one writer per working copy at a time, so this never
/// blocks a legitimate concurrent writer — only a programming error that
/// opens two transactions against the same store).
pub struct Txn<'a> {
    guard: parking_lot::RwLockWriteGuard<'a, FxHashMap<String, Table>>,
    working: FxHashMap<String, Table>,
}

impl<'a> Txn<'a> {
    pub fn table(&self, name: &str) -> Result<&Table, KvError> {
        self.working
            .get(name)
            .ok_or_else(|| KvError::NoSuchTable(name.to_string()))
    }

    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table, KvError> {
        self.working
            .get_mut(name)
            .ok_or_else(|| KvError::NoSuchTable(name.to_string()))
    }

    /// Publishes this transaction's working set to the store.
    pub fn commit(mut self) {
        *self.guard = std::mem::take(&mut self.working);
    }

    /// Discards this transaction's working set. Equivalent to dropping the
    /// `Txn` without calling `commit`; provided for call-site clarity at
    /// `wcdb-trail`'s abort path.
    pub fn rollback(self) {}
}
