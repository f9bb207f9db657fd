//! The `Trail` — an in-memory, LIFO undo-callback list threaded through a
//! single transaction attempt.
//!
//! Grounded on Subversion's `trail.c`: a trail records an undo action for
//! every change that isn't already covered by the transactional KV store's
//! own rollback (e.g. updating the WC-root directory cache in
//! `wcdb-engine`). On abort, `unwind` runs those actions most-recent-first,
//! then the KV transaction itself is rolled back separately.

use wcdb_kv::Txn;

/// Borrows an open KV transaction for the duration of one `run_txn` attempt
/// and collects undo callbacks alongside it.
pub struct Trail<'a, 'b> {
    /// The underlying key-value transaction this attempt is writing to.
    pub txn: &'a mut Txn<'b>,
    undo: Vec<Box<dyn FnOnce() + 'a>>,
}

impl<'a, 'b> Trail<'a, 'b> {
    pub(crate) fn new(txn: &'a mut Txn<'b>) -> Self {
        Trail {
            txn,
            undo: Vec::new(),
        }
    }

    /// Registers an action to run, in LIFO order, if this attempt aborts.
    pub fn record_undo(&mut self, undo: impl FnOnce() + 'a) {
        self.undo.push(Box::new(undo));
    }

    /// Runs every recorded undo action, most-recently-added first, then
    /// clears the list. Idempotent: a trail with no undo actions is a no-op.
    pub(crate) fn unwind(&mut self) {
        while let Some(step) = self.undo.pop() {
            step();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wcdb_kv::Store;

    #[test]
    fn unwind_runs_actions_in_reverse_order() {
        let store = Store::new();
        store.create_table("t");
        let mut txn = store.begin().unwrap();
        let order = std::cell::RefCell::new(Vec::new());
        {
            let mut trail = Trail::new(&mut txn);
            trail.record_undo(|| order.borrow_mut().push(1));
            trail.record_undo(|| order.borrow_mut().push(2));
            trail.record_undo(|| order.borrow_mut().push(3));
            trail.unwind();
        }
        assert_eq!(*order.borrow(), vec![3, 2, 1]);
    }
}
