//! `run_txn` — the retry-on-deadlock transaction runner (§4.1).
//!
//! Opens a KV transaction, hands the caller a [`Trail`] to write through,
//! and on success commits; on failure, unwinds the trail's undo stack,
//! rolls back the KV transaction, and retries if the failure was a
//! deadlock, up to [`WcdbConfig::max_trail_retries`]. The original retries
//! `DB_LOCK_DEADLOCK` unboundedly; this rewrite bounds the retry count for
//! test determinism (§9 open-question resolution).

use tracing::{trace, warn};
use wcdb_core::{WcdbConfig, WcdbError, WcdbResult};
use wcdb_kv::Store;

use crate::trail::Trail;

/// Runs `body` inside a KV transaction, retrying on deadlock.
///
/// `body` may be invoked more than once if earlier attempts deadlock; it
/// must be safe to call repeatedly (i.e. it should only read the trail's
/// own `txn` and record undo actions through [`Trail::record_undo`], not
/// rely on external mutable state that isn't itself rolled back).
pub fn run_txn<T>(
    store: &Store,
    config: &WcdbConfig,
    mut body: impl FnMut(&mut Trail) -> WcdbResult<T>,
) -> WcdbResult<T> {
    let mut attempt = 0u32;
    loop {
        let mut txn = match store.begin() {
            Ok(txn) => txn,
            Err(err) => {
                let err: WcdbError = err.into();
                if err.is_retryable() && attempt < config.max_trail_retries {
                    attempt += 1;
                    trace!(attempt, "retrying: store busy");
                    continue;
                }
                return Err(err);
            }
        };

        let mut trail = Trail::new(&mut txn);
        let outcome = body(&mut trail);
        if outcome.is_err() {
            trail.unwind();
        }
        drop(trail);

        match outcome {
            Ok(value) => {
                txn.commit();
                return Ok(value);
            }
            Err(err) => {
                txn.rollback();
                if err.is_retryable() && attempt < config.max_trail_retries {
                    attempt += 1;
                    warn!(attempt, "retrying transaction after deadlock");
                    continue;
                }
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wcdb_core::types::RelPath;

    #[test]
    fn successful_body_commits_writes() {
        let store = Store::new();
        store.create_table("strings");
        let config = WcdbConfig::default();

        run_txn(&store, &config, |trail| {
            trail
                .txn
                .table_mut("strings")
                .map_err(|e| WcdbError::KvStore(e.to_string()))?
                .put(b"k", b"v".to_vec());
            Ok(())
        })
        .unwrap();

        store
            .with_table("strings", |t| assert_eq!(t.get(b"k"), Some(b"v".as_slice())))
            .unwrap();
    }

    #[test]
    fn failing_body_rolls_back_writes_and_runs_undo() {
        let store = Store::new();
        store.create_table("strings");
        let config = WcdbConfig::default();
        let undo_ran = std::cell::Cell::new(false);

        let result: WcdbResult<()> = run_txn(&store, &config, |trail| {
            trail
                .txn
                .table_mut("strings")
                .map_err(|e| WcdbError::KvStore(e.to_string()))?
                .put(b"k", b"v".to_vec());
            trail.record_undo(|| undo_ran.set(true));
            Err(WcdbError::not_found(RelPath::new("missing")))
        });

        assert!(result.is_err());
        assert!(undo_ran.get());
        store
            .with_table("strings", |t| assert_eq!(t.get(b"k"), None))
            .unwrap();
    }

    #[test]
    fn non_retryable_error_is_not_retried() {
        let store = Store::new();
        store.create_table("strings");
        let config = WcdbConfig::default();
        let calls = std::cell::Cell::new(0);

        let _: WcdbResult<()> = run_txn(&store, &config, |_trail| {
            calls.set(calls.get() + 1);
            Err(WcdbError::Cancelled)
        });

        assert_eq!(calls.get(), 1);
    }
}
