//! The Pristine Store (§4.7): orchestrates the `PRISTINE` table and the
//! on-disk fan-out directory together.
//!
//! Grounded literally in `wc_db_pristine.c`: [`install`] mirrors
//! `pristine_install_txn`, [`remove`] mirrors `svn_wc__db_pristine_remove`
//! plus `pristine_remove_if_unreferenced_txn`, and [`cleanup`] mirrors
//! `pristine_cleanup_wcroot`'s per-row loop. All mutations run inside
//! [`wcdb_trail::run_txn`], which — since `wcdb-kv`'s `Store` allows only
//! one open transaction at a time — gives the same "no concurrent
//! install/delete on the same SHA-1" guarantee the source gets from
//! SQLite's `RESERVED` lock.

use std::fs;
use std::path::Path;

use wcdb_core::config::WcdbConfig;
use wcdb_core::error::{WcdbError, WcdbResult};
use wcdb_core::types::{Md5Checksum, Sha1Checksum};
use wcdb_kv::Store;

use crate::path;
use crate::refs::PristineRefs;
use crate::table::PristineTable;

fn kv(err: wcdb_kv::KvError) -> WcdbError {
    err.into()
}

/// Seeds the `pristine` table, if it doesn't already exist, in `store`.
pub fn init(store: &Store) {
    store.create_table(PristineTable::TABLE);
}

/// Installs the pristine text currently sitting at `tempfile_abspath` into
/// the store under `sha1`, moving the file into place and inserting its
/// `PRISTINE` row. Idempotent: if `sha1` is already stored, the temp file
/// is simply discarded (`pristine_install_txn`'s check-then-discard
/// branch).
pub fn install(
    store: &Store,
    config: &WcdbConfig,
    wcroot_abspath: &Path,
    tempfile_abspath: &Path,
    sha1: &Sha1Checksum,
    md5: &Md5Checksum,
) -> WcdbResult<()> {
    let pristine_abspath = path::pristine_fname(wcroot_abspath, sha1);

    wcdb_trail::run_txn(store, config, |trail| {
        let already_present = {
            let table = trail.txn.table(PristineTable::TABLE).map_err(kv)?;
            PristineTable::contains(table, sha1)
        };
        if already_present {
            // Already stored: discard the temp file, per
            // `pristine_install_txn`'s "just keep it" branch.
            fs::remove_file(tempfile_abspath)?;
            return Ok(());
        }

        if pristine_abspath.is_file() {
            // Present on disk but not in the table (e.g. a prior attempt
            // wrote the file then failed before the insert): discard the
            // new temp file rather than overwrite, exactly as the source
            // does, and fall through to record the row below.
            fs::remove_file(tempfile_abspath)?;
        } else {
            if let Some(parent) = pristine_abspath.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::rename(tempfile_abspath, &pristine_abspath)?;
        }

        let size = fs::metadata(&pristine_abspath)?.len();
        let table = trail.txn.table_mut(PristineTable::TABLE).map_err(kv)?;
        PristineTable::insert(table, sha1, md5, size);
        Ok(())
    })
}

/// Opens the pristine text identified by `sha1` for reading. Fails with
/// [`WcdbError::NoSuchPristine`] if no `PRISTINE` row exists; the file's
/// mere presence on disk is not sufficient (`pristine_read_txn`).
pub fn read(store: &Store, wcroot_abspath: &Path, sha1: &Sha1Checksum) -> WcdbResult<fs::File> {
    let present = store
        .with_table(PristineTable::TABLE, |t| PristineTable::contains(t, sha1))
        .map_err(kv)?;
    if !present {
        return Err(WcdbError::NoSuchPristine { sha1: sha1.to_hex() });
    }
    let path = path::pristine_fname(wcroot_abspath, sha1);
    Ok(fs::File::open(path)?)
}

/// True iff a `PRISTINE` row exists for `sha1`. Always (not just under a
/// debug build, unlike the source's `#ifdef SVN_DEBUG` block) cross-checks
/// disk presence and reports [`WcdbError::PristineInconsistent`] rather
/// than silently returning stale metadata.
pub fn check(store: &Store, wcroot_abspath: &Path, sha1: &Sha1Checksum) -> WcdbResult<bool> {
    let present = store
        .with_table(PristineTable::TABLE, |t| PristineTable::contains(t, sha1))
        .map_err(kv)?;
    if present {
        let path = path::pristine_fname(wcroot_abspath, sha1);
        if !path.is_file() {
            return Err(WcdbError::PristineInconsistent {
                sha1: sha1.to_hex(),
                detail: "present in the PRISTINE table but missing on disk".to_string(),
            });
        }
    }
    Ok(present)
}

/// Looks up the MD5 recorded alongside `sha1`'s row.
pub fn get_md5(store: &Store, sha1: &Sha1Checksum) -> WcdbResult<Md5Checksum> {
    let (md5, _size) = store
        .with_table(PristineTable::TABLE, |t| PristineTable::read(t, sha1))
        .map_err(kv)??;
    Ok(md5)
}

/// Looks up the SHA-1 whose row records `md5` (linear scan; see
/// [`PristineTable::find_by_md5`]).
pub fn get_sha1(store: &Store, md5: &Md5Checksum) -> WcdbResult<Sha1Checksum> {
    store
        .with_table(PristineTable::TABLE, |t| PristineTable::find_by_md5(t, md5))
        .map_err(kv)?
        .ok_or_else(|| WcdbError::corrupt("no pristine text recorded for that MD5"))
}

/// Deletes the `PRISTINE` row and file for `sha1` if nothing references it.
///
/// `refs.work_queue_non_empty()` is checked first and short-circuits the
/// whole operation, exactly as `STMT_LOOK_FOR_WORK` does in
/// `svn_wc__db_pristine_remove` — queued work may still name this text.
pub fn remove(
    store: &Store,
    config: &WcdbConfig,
    wcroot_abspath: &Path,
    sha1: &Sha1Checksum,
    refs: &dyn PristineRefs,
) -> WcdbResult<()> {
    if refs.work_queue_non_empty()? {
        return Ok(());
    }
    remove_if_unreferenced(store, config, wcroot_abspath, sha1, refs)
}

/// The shared "delete if nothing points at it" step used by both
/// [`remove`] and [`cleanup`] (`pristine_remove_if_unreferenced`).
///
/// The reference check runs just before the transaction rather than as
/// part of a single atomic `DELETE ... WHERE NOT EXISTS` the way the
/// source's `STMT_DELETE_PRISTINE_IF_UNREFERENCED` does, since `refs` may
/// consult storage this crate doesn't own (`wcdb-engine`'s `NODES` table).
/// A reference added in the narrow window between the check and the
/// delete is not observed here; `wcdb-engine` is expected to hold its own
/// lock across both steps where that race matters.
fn remove_if_unreferenced(
    store: &Store,
    config: &WcdbConfig,
    wcroot_abspath: &Path,
    sha1: &Sha1Checksum,
    refs: &dyn PristineRefs,
) -> WcdbResult<()> {
    if refs.is_referenced(sha1)? {
        return Ok(());
    }
    let pristine_abspath = path::pristine_fname(wcroot_abspath, sha1);
    wcdb_trail::run_txn(store, config, |trail| {
        let table = trail.txn.table_mut(PristineTable::TABLE).map_err(kv)?;
        let removed = PristineTable::delete(table, sha1);
        if removed {
            // Matches the source's "remove file, ignore_enoent = FALSE":
            // a row with no backing file is a consistency error, not
            // something to swallow.
            fs::remove_file(&pristine_abspath)?;
        }
        Ok(())
    })
}

/// Deletes every currently-unreferenced pristine text
/// (`pristine_cleanup_wcroot`). Unlike [`remove`], this does not consult
/// the work queue — the source's cleanup loop doesn't either.
pub fn cleanup(store: &Store, config: &WcdbConfig, wcroot_abspath: &Path, refs: &dyn PristineRefs) -> WcdbResult<()> {
    let all = store
        .with_table(PristineTable::TABLE, PristineTable::all_sha1s)
        .map_err(kv)?;
    for sha1 in all {
        remove_if_unreferenced(store, config, wcroot_abspath, &sha1, refs)?;
    }
    Ok(())
}
