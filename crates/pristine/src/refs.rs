//! The reference-check seam: `wcdb-pristine` never reads `NODES` or a work
//! queue table directly — that model belongs to `wcdb-engine`, which would
//! otherwise create a dependency cycle (`wcdb-engine` already depends on
//! `wcdb-pristine` to install/read text bodies). Instead the engine
//! implements this trait over its own tables and hands it to
//! [`crate::store::PristineStore`].

use wcdb_core::error::WcdbResult;
use wcdb_core::types::Sha1Checksum;

/// Answers the two questions `svn_wc__db_pristine_remove` and
/// `pristine_cleanup_wcroot` ask before deleting a pristine text.
pub trait PristineRefs {
    /// True if the work queue has any pending item, in which case no
    /// pristine may be removed (`STMT_LOOK_FOR_WORK`'s short-circuit).
    fn work_queue_non_empty(&self) -> WcdbResult<bool>;

    /// True if any `NODES` row currently references `sha1` as its base or
    /// working text (`STMT_DELETE_PRISTINE_IF_UNREFERENCED`'s `NOT EXISTS`
    /// subquery, expressed here as a predicate the caller evaluates).
    fn is_referenced(&self, sha1: &Sha1Checksum) -> WcdbResult<bool>;
}

/// A [`PristineRefs`] that reports no work pending and nothing referenced.
/// Useful for tests and for embedding this crate without `wcdb-engine`.
pub struct NoRefs;

impl PristineRefs for NoRefs {
    fn work_queue_non_empty(&self) -> WcdbResult<bool> {
        Ok(false)
    }

    fn is_referenced(&self, _sha1: &Sha1Checksum) -> WcdbResult<bool> {
        Ok(false)
    }
}
