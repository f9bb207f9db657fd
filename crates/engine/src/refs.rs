//! The engine's [`wcdb_pristine::PristineRefs`] implementation: answers
//! whether a pristine text is still referenced, by consulting the
//! `NODES` and `WORK_QUEUE` tables this crate owns.
//!
//! Grounded on `wc_db_pristine.c`'s `STMT_LOOK_FOR_WORK` and
//! `STMT_DELETE_PRISTINE_IF_UNREFERENCED`, expressed here as a scan over
//! [`NodesTable::all_relpaths`] rather than a SQL `NOT EXISTS` subquery.

use wcdb_core::error::WcdbResult;
use wcdb_core::types::Sha1Checksum;
use wcdb_kv::Store;
use wcdb_pristine::PristineRefs;

use crate::tables::{NodesTable, WorkQueueTable};

fn kv(err: wcdb_kv::KvError) -> wcdb_core::error::WcdbError {
    err.into()
}

/// A [`PristineRefs`] backed by a single [`Store`]'s `nodes` and
/// `work_queue` tables.
pub struct EngineRefs<'a> {
    store: &'a Store,
}

impl<'a> EngineRefs<'a> {
    pub fn new(store: &'a Store) -> Self {
        EngineRefs { store }
    }
}

impl PristineRefs for EngineRefs<'_> {
    fn work_queue_non_empty(&self) -> WcdbResult<bool> {
        let empty = self
            .store
            .with_table(WorkQueueTable::TABLE, WorkQueueTable::is_empty)
            .map_err(kv)?;
        Ok(!empty)
    }

    fn is_referenced(&self, sha1: &Sha1Checksum) -> WcdbResult<bool> {
        self.store.with_table(NodesTable::TABLE, |table| {
            for path in NodesTable::all_relpaths(table)? {
                for row in NodesTable::layers_at(table, &path)? {
                    if row.checksum.as_ref() == Some(sha1) {
                        return Ok(true);
                    }
                }
            }
            Ok(false)
        })
        .map_err(kv)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wcdb_core::types::{NodeKind, OpDepth, Presence, RelPath};

    use crate::model::NodeRow;

    #[test]
    fn work_queue_non_empty_reflects_pending_items() {
        let store = Store::new();
        store.create_table(WorkQueueTable::TABLE);
        let mut txn = store.begin().unwrap();
        WorkQueueTable::init(txn.table_mut(WorkQueueTable::TABLE).unwrap());
        txn.commit();

        let refs = EngineRefs::new(&store);
        assert!(!refs.work_queue_non_empty().unwrap());

        let mut txn = store.begin().unwrap();
        WorkQueueTable::add(txn.table_mut(WorkQueueTable::TABLE).unwrap(), b"work".to_vec()).unwrap();
        txn.commit();
        assert!(refs.work_queue_non_empty().unwrap());
    }

    #[test]
    fn is_referenced_finds_a_matching_checksum_in_any_layer() {
        let store = Store::new();
        store.create_table(NodesTable::TABLE);
        let sha1 = Sha1Checksum::from_bytes([0x42; 20]);
        let mut row = NodeRow::new(OpDepth::BASE, Presence::Normal, NodeKind::File);
        row.checksum = Some(sha1);
        let mut txn = store.begin().unwrap();
        NodesTable::put(txn.table_mut(NodesTable::TABLE).unwrap(), &RelPath::new("f"), &row);
        txn.commit();

        let refs = EngineRefs::new(&store);
        assert!(refs.is_referenced(&sha1).unwrap());
        assert!(!refs.is_referenced(&Sha1Checksum::from_bytes([0x99; 20])).unwrap());
    }
}
