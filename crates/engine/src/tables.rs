//! Table facades over `wcdb-kv::Table` for `NODES`, `ACTUAL_NODE`, and
//! `WORK_QUEUE` (§6.2).
//!
//! `NODES` rows are keyed `<relpath>\0<op_depth as 4-byte BE>` so that
//! `scan_prefix(b"<relpath>\0")` returns every layer at exactly that path
//! in ascending `op_depth` order, and `scan_prefix(b"<relpath>/")`
//! returns every row at any descendant path (root's descendant prefix is
//! the empty slice, matching the whole table, since every other relpath's
//! key begins with its first path byte rather than `\0`; [`NodesTable::subtree_rows`]
//! filters root's own row back out of that scan so it isn't reported
//! twice). This replaces `reps-table.c`-style duplicate-key rows with an
//! explicit composite key, since op_depth layers must be addressable and
//! deletable individually rather than only as an insertion-ordered group.

use wcdb_core::error::{WcdbError, WcdbResult};
use wcdb_core::types::{OpDepth, RelPath};
use wcdb_kv::Table;

use crate::model::{ActualRow, NodeRow, WcLockRow, WorkItem};

fn exact_prefix(path: &RelPath) -> Vec<u8> {
    let mut key = path.as_str().as_bytes().to_vec();
    key.push(0);
    key
}

fn descendant_prefix(path: &RelPath) -> Vec<u8> {
    if path.is_root() {
        Vec::new()
    } else {
        let mut key = path.as_str().as_bytes().to_vec();
        key.push(b'/');
        key
    }
}

fn node_key(path: &RelPath, op_depth: OpDepth) -> Vec<u8> {
    let mut key = exact_prefix(path);
    key.extend_from_slice(&op_depth.0.to_be_bytes());
    key
}

/// Facade over the `NODES` table.
pub struct NodesTable;

impl NodesTable {
    pub const TABLE: &'static str = "nodes";

    pub fn put(table: &mut Table, path: &RelPath, row: &NodeRow) {
        table.put(&node_key(path, row.op_depth), wcdb_core::skel::unparse(&row.to_skel()));
    }

    pub fn delete(table: &mut Table, path: &RelPath, op_depth: OpDepth) -> bool {
        table.delete(&node_key(path, op_depth))
    }

    /// All layers at exactly `path`, ascending by `op_depth`.
    pub fn layers_at(table: &Table, path: &RelPath) -> WcdbResult<Vec<NodeRow>> {
        let prefix = exact_prefix(path);
        table
            .scan_prefix(&prefix)
            .map(|(_, v)| NodeRow::from_skel(&wcdb_core::skel::parse(v)?))
            .collect()
    }

    /// The highest-`op_depth` layer at `path`, if any (the row that
    /// determines current status per §4.10.1's resolution rule).
    pub fn highest_layer(table: &Table, path: &RelPath) -> WcdbResult<Option<NodeRow>> {
        Ok(NodesTable::layers_at(table, path)?.into_iter().last())
    }

    pub fn base_layer(table: &Table, path: &RelPath) -> WcdbResult<Option<NodeRow>> {
        Ok(NodesTable::layers_at(table, path)?
            .into_iter()
            .find(|r| r.op_depth.is_base()))
    }

    /// Every row whose path is `path` or a descendant of it, as
    /// `(relpath, row)` pairs in key order. Used by recursive delete,
    /// revert, and the derived-query scans.
    pub fn subtree_rows(table: &Table, path: &RelPath) -> WcdbResult<Vec<(RelPath, NodeRow)>> {
        let mut out = Vec::new();
        for (_key, value) in table.scan_prefix(&exact_prefix(path)) {
            out.push((path.clone(), NodeRow::from_skel(&wcdb_core::skel::parse(value)?)?));
        }
        for (key, value) in table.scan_prefix(&descendant_prefix(path)) {
            let relpath = relpath_from_key(key)?;
            // At the root, `descendant_prefix` is the empty slice and
            // matches the whole table, including root's own row already
            // captured by the `exact_prefix` scan above; skip it here so
            // callers never see a relpath twice.
            if relpath == *path {
                continue;
            }
            out.push((relpath, NodeRow::from_skel(&wcdb_core::skel::parse(value)?)?));
        }
        Ok(out)
    }

    /// Every distinct relpath with at least one row, across the whole
    /// table, in key order — used by the derived-query scans that walk
    /// every node once.
    pub fn all_relpaths(table: &Table) -> WcdbResult<Vec<RelPath>> {
        let mut seen = std::collections::BTreeSet::new();
        for (key, _) in table.scan_prefix(&[]) {
            seen.insert(relpath_from_key(key)?.as_str().to_string());
        }
        Ok(seen.into_iter().map(RelPath::new).collect())
    }
}

fn relpath_from_key(key: &[u8]) -> WcdbResult<RelPath> {
    let sep = key
        .iter()
        .rposition(|&b| b == 0)
        .ok_or_else(|| WcdbError::corrupt("node key missing op_depth separator"))?;
    let path = std::str::from_utf8(&key[..sep]).map_err(|_| WcdbError::corrupt("non-utf8 node key"))?;
    Ok(RelPath::new(path))
}

/// Facade over the `ACTUAL_NODE` table (one row per relpath, no layers).
pub struct ActualTable;

impl ActualTable {
    pub const TABLE: &'static str = "actual";

    pub fn read(table: &Table, path: &RelPath) -> WcdbResult<Option<ActualRow>> {
        table
            .get(path.as_str().as_bytes())
            .map(|bytes| ActualRow::from_skel(&wcdb_core::skel::parse(bytes)?))
            .transpose()
    }

    pub fn put(table: &mut Table, path: &RelPath, row: &ActualRow) {
        table.put(path.as_str().as_bytes(), wcdb_core::skel::unparse(&row.to_skel()));
    }

    pub fn delete(table: &mut Table, path: &RelPath) {
        table.delete(path.as_str().as_bytes());
    }
}

/// Facade over the `WC_LOCK` table (§6.2): one row per currently-locked
/// relpath, the persisted counterpart to [`crate::lock::LockTable`]'s
/// in-memory `owned_locks` list.
pub struct WcLockTable;

impl WcLockTable {
    pub const TABLE: &'static str = "wc_lock";

    pub fn put(table: &mut Table, path: &RelPath, row: &WcLockRow) {
        table.put(path.as_str().as_bytes(), wcdb_core::skel::unparse(&row.to_skel()));
    }

    pub fn delete(table: &mut Table, path: &RelPath) -> bool {
        table.delete(path.as_str().as_bytes())
    }

    pub fn get(table: &Table, path: &RelPath) -> WcdbResult<Option<WcLockRow>> {
        table
            .get(path.as_str().as_bytes())
            .map(|bytes| WcLockRow::from_skel(&wcdb_core::skel::parse(bytes)?))
            .transpose()
    }
}

/// Facade over the `WORK_QUEUE` table: ids assigned in increasing order,
/// fetched lowest-id-first.
pub struct WorkQueueTable;

impl WorkQueueTable {
    pub const TABLE: &'static str = "work_queue";
    const NEXT_ID: &'static [u8] = b"next-id";

    pub fn init(table: &mut Table) {
        if table.get(Self::NEXT_ID).is_none() {
            table.put(Self::NEXT_ID, 0u64.to_be_bytes().to_vec());
        }
    }

    fn next_id(table: &Table) -> WcdbResult<u64> {
        let bytes = table
            .get(Self::NEXT_ID)
            .ok_or_else(|| WcdbError::corrupt("missing 'next-id' row in work_queue table"))?;
        let arr: [u8; 8] = bytes
            .try_into()
            .map_err(|_| WcdbError::corrupt("malformed 'next-id' row"))?;
        Ok(u64::from_be_bytes(arr))
    }

    /// Appends one work item, returning its assigned id.
    pub fn add(table: &mut Table, payload: Vec<u8>) -> WcdbResult<u64> {
        let id = Self::next_id(table)?;
        table.put(&id.to_be_bytes(), payload);
        table.put(Self::NEXT_ID, (id + 1).to_be_bytes().to_vec());
        Ok(id)
    }

    /// The lowest-id pending item, if any.
    pub fn fetch(table: &Table) -> Option<WorkItem> {
        table
            .scan_prefix(&[])
            .find(|(k, _)| *k != Self::NEXT_ID)
            .map(|(k, v)| WorkItem {
                id: u64::from_be_bytes(k.try_into().unwrap_or([0; 8])),
                payload: v.to_vec(),
            })
    }

    pub fn completed(table: &mut Table, id: u64) {
        table.delete(&id.to_be_bytes());
    }

    pub fn is_empty(table: &Table) -> bool {
        table.scan_prefix(&[]).all(|(k, _)| k == Self::NEXT_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wcdb_core::types::{NodeKind, Presence};

    #[test]
    fn nodes_layers_at_returns_ascending_op_depth() {
        let mut t = Table::new();
        let path = RelPath::new("a/b");
        NodesTable::put(&mut t, &path, &NodeRow::new(OpDepth(2), Presence::Normal, NodeKind::File));
        NodesTable::put(&mut t, &path, &NodeRow::new(OpDepth(0), Presence::Normal, NodeKind::File));
        let layers = NodesTable::layers_at(&t, &path).unwrap();
        assert_eq!(layers.iter().map(|r| r.op_depth.0).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn nodes_subtree_rows_finds_self_and_descendants_only() {
        let mut t = Table::new();
        for p in ["a", "a/b", "a/b/c", "ab", "other"] {
            NodesTable::put(
                &mut t,
                &RelPath::new(p),
                &NodeRow::new(OpDepth(0), Presence::Normal, NodeKind::File),
            );
        }
        let rows = NodesTable::subtree_rows(&t, &RelPath::new("a")).unwrap();
        let mut paths: Vec<_> = rows.into_iter().map(|(p, _)| p.as_str().to_string()).collect();
        paths.sort();
        assert_eq!(paths, vec!["a".to_string(), "a/b".to_string(), "a/b/c".to_string()]);
    }

    #[test]
    fn nodes_subtree_rows_at_root_does_not_duplicate_roots_own_row() {
        let mut t = Table::new();
        for p in ["", "a", "a/b"] {
            NodesTable::put(
                &mut t,
                &RelPath::new(p),
                &NodeRow::new(OpDepth(0), Presence::Normal, NodeKind::File),
            );
        }
        let rows = NodesTable::subtree_rows(&t, &RelPath::root()).unwrap();
        let root_hits = rows.iter().filter(|(p, _)| p.is_root()).count();
        assert_eq!(root_hits, 1);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn nodes_delete_removes_only_that_layer() {
        let mut t = Table::new();
        let path = RelPath::new("a");
        NodesTable::put(&mut t, &path, &NodeRow::new(OpDepth(0), Presence::Normal, NodeKind::File));
        NodesTable::put(&mut t, &path, &NodeRow::new(OpDepth(1), Presence::Normal, NodeKind::File));
        assert!(NodesTable::delete(&mut t, &path, OpDepth(1)));
        let layers = NodesTable::layers_at(&t, &path).unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].op_depth.0, 0);
    }

    #[test]
    fn actual_table_round_trips_and_deletes() {
        let mut t = Table::new();
        let path = RelPath::new("a/b");
        let row = ActualRow {
            changelist: Some("cl".to_string()),
            ..ActualRow::default()
        };
        ActualTable::put(&mut t, &path, &row);
        assert_eq!(ActualTable::read(&t, &path).unwrap(), Some(row));
        ActualTable::delete(&mut t, &path);
        assert_eq!(ActualTable::read(&t, &path).unwrap(), None);
    }

    #[test]
    fn wc_lock_table_round_trips_and_deletes() {
        use wcdb_core::types::WcId;

        let mut t = Table::new();
        let path = RelPath::new("a/b");
        let row = WcLockRow {
            wc_id: WcId(1),
            locked_levels: -1,
        };
        WcLockTable::put(&mut t, &path, &row);
        assert_eq!(WcLockTable::get(&t, &path).unwrap(), Some(row));
        assert!(WcLockTable::delete(&mut t, &path));
        assert_eq!(WcLockTable::get(&t, &path).unwrap(), None);
    }

    #[test]
    fn work_queue_fetches_lowest_id_first_and_completes() {
        let mut t = Table::new();
        WorkQueueTable::init(&mut t);
        let id1 = WorkQueueTable::add(&mut t, b"first".to_vec()).unwrap();
        let id2 = WorkQueueTable::add(&mut t, b"second".to_vec()).unwrap();
        assert!(id1 < id2);

        let item = WorkQueueTable::fetch(&t).unwrap();
        assert_eq!(item.id, id1);
        assert_eq!(item.payload, b"first".to_vec());

        WorkQueueTable::completed(&mut t, id1);
        let item2 = WorkQueueTable::fetch(&t).unwrap();
        assert_eq!(item2.id, id2);

        WorkQueueTable::completed(&mut t, id2);
        assert!(WorkQueueTable::is_empty(&t));
    }
}
