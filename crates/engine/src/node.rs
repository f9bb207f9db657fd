//! The WC Node Model (§4.10): reads, writes, upward scans, and derived
//! queries over the layered `NODES`/`ACTUAL_NODE` tables.
//!
//! Grounded in `wc_db.h`'s declarations for the operation surface
//! (`svn_wc__db_read_info`, `svn_wc__db_base_add_*`, `svn_wc__db_op_copy`,
//! `svn_wc__db_op_delete`, `svn_wc__db_op_revert`,
//! `svn_wc__db_global_commit`, `svn_wc__db_scan_addition`,
//! `svn_wc__db_scan_deletion`, the `has_switched_subtrees` /
//! `min_max_revisions` / `has_local_mods` / `revision_status` family,
//! `svn_wc__db_read_properties` / `svn_wc__db_op_set_props`, and
//! `svn_wc__db_wq_*`), and in the teacher's `engine::database` /
//! `engine::transaction` modules for the "one `wcdb_trail::Trail` per
//! mutating call" shape every function below follows.

use wcdb_core::config::WcdbConfig;
use wcdb_core::error::{WcdbError, WcdbResult};
use wcdb_core::types::{NodeKind, OpDepth, Presence, RelPath, ReposId, Revision, Sha1Checksum, SvnDepth, WorkingStatus};
use wcdb_kv::Store;

use crate::model::{ActualRow, NodeRow, WorkItem};
use crate::tables::{ActualTable, NodesTable, WorkQueueTable};

fn kv(err: wcdb_kv::KvError) -> WcdbError {
    err.into()
}

/// Seeds the `nodes`/`actual`/`work_queue` tables, if not already present.
pub fn init(store: &Store) {
    store.create_table(NodesTable::TABLE);
    store.create_table(ActualTable::TABLE);
    store.create_table(WorkQueueTable::TABLE);
    let _ = wcdb_trail::run_txn(store, &WcdbConfig::default(), |trail| {
        WorkQueueTable::init(trail.txn.table_mut(WorkQueueTable::TABLE).map_err(kv)?);
        Ok(())
    });
}

/// The dense record `read_info` returns (§4.10.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub status: WorkingStatus,
    pub kind: NodeKind,
    pub revision: Option<Revision>,
    pub repos_id: Option<ReposId>,
    pub repos_relpath: Option<String>,
    pub changed_rev: Option<Revision>,
    pub changed_date: Option<i64>,
    pub changed_author: Option<String>,
    pub depth: Option<SvnDepth>,
    pub checksum: Option<Sha1Checksum>,
    pub original_repos_id: Option<ReposId>,
    pub original_repos_path: Option<String>,
    pub original_revision: Option<Revision>,
    pub changelist: Option<String>,
    pub conflicted: bool,
    pub op_root: bool,
    pub props_mod: bool,
    pub have_base: bool,
    pub have_more_work: bool,
    pub have_work: bool,
}

fn working_status_of(presence: Presence) -> WorkingStatus {
    match presence {
        Presence::Normal => WorkingStatus::Added,
        Presence::NotPresent | Presence::BaseDeleted => WorkingStatus::Deleted,
        Presence::Incomplete => WorkingStatus::Incomplete,
        Presence::Excluded => WorkingStatus::Excluded,
        Presence::Absent => WorkingStatus::Normal,
    }
}

/// `svn_wc__db_read_info` (§4.10.1).
///
/// Reads the `nodes` and `actual` tables via two sequential `with_table`
/// calls rather than a nested one: `Store::with_table` takes a read lock
/// per call, and a second call made from inside the first call's closure
/// would recursively re-enter that lock on the same thread.
pub fn read_info(store: &Store, path: &RelPath) -> WcdbResult<NodeInfo> {
    let (top, have_base, working_count) = store
        .with_table(NodesTable::TABLE, |table| -> WcdbResult<_> {
            let layers = NodesTable::layers_at(table, path)?;
            let top = layers
                .last()
                .cloned()
                .ok_or_else(|| WcdbError::not_found(path.clone()))?;
            let have_base = layers.iter().any(|r| r.op_depth.is_base());
            let working_count = layers.iter().filter(|r| r.op_depth.is_working()).count();
            Ok((top, have_base, working_count))
        })
        .map_err(kv)??;

    let status = if top.op_depth.is_working() {
        working_status_of(top.presence)
    } else {
        WorkingStatus::Normal
    };

    let actual = store
        .with_table(ActualTable::TABLE, |t| ActualTable::read(t, path))
        .map_err(kv)??;

    Ok(NodeInfo {
        status,
        kind: top.kind,
        revision: top.revision,
        repos_id: top.repos_id,
        repos_relpath: top.repos_path.clone(),
        changed_rev: top.changed_rev,
        changed_date: top.changed_date,
        changed_author: top.changed_author.clone(),
        depth: top.depth,
        checksum: top.checksum.clone(),
        original_repos_id: top.original_repos_id,
        original_repos_path: top.original_repos_path.clone(),
        original_revision: top.original_revision,
        changelist: actual.as_ref().and_then(|a| a.changelist.clone()),
        conflicted: actual.as_ref().map(ActualRow::is_conflicted).unwrap_or(false),
        op_root: top.op_depth == path.op_root_depth(),
        props_mod: actual.as_ref().map(|a| a.properties.is_some()).unwrap_or(false),
        have_base,
        have_more_work: working_count >= 2,
        have_work: working_count >= 1,
    })
}

// --- §4.10.2 insert (BASE) ---------------------------------------------

/// Options shared by every `base_add_*` call.
#[derive(Debug, Clone, Default)]
pub struct BaseAddOptions {
    pub repos_id: Option<ReposId>,
    pub repos_relpath: Option<String>,
    pub revision: Option<Revision>,
    pub changed_rev: Option<Revision>,
    pub changed_date: Option<i64>,
    pub changed_author: Option<String>,
    pub props: Option<Vec<u8>>,
    pub depth: Option<SvnDepth>,
    pub checksum: Option<Sha1Checksum>,
    /// Directory children to seed as `incomplete`/`unknown` BASE rows.
    pub children: Vec<String>,
}

fn base_row(kind: NodeKind, presence: Presence, opts: &BaseAddOptions) -> NodeRow {
    NodeRow {
        repos_id: opts.repos_id,
        repos_path: opts.repos_relpath.clone(),
        revision: opts.revision,
        depth: opts.depth,
        checksum: opts.checksum.clone(),
        changed_rev: opts.changed_rev,
        changed_date: opts.changed_date,
        changed_author: opts.changed_author.clone(),
        properties: opts.props.clone(),
        ..NodeRow::new(OpDepth::BASE, presence, kind)
    }
}

/// Implements *extend-parent-delete*: if `path`'s parent has a WORKING
/// row, the new node must be shadowed by a `base-deleted` row at the
/// parent's op_depth so the parent's pending delete keeps covering it.
fn extend_parent_delete(
    table: &mut wcdb_kv::Table,
    path: &RelPath,
    kind: NodeKind,
) -> WcdbResult<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    let parent_layers = NodesTable::layers_at(table, &parent)?;
    if let Some(parent_working) = parent_layers.iter().rev().find(|r| r.op_depth.is_working()) {
        let shadow = NodeRow::new(parent_working.op_depth, Presence::BaseDeleted, kind);
        NodesTable::put(table, path, &shadow);
    }
    Ok(())
}

fn base_add(
    store: &Store,
    config: &WcdbConfig,
    path: &RelPath,
    kind: NodeKind,
    presence: Presence,
    opts: BaseAddOptions,
) -> WcdbResult<()> {
    wcdb_trail::run_txn(store, config, |trail| {
        let table = trail.txn.table_mut(NodesTable::TABLE).map_err(kv)?;
        extend_parent_delete(table, path, kind)?;
        NodesTable::put(table, path, &base_row(kind, presence, &opts));

        if kind == NodeKind::Dir {
            for child in &opts.children {
                let child_path = path.join(child);
                let child_row = NodeRow::new(OpDepth::BASE, Presence::Incomplete, NodeKind::Unknown);
                NodesTable::put(table, &child_path, &child_row);
            }
        }
        Ok(())
    })
}

pub fn base_add_directory(store: &Store, config: &WcdbConfig, path: &RelPath, opts: BaseAddOptions) -> WcdbResult<()> {
    base_add(store, config, path, NodeKind::Dir, Presence::Normal, opts)
}

pub fn base_add_file(store: &Store, config: &WcdbConfig, path: &RelPath, opts: BaseAddOptions) -> WcdbResult<()> {
    base_add(store, config, path, NodeKind::File, Presence::Normal, opts)
}

pub fn base_add_symlink(store: &Store, config: &WcdbConfig, path: &RelPath, opts: BaseAddOptions) -> WcdbResult<()> {
    base_add(store, config, path, NodeKind::Symlink, Presence::Normal, opts)
}

pub fn base_add_absent(store: &Store, config: &WcdbConfig, path: &RelPath, kind: NodeKind, opts: BaseAddOptions) -> WcdbResult<()> {
    base_add(store, config, path, kind, Presence::Absent, opts)
}

pub fn base_add_not_present(store: &Store, config: &WcdbConfig, path: &RelPath, kind: NodeKind, opts: BaseAddOptions) -> WcdbResult<()> {
    base_add(store, config, path, kind, Presence::NotPresent, opts)
}

// --- §4.10.3 copy --------------------------------------------------------

/// `op_copy(src, dst)`. Only the same-store path is implemented; a
/// cross-database copy (reading `src` from one `WcRoot`'s store and
/// writing into another's) is the caller's responsibility to stage, by
/// reading `src`'s subtree with [`read_info`]/[`read_props`] and issuing
/// the equivalent `op_copy` calls against the destination store.
pub fn op_copy(store: &Store, config: &WcdbConfig, src: &RelPath, dst: &RelPath) -> WcdbResult<()> {
    wcdb_trail::run_txn(store, config, |trail| {
        let table = trail.txn.table(NodesTable::TABLE).map_err(kv)?;
        let src_rows = NodesTable::subtree_rows(table, src)?;
        if src_rows.iter().any(|(_, r)| r.presence == Presence::Absent) {
            return Err(WcdbError::AuthzUnreadable { path: src.clone() });
        }
        if !src_rows.iter().any(|(p, _)| p == src) {
            return Err(WcdbError::not_found(src.clone()));
        }

        let dst_parent = dst.parent();
        let parent_op_root = dst_parent
            .as_ref()
            .map(|p| NodesTable::highest_layer(table, p))
            .transpose()?
            .flatten()
            .filter(|r| r.op_depth.is_working() && r.presence == Presence::Normal);

        let dst_op_depth = match &parent_op_root {
            Some(parent_row) => parent_row.op_depth,
            None => dst.op_root_depth(),
        };

        let table = trail.txn.table_mut(NodesTable::TABLE).map_err(kv)?;
        for (src_path, row) in &src_rows {
            let rel_suffix = &src_path.as_str()[src.as_str().len()..];
            let dst_path = if rel_suffix.is_empty() {
                dst.clone()
            } else {
                dst.join(rel_suffix.trim_start_matches('/'))
            };
            let op_depth = if src_path == src { dst_op_depth } else { row.op_depth.max(dst_op_depth) };
            let copied = NodeRow {
                original_repos_id: row.repos_id.or(row.original_repos_id),
                original_repos_path: row.repos_path.clone().or_else(|| row.original_repos_path.clone()),
                original_revision: row.revision.or(row.original_revision),
                moved_here: false,
                repos_id: None,
                repos_path: None,
                revision: None,
                checksum: row.checksum.clone(),
                properties: row.properties.clone(),
                ..NodeRow::new(op_depth, Presence::Normal, row.kind)
            };
            NodesTable::put(table, &dst_path, &copied);
        }
        Ok(())
    })
}

// --- §4.10.4 delete -------------------------------------------------------

/// `op_delete(path)`.
pub fn op_delete(store: &Store, config: &WcdbConfig, path: &RelPath) -> WcdbResult<()> {
    if path.is_root() {
        // The WCROOT has no parent to shadow into at a fresh op-root
        // depth, and is never itself an add/copy root, so neither delete
        // branch below has anything valid to do.
        return Err(WcdbError::InvalidOperationDepth {
            path: path.clone(),
            detail: "cannot delete the working copy root".to_string(),
        });
    }
    wcdb_trail::run_txn(store, config, |trail| {
        let table = trail.txn.table(NodesTable::TABLE).map_err(kv)?;
        let layers = NodesTable::layers_at(table, path)?;
        let top = layers.last().cloned().ok_or_else(|| WcdbError::not_found(path.clone()))?;
        let is_op_root = top.op_depth.is_working() && top.op_depth == path.op_root_depth();

        let table = trail.txn.table_mut(NodesTable::TABLE).map_err(kv)?;
        if is_op_root {
            // The node itself is an add/copy root: deleting it removes
            // that layer (and everything it shadowed) rather than
            // overlaying a further deletion on top.
            let subtree = NodesTable::subtree_rows(table, path)?;
            for (p, row) in subtree {
                if row.op_depth.0 >= top.op_depth.0 {
                    NodesTable::delete(table, &p, row.op_depth);
                }
            }
        } else {
            // Shadow BASE (and any shallower working layers) with a
            // `base-deleted` row at this node's fresh op-root depth.
            let d = path.op_root_depth();
            let subtree = NodesTable::subtree_rows(table, path)?;
            for (p, row) in &subtree {
                if row.op_depth.0 < d.0 {
                    let shadow = NodeRow::new(d, Presence::BaseDeleted, row.kind);
                    NodesTable::put(table, p, &shadow);
                }
            }
        }
        Ok(())
    })
}

// --- §4.10.5 revert --------------------------------------------------------

/// Revert recursion depth (§4.10.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertDepth {
    Empty,
    Infinity,
}

/// `op_revert(path, depth)`. Returns the relpaths that were reverted, for
/// the caller to turn into notifications — the Rust replacement for the
/// source's transient SQLite revert-list trigger (§4.10.5's `[ADD]`
/// note): the same statements that perform the deletes/rewrites collect
/// their own touched paths instead of relying on a trigger mechanism
/// `wcdb-kv` has no need to support.
pub fn op_revert(store: &Store, config: &WcdbConfig, path: &RelPath, depth: RevertDepth) -> WcdbResult<Vec<RelPath>> {
    wcdb_trail::run_txn(store, config, |trail| {
        let table = trail.txn.table(NodesTable::TABLE).map_err(kv)?;
        let layers = NodesTable::layers_at(table, path)?;
        let working_root = layers
            .iter()
            .rev()
            .find(|r| r.op_depth.is_working())
            .cloned();

        let Some(root_row) = working_root else {
            // Nothing in WORKING to revert at this path; a no-op revert.
            return Ok(Vec::new());
        };
        if root_row.op_depth != path.op_root_depth() {
            return Err(WcdbError::InvalidOperationDepth {
                path: path.clone(),
                detail: "revert parent first".to_string(),
            });
        }

        let subtree = NodesTable::subtree_rows(table, path)?;
        if depth == RevertDepth::Empty {
            let modified_children = subtree
                .iter()
                .any(|(p, r)| p != path && r.op_depth.0 >= root_row.op_depth.0);
            if modified_children {
                return Err(WcdbError::InvalidOperationDepth {
                    path: path.clone(),
                    detail: "non-recursive revert of a directory with modified children".to_string(),
                });
            }
        }

        let mut reverted = Vec::new();
        let table = trail.txn.table_mut(NodesTable::TABLE).map_err(kv)?;
        for (p, row) in &subtree {
            if row.op_depth.0 >= root_row.op_depth.0 {
                NodesTable::delete(table, p, row.op_depth);
                reverted.push(p.clone());
            }
        }

        let actual_table = trail.txn.table_mut(ActualTable::TABLE).map_err(kv)?;
        for p in &reverted {
            if let Some(mut actual) = ActualTable::read(actual_table, p)? {
                let changelist = actual.changelist.take();
                let cleared = ActualRow {
                    changelist,
                    ..ActualRow::default()
                };
                if cleared.is_empty() {
                    ActualTable::delete(actual_table, p);
                } else {
                    ActualTable::put(actual_table, p, &cleared);
                }
            }
        }
        Ok(reverted)
    })
}

// --- §4.10.6 commit --------------------------------------------------------

/// Arguments to `global_commit` (§4.10.6).
#[derive(Debug, Clone)]
pub struct CommitInfo {
    pub new_revision: Revision,
    pub changed_rev: Revision,
    pub changed_date: i64,
    pub changed_author: String,
    pub checksum: Option<Sha1Checksum>,
    pub keep_changelist: bool,
    pub no_unlock: bool,
}

/// `global_commit(path, ...)`.
pub fn global_commit(store: &Store, config: &WcdbConfig, path: &RelPath, info: CommitInfo) -> WcdbResult<()> {
    wcdb_trail::run_txn(store, config, |trail| {
        let table = trail.txn.table(NodesTable::TABLE).map_err(kv)?;
        let layers = NodesTable::layers_at(table, path)?;
        let base = layers.iter().find(|r| r.op_depth.is_base()).cloned();
        let top = layers.last().cloned().ok_or_else(|| WcdbError::not_found(path.clone()))?;

        let (repos_id, repos_relpath) = if let Some(base) = &base {
            (base.repos_id, base.repos_path.clone())
        } else {
            let parent = path.parent().ok_or_else(|| {
                WcdbError::corrupt("commit target has no BASE and no parent to derive repository location from")
            })?;
            let parent_base = NodesTable::base_layer(table, &parent)?
                .ok_or_else(|| WcdbError::not_found(parent.clone()))?;
            let name = path.basename();
            (
                parent_base.repos_id,
                parent_base.repos_path.map(|p| format!("{p}/{name}")),
            )
        };

        let is_shadow_root = top.op_depth.is_working() && top.op_depth == path.op_root_depth();
        let table = trail.txn.table_mut(NodesTable::TABLE).map_err(kv)?;

        let working_layers: Vec<_> = layers.iter().filter(|r| r.op_depth.is_working()).collect();
        for row in &working_layers {
            NodesTable::delete(table, path, row.op_depth);
        }
        if is_shadow_root && working_layers.len() > 1 {
            let subtree = NodesTable::subtree_rows(table, path)?;
            for (p, row) in subtree {
                if p != *path && row.op_depth.0 < top.op_depth.0 {
                    NodesTable::delete(table, &p, row.op_depth);
                }
            }
        }

        let actual_table = trail.txn.table_mut(ActualTable::TABLE).map_err(kv)?;
        let actual = ActualTable::read(actual_table, path)?;
        let props = actual.as_ref().and_then(|a| a.properties.clone());

        let table = trail.txn.table_mut(NodesTable::TABLE).map_err(kv)?;
        let new_base = NodeRow {
            repos_id,
            repos_path: repos_relpath,
            revision: Some(info.new_revision),
            checksum: info.checksum.clone(),
            changed_rev: Some(info.changed_rev),
            changed_date: Some(info.changed_date),
            changed_author: Some(info.changed_author.clone()),
            depth: top.depth,
            properties: props.or_else(|| top.properties.clone()),
            ..NodeRow::new(OpDepth::BASE, Presence::Normal, top.kind)
        };
        NodesTable::put(table, path, &new_base);

        let actual_table = trail.txn.table_mut(ActualTable::TABLE).map_err(kv)?;
        match actual {
            Some(a) if info.keep_changelist && a.changelist.is_some() => {
                let kept = ActualRow {
                    changelist: a.changelist,
                    ..ActualRow::default()
                };
                ActualTable::put(actual_table, path, &kept);
            }
            _ => ActualTable::delete(actual_table, path),
        }
        let _ = info.no_unlock;
        Ok(())
    })
}

// --- §4.10.7 upward scans --------------------------------------------------

/// How an added node got there (§4.10.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditionKind {
    Added,
    Copied,
    MovedHere,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionInfo {
    pub status: AdditionKind,
    pub op_root: RelPath,
    pub repos_id: Option<ReposId>,
    pub repos_relpath: Option<String>,
    pub original_repos_id: Option<ReposId>,
    pub original_repos_path: Option<String>,
    pub original_revision: Option<Revision>,
}

/// `scan_addition(path)`.
pub fn scan_addition(store: &Store, path: &RelPath) -> WcdbResult<AdditionInfo> {
    store
        .with_table(NodesTable::TABLE, |table| {
            let mut current = path.clone();
            let op_root_row;
            let op_root_path;
            loop {
                let row = NodesTable::highest_layer(table, &current)?
                    .ok_or_else(|| WcdbError::not_found(current.clone()))?;
                if !row.op_depth.is_working() {
                    return Err(WcdbError::unexpected_status(path.clone(), "not an added node"));
                }
                if row.op_depth == current.op_root_depth() {
                    op_root_row = row;
                    op_root_path = current.clone();
                    break;
                }
                current = current.parent().ok_or_else(|| {
                    WcdbError::corrupt("working row with no reachable op-root")
                })?;
            }

            let status = if !op_root_row.has_copyfrom() {
                AdditionKind::Added
            } else if op_root_row.moved_here {
                AdditionKind::MovedHere
            } else {
                AdditionKind::Copied
            };

            // Scan upward across BASE rows from the op-root's parent to
            // determine the current repository location for an `Added`
            // node (one with no copyfrom data of its own).
            let (repos_id, repos_relpath) = if status == AdditionKind::Added {
                let mut probe = op_root_path.clone();
                loop {
                    if let Some(base) = NodesTable::base_layer(table, &probe)? {
                        break (base.repos_id, base.repos_path);
                    }
                    probe = match probe.parent() {
                        Some(p) => p,
                        None => break (None, None),
                    };
                }
            } else {
                (op_root_row.repos_id, op_root_row.repos_path.clone())
            };

            Ok(AdditionInfo {
                status,
                op_root: op_root_path,
                repos_id,
                repos_relpath,
                original_repos_id: op_root_row.original_repos_id,
                original_repos_path: op_root_row.original_repos_path,
                original_revision: op_root_row.original_revision,
            })
        })
        .map_err(kv)?
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeletionInfo {
    pub base_del_relpath: Option<RelPath>,
    pub moved_to_relpath: Option<RelPath>,
    pub work_del_relpath: Option<RelPath>,
}

/// `scan_deletion(path)`.
pub fn scan_deletion(store: &Store, path: &RelPath) -> WcdbResult<DeletionInfo> {
    store
        .with_table(NodesTable::TABLE, |table| {
            let top = NodesTable::highest_layer(table, path)?
                .ok_or_else(|| WcdbError::not_found(path.clone()))?;
            if !matches!(top.presence, Presence::NotPresent | Presence::BaseDeleted) {
                return Err(WcdbError::unexpected_status(path.clone(), "node is not deleted"));
            }

            let mut result = DeletionInfo::default();
            let mut current = path.clone();
            let mut in_working_delete = top.op_depth.is_working();
            loop {
                let layers = NodesTable::layers_at(table, &current)?;
                let here = layers.last().cloned();
                match here {
                    Some(row) if row.op_depth.is_base() && matches!(row.presence, Presence::NotPresent | Presence::BaseDeleted) => {
                        result.base_del_relpath = Some(current.clone());
                    }
                    _ => {}
                }
                if in_working_delete && result.work_del_relpath.is_none() {
                    if let Some(row) = layers.iter().rev().find(|r| r.op_depth.is_working()) {
                        if row.op_depth == current.op_root_depth() {
                            result.work_del_relpath = Some(current.clone());
                            in_working_delete = false;
                        }
                    }
                }
                match current.parent() {
                    Some(p) => current = p,
                    None => break,
                }
            }
            Ok(result)
        })
        .map_err(kv)?
}

// --- §4.10.8 derived queries -------------------------------------------

pub fn has_switched_subtrees(store: &Store, wcroot_repos_relpath: &str, trail_url_suffix: &str) -> WcdbResult<bool> {
    if !wcroot_repos_relpath.ends_with(trail_url_suffix) {
        return Ok(true);
    }
    store
        .with_table(NodesTable::TABLE, |table| {
            for relpath in NodesTable::all_relpaths(table)? {
                if let Some(row) = NodesTable::base_layer(table, &relpath)? {
                    if let Some(repos_path) = &row.repos_path {
                        let expected = if relpath.is_root() {
                            wcroot_repos_relpath.to_string()
                        } else {
                            format!("{wcroot_repos_relpath}/{}", relpath.as_str())
                        };
                        if *repos_path != expected {
                            return Ok(true);
                        }
                    }
                }
            }
            Ok(false)
        })
        .map_err(kv)?
}

pub fn min_max_revisions(store: &Store, committed_only: bool) -> WcdbResult<(Revision, Revision)> {
    store
        .with_table(NodesTable::TABLE, |table| {
            let mut min = u64::MAX;
            let mut max = 0u64;
            for relpath in NodesTable::all_relpaths(table)? {
                if let Some(row) = NodesTable::base_layer(table, &relpath)? {
                    let rev = if committed_only {
                        row.changed_rev.map(|r| r.0)
                    } else {
                        row.revision.map(|r| r.0)
                    };
                    if let Some(rev) = rev {
                        min = min.min(rev);
                        max = max.max(rev);
                    }
                }
            }
            if max == 0 && min == u64::MAX {
                Ok((Revision(0), Revision(0)))
            } else {
                Ok((Revision(min), Revision(max)))
            }
        })
        .map_err(kv)?
}

pub fn is_sparse_checkout(store: &Store) -> WcdbResult<bool> {
    store
        .with_table(NodesTable::TABLE, |table| {
            for relpath in NodesTable::all_relpaths(table)? {
                if let Some(row) = NodesTable::highest_layer(table, &relpath)? {
                    if matches!(row.depth, Some(d) if d != SvnDepth::Infinity) {
                        return Ok(true);
                    }
                }
            }
            Ok(false)
        })
        .map_err(kv)?
}

pub fn has_local_mods(store: &Store) -> WcdbResult<bool> {
    let has_tree_or_prop_mods = store
        .with_table(NodesTable::TABLE, |nodes| -> WcdbResult<bool> {
            for relpath in NodesTable::all_relpaths(nodes)? {
                if NodesTable::layers_at(nodes, &relpath)?.iter().any(|r| r.op_depth.is_working()) {
                    return Ok(true);
                }
            }
            Ok(false)
        })
        .map_err(kv)??;
    if has_tree_or_prop_mods {
        return Ok(true);
    }
    store
        .with_table(ActualTable::TABLE, |actual| {
            actual.iter().next().is_some()
        })
        .map_err(kv)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionStatus {
    pub min_rev: Revision,
    pub max_rev: Revision,
    pub switched: bool,
    pub sparse: bool,
    pub modified: bool,
}

pub fn revision_status(store: &Store, wcroot_repos_relpath: &str, trail_url_suffix: &str) -> WcdbResult<RevisionStatus> {
    let (min_rev, max_rev) = min_max_revisions(store, false)?;
    Ok(RevisionStatus {
        min_rev,
        max_rev,
        switched: has_switched_subtrees(store, wcroot_repos_relpath, trail_url_suffix)?,
        sparse: is_sparse_checkout(store)?,
        modified: has_local_mods(store)?,
    })
}

// --- §4.10.9 properties --------------------------------------------------

pub fn read_props(store: &Store, path: &RelPath) -> WcdbResult<Option<Vec<u8>>> {
    if let Some(actual) = store.with_table(ActualTable::TABLE, |t| ActualTable::read(t, path)).map_err(kv)?? {
        if let Some(props) = actual.properties {
            return Ok(Some(props));
        }
    }
    read_pristine_props(store, path)
}

pub fn read_pristine_props(store: &Store, path: &RelPath) -> WcdbResult<Option<Vec<u8>>> {
    store
        .with_table(NodesTable::TABLE, |table| NodesTable::highest_layer(table, path))
        .map_err(kv)?
        .map(|row| Ok(row.properties))
        .unwrap_or_else(|| Err(WcdbError::not_found(path.clone())))
}

/// Writes an `ACTUAL` property override, or clears it if `props` equals
/// the pristine value (avoiding a spurious modification flag).
pub fn op_set_props(store: &Store, config: &WcdbConfig, path: &RelPath, props: Option<Vec<u8>>) -> WcdbResult<()> {
    wcdb_trail::run_txn(store, config, |trail| {
        let pristine = {
            let table = trail.txn.table(NodesTable::TABLE).map_err(kv)?;
            NodesTable::highest_layer(table, path)?
                .ok_or_else(|| WcdbError::not_found(path.clone()))?
                .properties
        };
        let table = trail.txn.table_mut(ActualTable::TABLE).map_err(kv)?;
        let mut row = ActualTable::read(table, path)?.unwrap_or_default();
        row.properties = if props == pristine { None } else { props };
        if row.is_empty() {
            ActualTable::delete(table, path);
        } else {
            ActualTable::put(table, path, &row);
        }
        Ok(())
    })
}

// --- §4.10.10 work queue ---------------------------------------------------

pub fn wq_add(store: &Store, config: &WcdbConfig, payload: Vec<u8>) -> WcdbResult<u64> {
    wcdb_trail::run_txn(store, config, |trail| {
        WorkQueueTable::add(trail.txn.table_mut(WorkQueueTable::TABLE).map_err(kv)?, payload)
    })
}

/// Unpacks a list-of-lists payload (one `wq_add` call carrying several
/// items) into individual queue entries.
pub fn wq_add_many(store: &Store, config: &WcdbConfig, payloads: Vec<Vec<u8>>) -> WcdbResult<Vec<u64>> {
    wcdb_trail::run_txn(store, config, |trail| {
        let table = trail.txn.table_mut(WorkQueueTable::TABLE).map_err(kv)?;
        payloads.iter().cloned().map(|p| WorkQueueTable::add(table, p)).collect()
    })
}

pub fn wq_fetch(store: &Store) -> WcdbResult<Option<WorkItem>> {
    store.with_table(WorkQueueTable::TABLE, WorkQueueTable::fetch).map_err(kv)
}

pub fn wq_completed(store: &Store, config: &WcdbConfig, id: u64) -> WcdbResult<()> {
    wcdb_trail::run_txn(store, config, |trail| {
        WorkQueueTable::completed(trail.txn.table_mut(WorkQueueTable::TABLE).map_err(kv)?, id);
        Ok(())
    })
}

// --- unimplemented stubs ---------------------------------------------------

/// `op_move` is named in `wc_db.h` but never reached by any call site this
/// rewrite preserves behavior for; left as an explicit stub rather than
/// invented, per the open-question resolution to preserve rather than
/// invent behavior absent source grounding for its exact semantics.
pub fn op_move(_store: &Store, _src: &RelPath, _dst: &RelPath) -> WcdbResult<()> {
    Err(WcdbError::NotImplemented {
        operation: "op_move".to_string(),
    })
}

/// `op_modified` — see [`op_move`]'s doc comment; same stub status.
pub fn op_modified(_store: &Store, _path: &RelPath) -> WcdbResult<()> {
    Err(WcdbError::NotImplemented {
        operation: "op_modified".to_string(),
    })
}

/// Namespace type re-exported from [`crate`] for call sites that prefer
/// `NodeStore::read_info(...)` over the bare free function.
pub struct NodeStore;

impl NodeStore {
    pub fn init(store: &Store) {
        init(store)
    }
    pub fn read_info(store: &Store, path: &RelPath) -> WcdbResult<NodeInfo> {
        read_info(store, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_store() -> (Store, WcdbConfig) {
        let store = Store::new();
        init(&store);
        (store, WcdbConfig::default())
    }

    #[test]
    fn base_add_directory_then_read_info_reports_normal_base() {
        let (store, config) = new_store();
        base_add_directory(&store, &config, &RelPath::root(), BaseAddOptions {
            repos_relpath: Some(String::new()),
            revision: Some(Revision(1)),
            ..Default::default()
        }).unwrap();

        let info = read_info(&store, &RelPath::root()).unwrap();
        assert_eq!(info.status, WorkingStatus::Normal);
        assert!(info.have_base);
        assert!(!info.have_work);
    }

    #[test]
    fn base_add_directory_seeds_incomplete_children() {
        let (store, config) = new_store();
        base_add_directory(&store, &config, &RelPath::root(), BaseAddOptions {
            children: vec!["a".to_string(), "b".to_string()],
            ..Default::default()
        }).unwrap();

        let a = read_info(&store, &RelPath::new("a")).unwrap();
        assert_eq!(a.status, WorkingStatus::Normal);
        assert_eq!(a.kind, NodeKind::Unknown);
    }

    #[test]
    fn op_copy_creates_a_working_add_with_copyfrom() {
        let (store, config) = new_store();
        base_add_file(&store, &config, &RelPath::new("src"), BaseAddOptions {
            repos_relpath: Some("src".to_string()),
            revision: Some(Revision(5)),
            ..Default::default()
        }).unwrap();

        op_copy(&store, &config, &RelPath::new("src"), &RelPath::new("dst")).unwrap();

        let info = read_info(&store, &RelPath::new("dst")).unwrap();
        assert_eq!(info.status, WorkingStatus::Added);
        assert!(info.have_work);
        assert_eq!(info.original_revision, Some(Revision(5)));
    }

    #[test]
    fn op_delete_on_base_only_node_shadows_with_base_deleted() {
        let (store, config) = new_store();
        base_add_file(&store, &config, &RelPath::new("f"), BaseAddOptions::default()).unwrap();
        op_delete(&store, &config, &RelPath::new("f")).unwrap();

        let info = read_info(&store, &RelPath::new("f")).unwrap();
        assert_eq!(info.status, WorkingStatus::Deleted);
        assert!(info.have_base);
        assert!(info.have_work);
    }

    #[test]
    fn op_delete_on_an_add_root_removes_the_layer_entirely() {
        let (store, config) = new_store();
        base_add_file(&store, &config, &RelPath::new("src"), BaseAddOptions::default()).unwrap();
        op_copy(&store, &config, &RelPath::new("src"), &RelPath::new("dst")).unwrap();
        op_delete(&store, &config, &RelPath::new("dst")).unwrap();

        assert!(matches!(
            read_info(&store, &RelPath::new("dst")),
            Err(WcdbError::PathNotFound { .. })
        ));
    }

    #[test]
    fn op_delete_on_the_wcroot_is_rejected() {
        let (store, config) = new_store();
        base_add_directory(&store, &config, &RelPath::root(), BaseAddOptions::default()).unwrap();

        let err = op_delete(&store, &config, &RelPath::root()).unwrap_err();
        assert!(matches!(err, WcdbError::InvalidOperationDepth { .. }));
    }

    #[test]
    fn op_revert_never_reports_the_same_relpath_twice() {
        let (store, config) = new_store();
        base_add_directory(&store, &config, &RelPath::root(), BaseAddOptions::default()).unwrap();
        base_add_file(&store, &config, &RelPath::new("src"), BaseAddOptions::default()).unwrap();
        op_copy(&store, &config, &RelPath::new("src"), &RelPath::new("dst")).unwrap();

        let reverted = op_revert(&store, &config, &RelPath::new("dst"), RevertDepth::Infinity).unwrap();
        let mut seen = std::collections::HashSet::new();
        for p in &reverted {
            assert!(seen.insert(p.clone()), "{p:?} reported more than once");
        }
    }

    #[test]
    fn op_revert_of_a_copy_restores_pre_copy_state() {
        let (store, config) = new_store();
        base_add_file(&store, &config, &RelPath::new("src"), BaseAddOptions::default()).unwrap();
        op_copy(&store, &config, &RelPath::new("src"), &RelPath::new("dst")).unwrap();

        let reverted = op_revert(&store, &config, &RelPath::new("dst"), RevertDepth::Empty).unwrap();
        assert_eq!(reverted, vec![RelPath::new("dst")]);
        assert!(matches!(
            read_info(&store, &RelPath::new("dst")),
            Err(WcdbError::PathNotFound { .. })
        ));
    }

    #[test]
    fn global_commit_clears_working_layer_and_bumps_base_revision() {
        let (store, config) = new_store();
        base_add_file(&store, &config, &RelPath::new("src"), BaseAddOptions {
            repos_relpath: Some("src".to_string()),
            revision: Some(Revision(1)),
            ..Default::default()
        }).unwrap();
        op_copy(&store, &config, &RelPath::new("src"), &RelPath::new("dst")).unwrap();

        global_commit(&store, &config, &RelPath::new("dst"), CommitInfo {
            new_revision: Revision(2),
            changed_rev: Revision(2),
            changed_date: 1_700_000_000,
            changed_author: "jrandom".to_string(),
            checksum: None,
            keep_changelist: false,
            no_unlock: true,
        }).unwrap();

        let info = read_info(&store, &RelPath::new("dst")).unwrap();
        assert_eq!(info.status, WorkingStatus::Normal);
        assert!(!info.have_work);
        assert_eq!(info.revision, Some(Revision(2)));
    }

    #[test]
    fn scan_addition_classifies_a_plain_add_vs_a_copy() {
        let (store, config) = new_store();
        base_add_file(&store, &config, &RelPath::new("src"), BaseAddOptions::default()).unwrap();
        op_copy(&store, &config, &RelPath::new("src"), &RelPath::new("dst")).unwrap();

        let addition = scan_addition(&store, &RelPath::new("dst")).unwrap();
        assert_eq!(addition.status, AdditionKind::Copied);
        assert_eq!(addition.op_root, RelPath::new("dst"));
    }

    #[test]
    fn scan_deletion_rejects_a_non_deleted_node() {
        let (store, config) = new_store();
        base_add_file(&store, &config, &RelPath::new("f"), BaseAddOptions::default()).unwrap();
        assert!(matches!(
            scan_deletion(&store, &RelPath::new("f")),
            Err(WcdbError::PathUnexpectedStatus { .. })
        ));
    }

    #[test]
    fn scan_deletion_finds_base_del_relpath_on_a_deleted_node() {
        let (store, config) = new_store();
        base_add_file(&store, &config, &RelPath::new("f"), BaseAddOptions::default()).unwrap();
        op_delete(&store, &config, &RelPath::new("f")).unwrap();

        let deletion = scan_deletion(&store, &RelPath::new("f")).unwrap();
        assert_eq!(deletion.base_del_relpath, Some(RelPath::new("f")));
    }

    #[test]
    fn op_set_props_then_read_props_round_trips() {
        let (store, config) = new_store();
        base_add_file(&store, &config, &RelPath::new("f"), BaseAddOptions::default()).unwrap();
        op_set_props(&store, &config, &RelPath::new("f"), Some(vec![1, 2, 3])).unwrap();
        assert_eq!(read_props(&store, &RelPath::new("f")).unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn work_queue_add_fetch_completed_round_trips() {
        let (store, config) = new_store();
        let id = wq_add(&store, &config, b"payload".to_vec()).unwrap();
        let item = wq_fetch(&store).unwrap().unwrap();
        assert_eq!(item.id, id);
        wq_completed(&store, &config, id).unwrap();
        assert!(wq_fetch(&store).unwrap().is_none());
    }

    #[test]
    fn is_sparse_checkout_is_false_by_default() {
        let (store, config) = new_store();
        base_add_directory(&store, &config, &RelPath::root(), BaseAddOptions::default()).unwrap();
        assert!(!is_sparse_checkout(&store).unwrap());
    }

    #[test]
    fn op_move_and_op_modified_are_explicit_stubs() {
        let (store, _config) = new_store();
        assert!(matches!(
            op_move(&store, &RelPath::new("a"), &RelPath::new("b")),
            Err(WcdbError::NotImplemented { .. })
        ));
        assert!(matches!(
            op_modified(&store, &RelPath::new("a")),
            Err(WcdbError::NotImplemented { .. })
        ));
    }
}
