//! Plain Rust structs mirroring the `NODES`/`ACTUAL_NODE`/`WORK_QUEUE`
//! schema (§6.2), skel-encoded for storage the same way
//! `wcdb-tables::reps::Representation` encodes representation rows —
//! the SQL schema text itself is not reproduced, only its semantic
//! shape.

use wcdb_core::error::{WcdbError, WcdbResult};
use wcdb_core::skel::{self, Skel};
use wcdb_core::types::{NodeKind, OpDepth, Presence, ReposId, Revision, Sha1Checksum, SvnDepth, WcId};

/// One `NODES` row: a single `(local_relpath, op_depth)` layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRow {
    pub op_depth: OpDepth,
    pub presence: Presence,
    pub kind: NodeKind,
    pub repos_id: Option<ReposId>,
    pub repos_path: Option<String>,
    pub revision: Option<Revision>,
    pub depth: Option<SvnDepth>,
    pub checksum: Option<Sha1Checksum>,
    pub changed_rev: Option<Revision>,
    pub changed_date: Option<i64>,
    pub changed_author: Option<String>,
    pub moved_here: bool,
    pub original_repos_id: Option<ReposId>,
    pub original_repos_path: Option<String>,
    pub original_revision: Option<Revision>,
    /// Pristine (WORKING/BASE) properties, as opaque serialized bytes.
    /// `read_pristine_props` returns this directly; `read_props` prefers
    /// an `ACTUAL` override over it (§4.10.9).
    pub properties: Option<Vec<u8>>,
}

impl NodeRow {
    /// A bare op-root row for `base_add_*`/`op_copy` call sites that fill
    /// in the rest via struct-update syntax.
    pub fn new(op_depth: OpDepth, presence: Presence, kind: NodeKind) -> Self {
        NodeRow {
            op_depth,
            presence,
            kind,
            repos_id: None,
            repos_path: None,
            revision: None,
            depth: None,
            checksum: None,
            changed_rev: None,
            changed_date: None,
            changed_author: None,
            moved_here: false,
            original_repos_id: None,
            original_repos_path: None,
            original_revision: None,
            properties: None,
        }
    }

    pub fn has_copyfrom(&self) -> bool {
        self.original_repos_path.is_some()
    }

    pub(crate) fn to_skel(&self) -> Skel {
        Skel::list(vec![
            Skel::str_atom(self.op_depth.0.to_string()),
            presence_to_skel(self.presence),
            kind_to_skel(self.kind),
            opt_i64_to_skel(self.repos_id.map(|r| r.0)),
            opt_str_to_skel(self.repos_path.as_deref()),
            opt_u64_to_skel(self.revision.map(|r| r.0)),
            opt_depth_to_skel(self.depth),
            opt_str_to_skel(self.checksum.as_ref().map(|c| c.to_hex()).as_deref()),
            opt_u64_to_skel(self.changed_rev.map(|r| r.0)),
            opt_i64_to_skel(self.changed_date),
            opt_str_to_skel(self.changed_author.as_deref()),
            bool_to_skel(self.moved_here),
            opt_i64_to_skel(self.original_repos_id.map(|r| r.0)),
            opt_str_to_skel(self.original_repos_path.as_deref()),
            opt_u64_to_skel(self.original_revision.map(|r| r.0)),
            opt_bytes_to_skel(self.properties.as_deref()),
        ])
    }

    pub(crate) fn from_skel(s: &Skel) -> WcdbResult<Self> {
        let items = s
            .as_list()
            .ok_or_else(|| WcdbError::corrupt("node row skel is not a list"))?;
        if items.len() != 16 {
            return Err(WcdbError::corrupt("node row skel has wrong field count"));
        }
        let op_depth = OpDepth(
            items[0]
                .as_str_atom()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| WcdbError::corrupt("bad op_depth"))?,
        );
        Ok(NodeRow {
            op_depth,
            presence: presence_from_skel(&items[1])?,
            kind: kind_from_skel(&items[2])?,
            repos_id: opt_i64_from_skel(&items[3])?.map(ReposId),
            repos_path: opt_str_from_skel(&items[4])?,
            revision: opt_u64_from_skel(&items[5])?.map(Revision),
            depth: opt_depth_from_skel(&items[6])?,
            checksum: opt_str_from_skel(&items[7])?
                .map(|hex| sha1_from_hex(&hex))
                .transpose()?,
            changed_rev: opt_u64_from_skel(&items[8])?.map(Revision),
            changed_date: opt_i64_from_skel(&items[9])?,
            changed_author: opt_str_from_skel(&items[10])?,
            moved_here: bool_from_skel(&items[11])?,
            original_repos_id: opt_i64_from_skel(&items[12])?.map(ReposId),
            original_repos_path: opt_str_from_skel(&items[13])?,
            original_revision: opt_u64_from_skel(&items[14])?.map(Revision),
            properties: opt_bytes_from_skel(&items[15])?,
        })
    }
}

/// One `ACTUAL_NODE` row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActualRow {
    pub properties: Option<Vec<u8>>,
    pub changelist: Option<String>,
    pub conflict_old: Option<String>,
    pub conflict_new: Option<String>,
    pub conflict_working: Option<String>,
    pub tree_conflict_data: Option<String>,
}

impl ActualRow {
    pub fn is_conflicted(&self) -> bool {
        self.conflict_old.is_some() || self.tree_conflict_data.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self == &ActualRow::default()
    }

    pub(crate) fn to_skel(&self) -> Skel {
        Skel::list(vec![
            opt_bytes_to_skel(self.properties.as_deref()),
            opt_str_to_skel(self.changelist.as_deref()),
            opt_str_to_skel(self.conflict_old.as_deref()),
            opt_str_to_skel(self.conflict_new.as_deref()),
            opt_str_to_skel(self.conflict_working.as_deref()),
            opt_str_to_skel(self.tree_conflict_data.as_deref()),
        ])
    }

    pub(crate) fn from_skel(s: &Skel) -> WcdbResult<Self> {
        let items = s
            .as_list()
            .ok_or_else(|| WcdbError::corrupt("actual row skel is not a list"))?;
        if items.len() != 6 {
            return Err(WcdbError::corrupt("actual row skel has wrong field count"));
        }
        Ok(ActualRow {
            properties: opt_bytes_from_skel(&items[0])?,
            changelist: opt_str_from_skel(&items[1])?,
            conflict_old: opt_str_from_skel(&items[2])?,
            conflict_new: opt_str_from_skel(&items[3])?,
            conflict_working: opt_str_from_skel(&items[4])?,
            tree_conflict_data: opt_str_from_skel(&items[5])?,
        })
    }
}

/// One `WORK_QUEUE` row: an opaque, ordered work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub id: u64,
    pub payload: Vec<u8>,
}

/// One `WC_LOCK` row (§6.2): the persisted half of a lock also recorded
/// in a process's in-memory `owned_locks` list. Keyed by
/// `local_dir_relpath` in [`crate::tables::WcLockTable`]; `wc_id` is
/// carried in the value rather than the key since one `WcLockTable`
/// always backs exactly one `WCROOT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WcLockRow {
    pub wc_id: WcId,
    pub locked_levels: i32,
}

impl WcLockRow {
    pub(crate) fn to_skel(&self) -> Skel {
        Skel::list(vec![
            Skel::str_atom(self.wc_id.0.to_string()),
            Skel::str_atom(self.locked_levels.to_string()),
        ])
    }

    pub(crate) fn from_skel(s: &Skel) -> WcdbResult<Self> {
        let items = s
            .as_list()
            .ok_or_else(|| WcdbError::corrupt("wc_lock row skel is not a list"))?;
        if items.len() != 2 {
            return Err(WcdbError::corrupt("wc_lock row skel has wrong field count"));
        }
        let wc_id = items[0]
            .as_str_atom()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| WcdbError::corrupt("bad wc_id"))?;
        let locked_levels = items[1]
            .as_str_atom()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| WcdbError::corrupt("bad locked_levels"))?;
        Ok(WcLockRow {
            wc_id: WcId(wc_id),
            locked_levels,
        })
    }
}

// --- skel helpers -----------------------------------------------------

const NONE_TAG: &str = "\u{1}none";

fn presence_to_skel(p: Presence) -> Skel {
    let s = match p {
        Presence::Normal => "normal",
        Presence::NotPresent => "not-present",
        Presence::Absent => "absent",
        Presence::Excluded => "excluded",
        Presence::Incomplete => "incomplete",
        Presence::BaseDeleted => "base-deleted",
    };
    Skel::str_atom(s)
}

fn presence_from_skel(s: &Skel) -> WcdbResult<Presence> {
    match s.as_str_atom() {
        Some("normal") => Ok(Presence::Normal),
        Some("not-present") => Ok(Presence::NotPresent),
        Some("absent") => Ok(Presence::Absent),
        Some("excluded") => Ok(Presence::Excluded),
        Some("incomplete") => Ok(Presence::Incomplete),
        Some("base-deleted") => Ok(Presence::BaseDeleted),
        _ => Err(WcdbError::corrupt("unknown presence atom")),
    }
}

fn kind_to_skel(k: NodeKind) -> Skel {
    let s = match k {
        NodeKind::File => "file",
        NodeKind::Dir => "dir",
        NodeKind::Symlink => "symlink",
        NodeKind::Unknown => "unknown",
    };
    Skel::str_atom(s)
}

fn kind_from_skel(s: &Skel) -> WcdbResult<NodeKind> {
    match s.as_str_atom() {
        Some("file") => Ok(NodeKind::File),
        Some("dir") => Ok(NodeKind::Dir),
        Some("symlink") => Ok(NodeKind::Symlink),
        Some("unknown") => Ok(NodeKind::Unknown),
        _ => Err(WcdbError::corrupt("unknown kind atom")),
    }
}

fn depth_to_skel(d: SvnDepth) -> Skel {
    let s = match d {
        SvnDepth::Empty => "empty",
        SvnDepth::Files => "files",
        SvnDepth::Immediates => "immediates",
        SvnDepth::Infinity => "infinity",
        SvnDepth::Exclude => "exclude",
        SvnDepth::Unknown => "unknown-depth",
    };
    Skel::str_atom(s)
}

fn depth_from_skel(s: &Skel) -> WcdbResult<SvnDepth> {
    match s.as_str_atom() {
        Some("empty") => Ok(SvnDepth::Empty),
        Some("files") => Ok(SvnDepth::Files),
        Some("immediates") => Ok(SvnDepth::Immediates),
        Some("infinity") => Ok(SvnDepth::Infinity),
        Some("exclude") => Ok(SvnDepth::Exclude),
        Some("unknown-depth") => Ok(SvnDepth::Unknown),
        _ => Err(WcdbError::corrupt("unknown depth atom")),
    }
}

fn opt_depth_to_skel(d: Option<SvnDepth>) -> Skel {
    match d {
        Some(d) => depth_to_skel(d),
        None => Skel::str_atom(NONE_TAG),
    }
}

fn opt_depth_from_skel(s: &Skel) -> WcdbResult<Option<SvnDepth>> {
    if s.as_str_atom() == Some(NONE_TAG) {
        Ok(None)
    } else {
        depth_from_skel(s).map(Some)
    }
}

fn bool_to_skel(b: bool) -> Skel {
    Skel::str_atom(if b { "t" } else { "f" })
}

fn bool_from_skel(s: &Skel) -> WcdbResult<bool> {
    match s.as_str_atom() {
        Some("t") => Ok(true),
        Some("f") => Ok(false),
        _ => Err(WcdbError::corrupt("expected boolean atom")),
    }
}

fn opt_str_to_skel(s: Option<&str>) -> Skel {
    match s {
        Some(s) => Skel::list(vec![Skel::str_atom("some"), Skel::atom(s.as_bytes().to_vec())]),
        None => Skel::str_atom(NONE_TAG),
    }
}

fn opt_str_from_skel(s: &Skel) -> WcdbResult<Option<String>> {
    if s.as_str_atom() == Some(NONE_TAG) {
        return Ok(None);
    }
    let items = s
        .as_list()
        .ok_or_else(|| WcdbError::corrupt("expected optional-string list"))?;
    let bytes = items
        .get(1)
        .and_then(Skel::as_atom)
        .ok_or_else(|| WcdbError::corrupt("optional-string missing payload"))?;
    Ok(Some(
        String::from_utf8(bytes.to_vec()).map_err(|_| WcdbError::corrupt("non-utf8 string field"))?,
    ))
}

fn opt_bytes_to_skel(b: Option<&[u8]>) -> Skel {
    match b {
        Some(b) => Skel::list(vec![Skel::str_atom("some"), Skel::atom(b.to_vec())]),
        None => Skel::str_atom(NONE_TAG),
    }
}

fn opt_bytes_from_skel(s: &Skel) -> WcdbResult<Option<Vec<u8>>> {
    if s.as_str_atom() == Some(NONE_TAG) {
        return Ok(None);
    }
    let items = s
        .as_list()
        .ok_or_else(|| WcdbError::corrupt("expected optional-bytes list"))?;
    let bytes = items
        .get(1)
        .and_then(Skel::as_atom)
        .ok_or_else(|| WcdbError::corrupt("optional-bytes missing payload"))?;
    Ok(Some(bytes.to_vec()))
}

fn opt_i64_to_skel(v: Option<i64>) -> Skel {
    match v {
        Some(v) => Skel::str_atom(v.to_string()),
        None => Skel::str_atom(NONE_TAG),
    }
}

fn opt_i64_from_skel(s: &Skel) -> WcdbResult<Option<i64>> {
    if s.as_str_atom() == Some(NONE_TAG) {
        return Ok(None);
    }
    s.as_str_atom()
        .and_then(|s| s.parse().ok())
        .map(Some)
        .ok_or_else(|| WcdbError::corrupt("expected i64 atom"))
}

fn opt_u64_to_skel(v: Option<u64>) -> Skel {
    match v {
        Some(v) => Skel::str_atom(v.to_string()),
        None => Skel::str_atom(NONE_TAG),
    }
}

fn opt_u64_from_skel(s: &Skel) -> WcdbResult<Option<u64>> {
    if s.as_str_atom() == Some(NONE_TAG) {
        return Ok(None);
    }
    s.as_str_atom()
        .and_then(|s| s.parse().ok())
        .map(Some)
        .ok_or_else(|| WcdbError::corrupt("expected u64 atom"))
}

fn sha1_from_hex(hex: &str) -> WcdbResult<Sha1Checksum> {
    if hex.len() != 40 {
        return Err(WcdbError::corrupt("sha1 hex field has wrong length"));
    }
    let mut bytes = [0u8; 20];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|_| WcdbError::corrupt("sha1 hex field is not valid hex"))?;
    }
    Ok(Sha1Checksum::from_bytes(bytes))
}
