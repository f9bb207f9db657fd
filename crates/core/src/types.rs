//! Shared identifiers and value types used across the working-copy engine.

use std::fmt;
use std::path::Path;

/// Identifies one working-copy database (one `wc.db`).
///
/// Corresponds to `WCROOT.id` / the `wc_id` column threaded through every
/// `NODES` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WcId(pub i64);

impl fmt::Display for WcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wc#{}", self.0)
    }
}

/// Identifies a repository row (`REPOSITORY.id`), unique per `root_url`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReposId(pub i64);

/// A revision number in a repository. `0` is the empty repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Revision(pub u64);

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// The layer a `NODES` row belongs to.
///
/// `0` is BASE; any positive value is a WORKING layer. A row is an
/// *op-root* iff its `op_depth` equals [`RelPath::depth`] of its own path —
/// see §3.7 invariant 4 and §9's "three-tree model via op_depth" note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpDepth(pub u32);

impl OpDepth {
    pub const BASE: OpDepth = OpDepth(0);

    pub fn is_base(self) -> bool {
        self.0 == 0
    }

    pub fn is_working(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for OpDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A path relative to a WCROOT, using `/` separators and no leading slash.
/// The empty string denotes the WCROOT itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RelPath(String);

impl RelPath {
    pub fn root() -> Self {
        RelPath(String::new())
    }

    /// Constructs a relpath, normalizing away empty segments and stray
    /// slashes. Does not resolve `..` — callers are expected to pass
    /// already-canonical segments (as `wc_db_pdh.c`'s resolver does).
    pub fn new(s: impl Into<String>) -> Self {
        let s = s.into();
        let normalized: Vec<&str> = s.split('/').filter(|seg| !seg.is_empty()).collect();
        RelPath(normalized.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// `relpath_depth` from §3.7/§4.10 — number of path segments. The root
    /// has depth 0.
    pub fn depth(&self) -> u32 {
        if self.is_root() {
            0
        } else {
            self.0.matches('/').count() as u32 + 1
        }
    }

    /// The op_depth a fresh op-root at this path would use.
    pub fn op_root_depth(&self) -> OpDepth {
        OpDepth(self.depth())
    }

    pub fn basename(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    pub fn parent(&self) -> Option<RelPath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(idx) => Some(RelPath(self.0[..idx].to_string())),
            None => Some(RelPath::root()),
        }
    }

    pub fn join(&self, child: &str) -> RelPath {
        if self.is_root() {
            RelPath::new(child)
        } else {
            RelPath::new(format!("{}/{}", self.0, child))
        }
    }

    /// True iff `self` is `ancestor` or a descendant of it.
    pub fn is_within(&self, ancestor: &RelPath) -> bool {
        if ancestor.is_root() {
            return true;
        }
        self.0 == ancestor.0 || self.0.starts_with(&format!("{}/", ancestor.0))
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "<wcroot>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<&str> for RelPath {
    fn from(s: &str) -> Self {
        RelPath::new(s)
    }
}

impl From<String> for RelPath {
    fn from(s: String) -> Self {
        RelPath::new(s)
    }
}

/// A SHA-1 content hash, stored as the lowercase hex string used directly
/// as the pristine on-disk filename (§4.7).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sha1Checksum([u8; 20]);

impl Sha1Checksum {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Sha1Checksum(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(40);
        for b in &self.0 {
            s.push_str(&format!("{:02x}", b));
        }
        s
    }

    /// The two leading hex characters used as the pristine subdirectory
    /// name, per `get_pristine_fname` in `wc_db_pristine.c`.
    pub fn hex_prefix(&self) -> String {
        format!("{:02x}", self.0[0])
    }
}

impl fmt::Display for Sha1Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// An MD5 content hash, retained only for the transitional MD5->SHA1
/// pristine lookup path (`svn_wc__db_pristine_get_path`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Md5Checksum([u8; 16]);

impl Md5Checksum {
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Md5Checksum(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

/// §3.6 `presence` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    Normal,
    NotPresent,
    Absent,
    Excluded,
    Incomplete,
    BaseDeleted,
}

/// §3.6 `kind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Dir,
    Symlink,
    Unknown,
}

/// §3.6 `depth` column, for directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SvnDepth {
    Empty,
    Files,
    Immediates,
    Infinity,
    Exclude,
    Unknown,
}

/// Working-copy status reported by `read_info` (§4.10.1) for a WORKING row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkingStatus {
    Added,
    Deleted,
    Incomplete,
    Excluded,
    /// A BASE row's raw presence, unmapped.
    Normal,
}
