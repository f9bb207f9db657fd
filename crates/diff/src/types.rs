//! Shared types for the LCS engine and diff assembler (§3.2/§3.3).

/// One run of consecutive matching tokens between two streams.
///
/// Grounded on `svn_diff__lcs_t`, minus its `refcount`/`next` fields —
/// the arena-based engine in [`crate::lcs`] returns a flat, already-ordered
/// `Vec<Match>` instead of a linked chain with manual reference counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Match {
    /// Start offset (0-based token index) in the first stream.
    pub pos1: u64,
    /// Start offset (0-based token index) in the second stream.
    pub pos2: u64,
    /// Number of consecutive matching tokens.
    pub length: u64,
}

/// A half-open `[start, start+length)` range into one token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    /// Start offset.
    pub start: u64,
    /// Number of tokens covered.
    pub length: u64,
}

impl Range {
    pub fn end(&self) -> u64 {
        self.start + self.length
    }
}

/// The kind of a diff hunk (`diff.h`'s `svn_diff__type_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DiffOpKind {
    /// Present, identical, in every stream being compared.
    Common = 0,
    /// Changed relative to the original in the "modified" stream only.
    Modified = 1,
    /// Changed relative to the original in the "latest" stream only.
    Latest = 2,
    /// Changed identically in both "modified" and "latest".
    DiffCommon = 3,
    /// Changed differently in "modified" and "latest".
    Conflict = 4,
}

/// A segment of a two- or three-way diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// What kind of segment this is.
    pub kind: DiffOpKind,
    /// Range into the original stream.
    pub original: Range,
    /// Range into the modified stream.
    pub modified: Range,
    /// Range into the latest stream (only meaningful for three-way diffs).
    pub latest: Range,
    /// For a [`DiffOpKind::Conflict`] hunk, a sub-diff produced by
    /// [`crate::assembler::resolve_conflict`] if the conflicting ranges
    /// turned out to fully align once re-diffed against each other.
    pub resolved_diff: Option<Vec<Hunk>>,
}
