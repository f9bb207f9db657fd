//! LCS diff engine (§4.4), diff assembler (§4.5), and whitespace normalizer
//! (§4.6): the in-memory token-stream comparison stack, grounded on
//! `libsvn_diff/{lcs.c,diff.h}`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assembler;
pub mod lcs;
pub mod normalize;
pub mod types;

pub use assembler::{assemble_three_way, assemble_two_way, resolve_conflict};
pub use lcs::{core_lcs, lcs as compute_lcs};
pub use normalize::{normalize_buffer, NormalizeOptions, NormalizeState};
pub use types::{DiffOpKind, Hunk, Match, Range};
