//! Diff Assembler (§4.5): turns match lists into hunk sequences, and
//! merges two two-way diffs against a shared original into a three-way
//! (`diff3`-style) hunk sequence with conflict detection.

use std::collections::VecDeque;

use crate::lcs::core_lcs;
use crate::types::{DiffOpKind, Hunk, Match, Range};

/// Assembles a two-way hunk sequence covering the full `[0, original_len)`
/// and `[0, modified_len)` ranges from a match list between them.
///
/// `want_common` mirrors `svn_diff__diff`'s flag of the same name: when
/// false, matching runs are absorbed into surrounding gaps rather than
/// emitted as their own [`DiffOpKind::Common`] hunks (callers that only
/// want to see changes use this to skip unchanged context).
pub fn assemble_two_way(
    matches: &[Match],
    original_len: u64,
    modified_len: u64,
    want_common: bool,
) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut o_pos = 0u64;
    let mut m_pos = 0u64;

    for m in matches {
        if m.pos1 > o_pos || m.pos2 > m_pos {
            hunks.push(Hunk {
                kind: DiffOpKind::Modified,
                original: Range {
                    start: o_pos,
                    length: m.pos1 - o_pos,
                },
                modified: Range {
                    start: m_pos,
                    length: m.pos2 - m_pos,
                },
                latest: Range::default(),
                resolved_diff: None,
            });
        }
        if want_common && m.length > 0 {
            hunks.push(Hunk {
                kind: DiffOpKind::Common,
                original: Range {
                    start: m.pos1,
                    length: m.length,
                },
                modified: Range {
                    start: m.pos2,
                    length: m.length,
                },
                latest: Range::default(),
                resolved_diff: None,
            });
        }
        o_pos = m.pos1 + m.length;
        m_pos = m.pos2 + m.length;
    }

    if o_pos < original_len || m_pos < modified_len {
        hunks.push(Hunk {
            kind: DiffOpKind::Modified,
            original: Range {
                start: o_pos,
                length: original_len - o_pos,
            },
            modified: Range {
                start: m_pos,
                length: modified_len - m_pos,
            },
            latest: Range::default(),
            resolved_diff: None,
        });
    }

    hunks
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Piece {
    orig_start: u64,
    orig_len: u64,
    other_start: u64,
    other_len: u64,
    is_common: bool,
}

impl Piece {
    fn orig_end(&self) -> u64 {
        self.orig_start + self.orig_len
    }
    fn other_end(&self) -> u64 {
        self.other_start + self.other_len
    }

    /// Splits off the first `len` original tokens of a *common* piece,
    /// returning (head, remainder). Only valid on common pieces, where
    /// the original and other streams advance in lockstep.
    fn split_common(&self, len: u64) -> (Piece, Piece) {
        debug_assert!(self.is_common);
        debug_assert!(len <= self.orig_len);
        let head = Piece {
            orig_start: self.orig_start,
            orig_len: len,
            other_start: self.other_start,
            other_len: len,
            is_common: true,
        };
        let rest = Piece {
            orig_start: self.orig_start + len,
            orig_len: self.orig_len - len,
            other_start: self.other_start + len,
            other_len: self.orig_len - len,
            is_common: true,
        };
        (head, rest)
    }
}

fn to_pieces(hunks: &[Hunk]) -> VecDeque<Piece> {
    hunks
        .iter()
        .map(|h| Piece {
            orig_start: h.original.start,
            orig_len: h.original.length,
            other_start: h.modified.start,
            other_len: h.modified.length,
            is_common: h.kind == DiffOpKind::Common,
        })
        .collect()
}

/// The smallest original-stream offset `>= target` that both `d1` and
/// `d2` can be cleanly cut at, without mutating either queue. A cut
/// inside a common piece is always valid (original and other advance
/// together); a cut inside a non-common (atomic) piece is not, so the
/// target grows to that piece's end and the search repeats.
fn resolve_cut(d1: &VecDeque<Piece>, d2: &VecDeque<Piece>, mut target: u64) -> u64 {
    loop {
        let t1 = natural_cut_at_least(d1, target);
        let t2 = natural_cut_at_least(d2, target);
        let next = t1.max(t2);
        if next == target {
            return target;
        }
        target = next;
    }
}

fn natural_cut_at_least(queue: &VecDeque<Piece>, target: u64) -> u64 {
    for piece in queue {
        if target <= piece.orig_start {
            return target;
        }
        if target < piece.orig_end() {
            return if piece.is_common { target } else { piece.orig_end() };
        }
    }
    target
}

/// Pops/splits pieces off the front of `queue` until exactly `end` original
/// offset is reached. `end` must already be a valid cut point (typically
/// the output of [`resolve_cut`]).
fn take_until(queue: &mut VecDeque<Piece>, end: u64) -> Vec<Piece> {
    let mut out = Vec::new();
    while let Some(front) = queue.front().copied() {
        if front.orig_start >= end {
            break;
        }
        if front.orig_end() <= end {
            out.push(front);
            queue.pop_front();
        } else {
            debug_assert!(front.is_common);
            let (head, rest) = front.split_common(end - front.orig_start);
            out.push(head);
            *queue.front_mut().unwrap() = rest;
        }
    }
    out
}

fn pieces_span(pieces: &[Piece]) -> Range {
    match (pieces.first(), pieces.last()) {
        (Some(first), Some(last)) => Range {
            start: first.other_start,
            length: last.other_end() - first.other_start,
        },
        _ => Range::default(),
    }
}

/// Merges two two-way hunk sequences — one for original-vs-modified, one
/// for original-vs-latest — into a three-way diff, classifying each
/// merged segment as common, changed-on-one-side, identically changed on
/// both (`diff-common`), or genuinely conflicting.
pub fn assemble_three_way<T: PartialEq>(
    original_to_modified: &[Hunk],
    original_to_latest: &[Hunk],
    modified_tokens: &[T],
    latest_tokens: &[T],
) -> Vec<Hunk> {
    let mut d1 = to_pieces(original_to_modified);
    let mut d2 = to_pieces(original_to_latest);
    let mut hunks = Vec::new();
    let mut o = 0u64;

    while !d1.is_empty() || !d2.is_empty() {
        let next1 = d1.front().map(|p| p.orig_end());
        let next2 = d2.front().map(|p| p.orig_end());
        let target = match (next1, next2) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => break,
        };
        let end = resolve_cut(&d1, &d2, target);

        let pieces_m = take_until(&mut d1, end);
        let pieces_l = take_until(&mut d2, end);

        let orig_range = Range {
            start: o,
            length: end - o,
        };
        let all_common_m = pieces_m.iter().all(|p| p.is_common);
        let all_common_l = pieces_l.iter().all(|p| p.is_common);
        let modified_range = pieces_span(&pieces_m);
        let latest_range = pieces_span(&pieces_l);

        let hunk = if all_common_m && all_common_l {
            Hunk {
                kind: DiffOpKind::Common,
                original: orig_range,
                modified: modified_range,
                latest: latest_range,
                resolved_diff: None,
            }
        } else if all_common_m {
            Hunk {
                kind: DiffOpKind::Latest,
                original: orig_range,
                modified: modified_range,
                latest: latest_range,
                resolved_diff: None,
            }
        } else if all_common_l {
            Hunk {
                kind: DiffOpKind::Modified,
                original: orig_range,
                modified: modified_range,
                latest: latest_range,
                resolved_diff: None,
            }
        } else {
            let modified_slice =
                &modified_tokens[modified_range.start as usize..modified_range.end() as usize];
            let latest_slice =
                &latest_tokens[latest_range.start as usize..latest_range.end() as usize];
            if modified_slice == latest_slice {
                Hunk {
                    kind: DiffOpKind::DiffCommon,
                    original: orig_range,
                    modified: modified_range,
                    latest: latest_range,
                    resolved_diff: None,
                }
            } else {
                let resolved_diff = resolve_conflict(modified_slice, latest_slice);
                Hunk {
                    kind: DiffOpKind::Conflict,
                    original: orig_range,
                    modified: modified_range,
                    latest: latest_range,
                    resolved_diff,
                }
            }
        };
        hunks.push(hunk);
        o = end;
    }

    hunks
}

/// Attempts to resolve a conflict by re-diffing the conflicting
/// modified/latest sub-streams against each other. If a full-length LCS
/// run covers both sides completely — they are the same sequence of
/// tokens once compared directly, e.g. after a pure reordering — the
/// resolution is a single common sub-hunk; otherwise the conflict stands
/// and `None` is returned (§4.5 `resolve_conflict`).
pub fn resolve_conflict<T: PartialEq>(modified: &[T], latest: &[T]) -> Option<Vec<Hunk>> {
    let matches = core_lcs(modified, latest);
    let covered: u64 = matches.iter().map(|m| m.length).sum();
    if covered as usize == modified.len() && covered as usize == latest.len() {
        Some(vec![Hunk {
            kind: DiffOpKind::Common,
            original: Range::default(),
            modified: Range {
                start: 0,
                length: modified.len() as u64,
            },
            latest: Range {
                start: 0,
                length: latest.len() as u64,
            },
            resolved_diff: None,
        }])
    } else {
        None
    }
}
