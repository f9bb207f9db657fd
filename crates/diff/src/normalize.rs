//! Whitespace Normalizer (§4.6): an in-place Mealy machine that canonicalizes
//! a byte buffer under a set of ignore options before diffing.
//!
//! Grounded on `diff.h`'s `svn_diff__normalize_state_t` (states `normal`,
//! `diff_state_whitespace`, `diff_state_cr`, shortened here to
//! [`NormalizeState::Normal`]/[`Whitespace`](NormalizeState::Whitespace)/
//! [`Cr`](NormalizeState::Cr)) and the normalization loop in the same file
//! that canonicalizes EOL markers and collapses runs of whitespace while
//! streaming tokens for the diff engine.

/// State carried across successive calls to [`normalize_buffer`] so a large
/// input can be normalized in chunks without losing machine state at chunk
/// boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizeState {
    /// No pending whitespace or carriage-return run.
    #[default]
    Normal,
    /// Inside a run of whitespace collapsed under `ignore_space_change` or
    /// `ignore_all_space`.
    Whitespace,
    /// Just consumed a `\r`, deciding whether it starts a `\r\n` pair under
    /// `ignore_eol_style`.
    Cr,
}

/// Ignore-option flags controlling how [`normalize_buffer`] canonicalizes
/// its input. Mirrors the independent option bits the source threads through
/// its token-read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizeOptions {
    /// Canonicalize all EOL styles (`\r\n`, `\r`, `\n`) to a single `\n`.
    pub ignore_eol_style: bool,
    /// Collapse any run of one-or-more whitespace bytes to a single space.
    pub ignore_space_change: bool,
    /// Drop whitespace bytes entirely (implies `ignore_space_change`'s
    /// collapsing behavior, but emits nothing instead of one space).
    pub ignore_all_space: bool,
}

fn is_space(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Normalizes `src` into `tgt` under `opts`, threading `state` across calls.
///
/// `tgt` may alias `src` (the common case is normalizing a buffer in place):
/// this function writes strictly left-to-right and never reads a source byte
/// after having written to its position, so `tgt == src` is safe even though
/// the written length can be shorter than the source length. Returns the
/// number of bytes written into `tgt`.
///
/// Deterministic and total over any byte sequence. Idempotent: normalizing
/// already-normalized output again, starting from [`NormalizeState::Normal`]
/// with the same options, reproduces the same bytes.
pub fn normalize_buffer(
    tgt: &mut [u8],
    state: &mut NormalizeState,
    src: &[u8],
    opts: NormalizeOptions,
) -> usize {
    assert!(
        tgt.len() >= src.len(),
        "normalize_buffer: tgt must be at least as long as src"
    );

    let collapse_space = opts.ignore_space_change || opts.ignore_all_space;
    let mut out = 0usize;

    for &b in src {
        match *state {
            NormalizeState::Cr => {
                *state = NormalizeState::Normal;
                if b == b'\n' {
                    if opts.ignore_eol_style {
                        tgt[out] = b'\n';
                        out += 1;
                    } else {
                        tgt[out] = b'\r';
                        tgt[out + 1] = b'\n';
                        out += 2;
                    }
                    continue;
                }
                // Lone `\r` not followed by `\n`: emit the canonical or
                // literal `\r` for the previous byte, then fall through to
                // process `b` from `Normal` state.
                if opts.ignore_eol_style {
                    tgt[out] = b'\n';
                    out += 1;
                } else {
                    tgt[out] = b'\r';
                    out += 1;
                }
                out = process_normal(tgt, out, state, b, opts, collapse_space);
            }
            NormalizeState::Whitespace => {
                if is_space(b) {
                    // Stay in Whitespace, continue collapsing; nothing to
                    // emit under either collapsing option.
                    continue;
                }
                *state = NormalizeState::Normal;
                out = process_normal(tgt, out, state, b, opts, collapse_space);
            }
            NormalizeState::Normal => {
                out = process_normal(tgt, out, state, b, opts, collapse_space);
            }
        }
    }

    out
}

/// Processes one byte while `*state` is (or is about to become) `Normal`,
/// dispatching into `Cr`/`Whitespace` as needed. Returns the new `out`
/// cursor.
fn process_normal(
    tgt: &mut [u8],
    mut out: usize,
    state: &mut NormalizeState,
    b: u8,
    opts: NormalizeOptions,
    collapse_space: bool,
) -> usize {
    if b == b'\r' {
        *state = NormalizeState::Cr;
        return out;
    }
    if b == b'\n' {
        tgt[out] = b'\n';
        out += 1;
        return out;
    }
    if collapse_space && is_space(b) {
        *state = NormalizeState::Whitespace;
        if opts.ignore_space_change {
            tgt[out] = b' ';
            out += 1;
        }
        // ignore_all_space: emit nothing.
        return out;
    }
    tgt[out] = b;
    out += 1;
    out
}
