//! The skel codec — a small nested byte-list format used as the on-disk
//! value encoding for `representations` rows (§4.3/§4.4).
//!
//! A skel is either an **atom** (an opaque byte string) or a **list** of
//! skels. Two atom encodings exist on the wire:
//!
//! - *implicit-length*: a bare run of "name" bytes (ASCII alphanumerics,
//!   `-`, `_`, `.`, `:`), terminated by whitespace or a list delimiter.
//!   Used for short, human-readable tags like `fulltext`.
//! - *explicit-length*: `<decimal length> <space><raw bytes>`. Used for
//!   anything that isn't a valid bare name, including binary content.
//!
//! A list is `(` skel* `)`, with single spaces between siblings and no
//! space required before the closing paren.
//!
//! [`unparse`] always chooses the shortest faithful encoding for each atom
//! (bare name if possible, else explicit-length); [`parse`] accepts both.
//! `parse(unparse(x)) == x` for every `Skel` — see §8.2's round-trip law.

use crate::error::{WcdbError, WcdbResult};

/// A parsed skel value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skel {
    Atom(Vec<u8>),
    List(Vec<Skel>),
}

impl Skel {
    pub fn atom(bytes: impl Into<Vec<u8>>) -> Self {
        Skel::Atom(bytes.into())
    }

    pub fn str_atom(s: impl AsRef<str>) -> Self {
        Skel::Atom(s.as_ref().as_bytes().to_vec())
    }

    pub fn list(items: Vec<Skel>) -> Self {
        Skel::List(items)
    }

    pub fn as_atom(&self) -> Option<&[u8]> {
        match self {
            Skel::Atom(b) => Some(b),
            Skel::List(_) => None,
        }
    }

    pub fn as_str_atom(&self) -> Option<&str> {
        self.as_atom().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_list(&self) -> Option<&[Skel]> {
        match self {
            Skel::List(items) => Some(items),
            Skel::Atom(_) => None,
        }
    }
}

fn is_bare_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':')
}

fn can_be_bare(bytes: &[u8]) -> bool {
    !bytes.is_empty() && bytes.iter().all(|&b| is_bare_name_byte(b))
}

/// Serializes a skel to its on-disk byte form.
pub fn unparse(skel: &Skel) -> Vec<u8> {
    let mut out = Vec::new();
    unparse_into(skel, &mut out);
    out
}

fn unparse_into(skel: &Skel, out: &mut Vec<u8>) {
    match skel {
        Skel::Atom(bytes) => {
            if can_be_bare(bytes) {
                out.extend_from_slice(bytes);
            } else {
                out.extend_from_slice(bytes.len().to_string().as_bytes());
                out.push(b' ');
                out.extend_from_slice(bytes);
            }
        }
        Skel::List(items) => {
            out.push(b'(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                unparse_into(item, out);
            }
            out.push(b')');
        }
    }
}

/// Parses a skel from its on-disk byte form. Fails with
/// [`WcdbError::Corrupt`] on malformed input.
pub fn parse(input: &[u8]) -> WcdbResult<Skel> {
    let mut cursor = Cursor { buf: input, pos: 0 };
    let skel = parse_one(&mut cursor)?;
    cursor.skip_whitespace();
    if cursor.pos != cursor.buf.len() {
        return Err(WcdbError::corrupt("trailing bytes after skel"));
    }
    Ok(skel)
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r')) {
            self.pos += 1;
        }
    }
}

fn parse_one(cur: &mut Cursor) -> WcdbResult<Skel> {
    cur.skip_whitespace();
    match cur.peek() {
        None => Err(WcdbError::corrupt("unexpected end of skel input")),
        Some(b'(') => parse_list(cur),
        Some(b) if b.is_ascii_digit() => parse_explicit_atom(cur),
        Some(b) if is_bare_name_byte(b) => parse_bare_atom(cur),
        Some(b) => Err(WcdbError::corrupt(format!(
            "unexpected byte 0x{:02x} in skel",
            b
        ))),
    }
}

fn parse_list(cur: &mut Cursor) -> WcdbResult<Skel> {
    debug_assert_eq!(cur.peek(), Some(b'('));
    cur.pos += 1;
    let mut items = Vec::new();
    loop {
        cur.skip_whitespace();
        match cur.peek() {
            Some(b')') => {
                cur.pos += 1;
                return Ok(Skel::List(items));
            }
            None => return Err(WcdbError::corrupt("unterminated skel list")),
            _ => items.push(parse_one(cur)?),
        }
    }
}

fn parse_bare_atom(cur: &mut Cursor) -> WcdbResult<Skel> {
    let start = cur.pos;
    while let Some(b) = cur.peek() {
        if is_bare_name_byte(b) {
            cur.pos += 1;
        } else {
            break;
        }
    }
    Ok(Skel::Atom(cur.buf[start..cur.pos].to_vec()))
}

fn parse_explicit_atom(cur: &mut Cursor) -> WcdbResult<Skel> {
    let start = cur.pos;
    while matches!(cur.peek(), Some(b) if b.is_ascii_digit()) {
        cur.pos += 1;
    }
    let len_str = std::str::from_utf8(&cur.buf[start..cur.pos])
        .map_err(|_| WcdbError::corrupt("non-utf8 length prefix"))?;
    let len: usize = len_str
        .parse()
        .map_err(|_| WcdbError::corrupt("invalid length prefix"))?;
    if cur.peek() != Some(b' ') {
        return Err(WcdbError::corrupt("expected space after length prefix"));
    }
    cur.pos += 1;
    if cur.pos + len > cur.buf.len() {
        return Err(WcdbError::corrupt("length prefix exceeds input"));
    }
    let bytes = cur.buf[cur.pos..cur.pos + len].to_vec();
    cur.pos += len;
    Ok(Skel::Atom(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bare_atom_round_trips() {
        let s = Skel::str_atom("fulltext");
        let bytes = unparse(&s);
        assert_eq!(bytes, b"fulltext");
        assert_eq!(parse(&bytes).unwrap(), s);
    }

    #[test]
    fn binary_atom_uses_explicit_length() {
        let s = Skel::atom(vec![0, 1, 2, b' ', b'(', 255]);
        let bytes = unparse(&s);
        assert_eq!(bytes, b"6 \0\x01\x02 (\xff");
        assert_eq!(parse(&bytes).unwrap(), s);
    }

    #[test]
    fn nested_list_round_trips() {
        let s = Skel::list(vec![
            Skel::str_atom("fulltext"),
            Skel::str_atom("a3x"),
            Skel::list(vec![Skel::str_atom("nested")]),
        ]);
        let bytes = unparse(&s);
        assert_eq!(parse(&bytes).unwrap(), s);
    }

    #[test]
    fn empty_list_round_trips() {
        let s = Skel::list(vec![]);
        assert_eq!(unparse(&s), b"()");
        assert_eq!(parse(b"()").unwrap(), s);
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        assert!(parse(b"(a) b").is_err());
    }

    fn arb_skel() -> impl Strategy<Value = Skel> {
        let leaf = prop_oneof![
            "[a-z]{1,8}".prop_map(Skel::str_atom),
            prop::collection::vec(any::<u8>(), 0..12).prop_map(Skel::Atom),
        ];
        leaf.prop_recursive(4, 32, 4, |inner| {
            prop::collection::vec(inner, 0..4).prop_map(Skel::List)
        })
    }

    proptest! {
        #[test]
        fn skel_round_trip_law(s in arb_skel()) {
            let bytes = unparse(&s);
            prop_assert_eq!(parse(&bytes).unwrap(), s);
        }
    }
}
