//! Strings Table (§4.2): content-addressed chunked byte-string storage.
//!
//! Grounded literally in `strings-table.c`. A string is zero or more
//! duplicate rows under one key, each row one chunk; total length is the
//! sum of chunk sizes. Operate directly on a [`wcdb_kv::Table`] obtained
//! from an open transaction (`trail.txn.table_mut(StringsTable::TABLE)`),
//! mirroring the free-function style of the original `svn_fs__bdb_*` API.

use wcdb_core::error::{WcdbError, WcdbResult};
use wcdb_kv::Table;

/// Facade over the `strings` table. Holds no state; every operation takes
/// the table as its first argument.
pub struct StringsTable;

impl StringsTable {
    /// Name of the underlying `wcdb-kv` table.
    pub const TABLE: &'static str = "strings";

    const NEXT_KEY: &'static [u8] = b"next-key";

    /// Seeds the reserved `next-key` row. Call once when the table is
    /// first created (mirrors `svn_fs__bdb_open_strings_table`'s `create`
    /// branch).
    pub fn init(table: &mut Table) {
        if table.get(Self::NEXT_KEY).is_none() {
            table.put(Self::NEXT_KEY, b"0".to_vec());
        }
    }

    /// Reads up to `len` bytes starting at `offset`, seeking through
    /// duplicate rows. Returns fewer bytes than requested (including zero)
    /// if `offset + len` runs past the end of the string.
    pub fn read(table: &Table, key: &str, offset: u64, len: u64) -> WcdbResult<Vec<u8>> {
        let chunks = table.get_all(key.as_bytes());
        if chunks.is_empty() {
            return Err(WcdbError::NoSuchString { key: key.to_string() });
        }

        let mut remaining_offset = offset;
        let mut want = len;
        let mut out = Vec::new();

        for chunk in chunks {
            let clen = chunk.len() as u64;
            if remaining_offset >= clen {
                remaining_offset -= clen;
                continue;
            }
            let start = remaining_offset as usize;
            let avail = clen - remaining_offset;
            let take = avail.min(want) as usize;
            out.extend_from_slice(&chunk[start..start + take]);
            want -= take as u64;
            remaining_offset = 0;
            if want == 0 {
                break;
            }
        }
        Ok(out)
    }

    /// Sum of every duplicate row's length under `key`.
    pub fn size(table: &Table, key: &str) -> WcdbResult<u64> {
        let chunks = table.get_all(key.as_bytes());
        if chunks.is_empty() {
            return Err(WcdbError::NoSuchString { key: key.to_string() });
        }
        Ok(chunks.iter().map(|c| c.len() as u64).sum())
    }

    /// Appends one chunk. If `key` is `None`, allocates a fresh id from
    /// `next-key` first and returns it.
    pub fn append(table: &mut Table, key: Option<String>, buf: &[u8]) -> WcdbResult<String> {
        let key = match key {
            Some(k) => k,
            None => Self::get_key_and_bump(table)?,
        };
        table.put_dup(key.as_bytes(), buf.to_vec());
        Ok(key)
    }

    /// Deletes all chunks under `key`, then re-inserts a single empty row
    /// so later `read`/`size` calls still find the key (mirrors
    /// `svn_fs__bdb_string_clear`'s "shove empty data back in" step).
    pub fn clear(table: &mut Table, key: &str) -> WcdbResult<()> {
        if !table.delete(key.as_bytes()) {
            return Err(WcdbError::NoSuchString { key: key.to_string() });
        }
        table.put(key.as_bytes(), Vec::new());
        Ok(())
    }

    /// Deletes all chunks under `key`, leaving no row behind.
    pub fn delete(table: &mut Table, key: &str) -> WcdbResult<()> {
        if !table.delete(key.as_bytes()) {
            return Err(WcdbError::NoSuchString { key: key.to_string() });
        }
        Ok(())
    }

    /// Allocates a new key and copies every chunk of `key` under it.
    pub fn copy(table: &mut Table, key: &str) -> WcdbResult<String> {
        let chunks: Vec<Vec<u8>> = table.get_all(key.as_bytes()).to_vec();
        if chunks.is_empty() {
            return Err(WcdbError::NoSuchString { key: key.to_string() });
        }
        let new_key = Self::get_key_and_bump(table)?;
        for chunk in chunks {
            table.put_dup(new_key.as_bytes(), chunk);
        }
        Ok(new_key)
    }

    fn get_key_and_bump(table: &mut Table) -> WcdbResult<String> {
        let current = table
            .get(Self::NEXT_KEY)
            .ok_or_else(|| WcdbError::corrupt("missing 'next-key' row in strings table"))?
            .to_vec();
        let current = String::from_utf8(current)
            .map_err(|_| WcdbError::corrupt("non-utf8 'next-key' row"))?;
        let next = crate::key_gen::next_key(&current);
        table.put(Self::NEXT_KEY, next.into_bytes());
        Ok(current)
    }
}
