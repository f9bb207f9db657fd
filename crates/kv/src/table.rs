//! An ordered, duplicate-key-capable table.
//!
//! Grounded on the BDB `DB_DUP` tables the strings and representations
//! stores are built on (`strings-table.c`, `reps-table.c`): a table may
//! hold several rows under the same key, retrieved in insertion order via
//! `DB_SET`/`DB_NEXT_DUP`, and `put_replacing` gives the cursor-overwrite
//! semantics those call sites rely on (a plain put would append a
//! duplicate rather than replace the row at the cursor).

use std::collections::BTreeMap;

use crate::error::KvError;

/// One named table: an ordered map from key to an ordered list of values.
#[derive(Debug, Default, Clone)]
pub struct Table {
    rows: BTreeMap<Vec<u8>, Vec<Vec<u8>>>,
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    /// Appends a duplicate row under `key`, preserving insertion order.
    pub fn put_dup(&mut self, key: &[u8], value: Vec<u8>) {
        self.rows.entry(key.to_vec()).or_default().push(value);
    }

    /// Replaces all rows under `key` with a single row (the plain,
    /// non-duplicate put most tables actually use).
    pub fn put(&mut self, key: &[u8], value: Vec<u8>) {
        self.rows.insert(key.to_vec(), vec![value]);
    }

    /// Replaces the row at `index` within `key`'s duplicate set in place
    /// (the cursor-overwrite `DB_CURRENT` pattern `write_new_rep` and the
    /// key allocator depend on to bump `next-key` without appending).
    pub fn put_replacing(&mut self, key: &[u8], index: usize, value: Vec<u8>) -> Result<(), KvError> {
        let dups = self.rows.get_mut(key).ok_or_else(|| KvError::NoSuchTable(String::new()))?;
        let slot = dups.get_mut(index).ok_or(KvError::CursorExhausted)?;
        *slot = value;
        Ok(())
    }

    /// The first (and, for non-dup tables, only) row under `key`.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.rows.get(key).and_then(|dups| dups.first()).map(Vec::as_slice)
    }

    /// All duplicate rows under `key`, in insertion order.
    pub fn get_all(&self, key: &[u8]) -> &[Vec<u8>] {
        self.rows.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn delete(&mut self, key: &[u8]) -> bool {
        self.rows.remove(key).is_some()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.rows.contains_key(key)
    }

    /// Rows whose key starts with `prefix`, in key order — the scan
    /// `wcdb-engine` uses for descendant lookups under a `RelPath`.
    pub fn scan_prefix<'a>(&'a self, prefix: &'a [u8]) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + 'a {
        self.rows
            .range(prefix.to_vec()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
            .flat_map(|(k, dups)| dups.iter().map(move |v| (k.as_slice(), v.as_slice())))
    }

    pub fn len(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.rows.iter().flat_map(|(k, dups)| dups.iter().map(move |v| (k.as_slice(), v.as_slice())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_replaces_all_dups() {
        let mut t = Table::new();
        t.put_dup(b"k", b"a".to_vec());
        t.put_dup(b"k", b"b".to_vec());
        t.put(b"k", b"c".to_vec());
        assert_eq!(t.get_all(b"k"), &[b"c".to_vec()]);
    }

    #[test]
    fn dup_rows_preserve_insertion_order() {
        let mut t = Table::new();
        t.put_dup(b"k", b"first".to_vec());
        t.put_dup(b"k", b"second".to_vec());
        t.put_dup(b"k", b"third".to_vec());
        assert_eq!(
            t.get_all(b"k"),
            &[b"first".to_vec(), b"second".to_vec(), b"third".to_vec()]
        );
    }

    #[test]
    fn put_replacing_overwrites_in_place_without_appending() {
        let mut t = Table::new();
        t.put_dup(b"k", b"a".to_vec());
        t.put_dup(b"k", b"b".to_vec());
        t.put_replacing(b"k", 0, b"a2".to_vec()).unwrap();
        assert_eq!(t.get_all(b"k"), &[b"a2".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn scan_prefix_respects_key_order() {
        let mut t = Table::new();
        t.put(b"a/1", b"v1".to_vec());
        t.put(b"a/2", b"v2".to_vec());
        t.put(b"b/1", b"v3".to_vec());
        let got: Vec<_> = t.scan_prefix(b"a/").map(|(k, _)| k.to_vec()).collect();
        assert_eq!(got, vec![b"a/1".to_vec(), b"a/2".to_vec()]);
    }

    #[test]
    fn delete_removes_all_dups_for_key() {
        let mut t = Table::new();
        t.put_dup(b"k", b"a".to_vec());
        t.put_dup(b"k", b"b".to_vec());
        assert!(t.delete(b"k"));
        assert!(t.get_all(b"k").is_empty());
        assert!(!t.delete(b"k"));
    }
}
