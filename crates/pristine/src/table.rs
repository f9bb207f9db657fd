//! The `PRISTINE` table facade: a stateless row codec over a
//! [`wcdb_kv::Table`], mirroring `STMT_SELECT_PRISTINE` /
//! `STMT_INSERT_PRISTINE` / `STMT_SELECT_PRISTINE_BY_MD5` /
//! `STMT_DELETE_PRISTINE_IF_UNREFERENCED` from `wc_db_pristine.c`.
//!
//! Rows are keyed by raw SHA-1 bytes (not hex) so byte ordering matches hex
//! ordering; the value is a fixed-width `md5(16) ++ size(8, little-endian)`
//! encoding, mirroring the typed SQL columns the source stores instead of
//! a skel (the PRISTINE row has no nested/variant structure to encode).

use wcdb_core::error::{WcdbError, WcdbResult};
use wcdb_core::types::{Md5Checksum, Sha1Checksum};
use wcdb_kv::Table;

fn encode_row(md5: &Md5Checksum, size: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(24);
    out.extend_from_slice(md5.as_bytes());
    out.extend_from_slice(&size.to_le_bytes());
    out
}

fn decode_row(bytes: &[u8]) -> WcdbResult<(Md5Checksum, u64)> {
    if bytes.len() != 24 {
        return Err(WcdbError::corrupt("malformed PRISTINE row"));
    }
    let mut md5_bytes = [0u8; 16];
    md5_bytes.copy_from_slice(&bytes[..16]);
    let mut size_bytes = [0u8; 8];
    size_bytes.copy_from_slice(&bytes[16..24]);
    Ok((Md5Checksum::from_bytes(md5_bytes), u64::from_le_bytes(size_bytes)))
}

/// Facade over the `pristine` table.
pub struct PristineTable;

impl PristineTable {
    /// Name of the underlying `wcdb-kv` table.
    pub const TABLE: &'static str = "pristine";

    pub fn contains(table: &Table, sha1: &Sha1Checksum) -> bool {
        table.contains_key(sha1.as_bytes())
    }

    pub fn read(table: &Table, sha1: &Sha1Checksum) -> WcdbResult<(Md5Checksum, u64)> {
        let bytes = table
            .get(sha1.as_bytes())
            .ok_or_else(|| WcdbError::NoSuchPristine { sha1: sha1.to_hex() })?;
        decode_row(bytes)
    }

    pub fn insert(table: &mut Table, sha1: &Sha1Checksum, md5: &Md5Checksum, size: u64) {
        table.put(sha1.as_bytes(), encode_row(md5, size));
    }

    pub fn delete(table: &mut Table, sha1: &Sha1Checksum) -> bool {
        table.delete(sha1.as_bytes())
    }

    /// Linear scan for the row whose MD5 matches. `STMT_SELECT_PRISTINE_BY_MD5`
    /// is an indexed query in the source; this rewrite has no secondary
    /// index over this small table, so it scans every row instead.
    pub fn find_by_md5(table: &Table, md5: &Md5Checksum) -> Option<Sha1Checksum> {
        for (key, value) in table.iter() {
            if let Ok((row_md5, _)) = decode_row(value) {
                if &row_md5 == md5 {
                    let mut bytes = [0u8; 20];
                    bytes.copy_from_slice(key);
                    return Some(Sha1Checksum::from_bytes(bytes));
                }
            }
        }
        None
    }

    /// Every SHA-1 currently stored, for [`crate::store::PristineStore::cleanup`]
    /// to consult alongside the caller's reference check.
    pub fn all_sha1s(table: &Table) -> Vec<Sha1Checksum> {
        table
            .iter()
            .map(|(key, _)| {
                let mut bytes = [0u8; 20];
                bytes.copy_from_slice(key);
                Sha1Checksum::from_bytes(bytes)
            })
            .collect()
    }
}
