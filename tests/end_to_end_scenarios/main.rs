//! Literal-I/O end-to-end scenarios (the named S1-S6 scenarios): one
//! focused test per scenario, named after its subject rather than its
//! label.

use wcdb_core::config::WcdbConfig;
use wcdb_core::types::{ReposId, Revision, WorkingStatus};
use wcdb_diff::{assemble_two_way, compute_lcs, DiffOpKind};
use wcdb_engine::node::{self, AdditionKind, BaseAddOptions, CommitInfo};
use wcdb_kv::{Store, Table};
use wcdb_pristine as pristine;
use wcdb_tables::StringsTable;

fn init_strings_table() -> Table {
    let mut t = Table::new();
    StringsTable::init(&mut t);
    t
}

fn new_node_store() -> (Store, WcdbConfig) {
    let store = Store::new();
    node::init(&store);
    (store, WcdbConfig::default())
}

/// S1. Append + readback of chunks.
#[test]
fn append_then_readback_at_offset() {
    let mut t = init_strings_table();
    let key = StringsTable::append(&mut t, None, b"Hello ").unwrap();
    StringsTable::append(&mut t, Some(key.clone()), b"world!").unwrap();

    assert_eq!(StringsTable::size(&t, &key).unwrap(), 12);
    assert_eq!(StringsTable::read(&t, &key, 0, 100).unwrap(), b"Hello world!");
    assert_eq!(StringsTable::read(&t, &key, 6, 100).unwrap(), b"world!");
}

/// S2. Clear then append.
#[test]
fn clear_then_reappend() {
    let mut t = init_strings_table();
    let key = StringsTable::append(&mut t, None, b"Hello ").unwrap();
    StringsTable::append(&mut t, Some(key.clone()), b"world!").unwrap();

    StringsTable::clear(&mut t, &key).unwrap();
    assert_eq!(StringsTable::size(&t, &key).unwrap(), 0);
    assert_eq!(StringsTable::read(&t, &key, 0, 100).unwrap(), Vec::<u8>::new());

    StringsTable::append(&mut t, Some(key.clone()), b"x").unwrap();
    assert_eq!(StringsTable::size(&t, &key).unwrap(), 1);
}

/// S3. LCS of [A,B,C,D] vs [A,X,C,D].
#[test]
fn lcs_of_single_substitution_finds_the_two_common_runs() {
    let a = ["A", "B", "C", "D"];
    let b = ["A", "X", "C", "D"];
    let matches = compute_lcs(&a, &b, 0, 0);

    assert_eq!(matches.len(), 2);
    assert_eq!((matches[0].pos1, matches[0].pos2, matches[0].length), (0, 0, 1));
    assert_eq!((matches[1].pos1, matches[1].pos2, matches[1].length), (2, 2, 2));

    let hunks = assemble_two_way(&matches, a.len() as u64, b.len() as u64, true);
    assert_eq!(hunks.len(), 3);
    assert_eq!(hunks[0].kind, DiffOpKind::Common);
    assert_eq!(hunks[1].kind, DiffOpKind::Modified);
    assert_eq!(hunks[2].kind, DiffOpKind::Common);
}

/// S4. Copy within same WCROOT preserving provenance.
#[test]
fn copy_within_same_wcroot_preserves_provenance() {
    use wcdb_core::types::RelPath;

    let (store, config) = new_node_store();
    node::base_add_file(
        &store,
        &config,
        &RelPath::new("A"),
        BaseAddOptions {
            repos_id: Some(ReposId(1)),
            repos_relpath: Some("trunk/A".to_string()),
            revision: Some(Revision(7)),
            ..Default::default()
        },
    )
    .unwrap();

    node::op_copy(&store, &config, &RelPath::new("A"), &RelPath::new("B")).unwrap();

    let addition = node::scan_addition(&store, &RelPath::new("B")).unwrap();
    assert_eq!(addition.status, AdditionKind::Copied);
    assert_eq!(addition.original_repos_path.as_deref(), Some("trunk/A"));
    assert_eq!(addition.original_revision, Some(Revision(7)));

    let info = node::read_info(&store, &RelPath::new("B")).unwrap();
    assert_eq!(info.status, WorkingStatus::Normal);
    assert!(info.have_work);
}

/// S5. Three-layer delete then commit.
#[test]
fn delete_then_commit_clears_working_and_bumps_base_revision() {
    use wcdb_core::types::RelPath;

    let (store, config) = new_node_store();
    node::base_add_file(
        &store,
        &config,
        &RelPath::new("X"),
        BaseAddOptions {
            repos_id: Some(ReposId(1)),
            repos_relpath: Some("trunk/X".to_string()),
            revision: Some(Revision(3)),
            ..Default::default()
        },
    )
    .unwrap();

    node::op_delete(&store, &config, &RelPath::new("X")).unwrap();
    let deleted = node::read_info(&store, &RelPath::new("X")).unwrap();
    assert_eq!(deleted.status, WorkingStatus::Deleted);

    node::global_commit(
        &store,
        &config,
        &RelPath::new("X"),
        CommitInfo {
            new_revision: Revision(9),
            changed_rev: Revision(9),
            changed_date: 1_700_000_000,
            changed_author: "jrandom".to_string(),
            checksum: None,
            keep_changelist: false,
            no_unlock: false,
        },
    )
    .unwrap();

    let committed = node::read_info(&store, &RelPath::new("X")).unwrap();
    assert_eq!(committed.status, WorkingStatus::Normal);
    assert_eq!(committed.revision, Some(Revision(9)));
    assert!(committed.have_base);
    assert!(!committed.have_work);
}

/// S6. Pristine install idempotence.
#[test]
fn installing_the_same_sha1_twice_leaves_one_row_and_one_file() {
    use std::fs;
    use wcdb_core::types::{Md5Checksum, Sha1Checksum};
    use wcdb_pristine::path::pristine_subdir;

    let wcroot = tempfile::tempdir().unwrap();
    let store = Store::new();
    pristine::store::init(&store);
    let config = WcdbConfig::default();

    let sha1 = Sha1Checksum::from_bytes([0x5a; 20]);
    let md5 = Md5Checksum::from_bytes([0x5b; 16]);

    let write_temp = |name: &str| -> std::path::PathBuf {
        let p = wcroot.path().join(name);
        fs::write(&p, b"identical pristine content").unwrap();
        p
    };

    let tmp1 = write_temp("tmp1");
    pristine::store::install(&store, &config, wcroot.path(), &tmp1, &sha1, &md5).unwrap();

    let tmp2 = write_temp("tmp2");
    pristine::store::install(&store, &config, wcroot.path(), &tmp2, &sha1, &md5).unwrap();

    assert!(pristine::store::check(&store, wcroot.path(), &sha1).unwrap());
    assert!(!tmp2.exists());

    let entries: Vec<_> = fs::read_dir(pristine_subdir(wcroot.path(), &sha1))
        .unwrap()
        .collect();
    assert_eq!(entries.len(), 1);
}
