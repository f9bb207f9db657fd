//! # wcdb
//!
//! A working-copy and repository metadata engine: the LCS-based diff
//! stack, content-addressed strings/representations tables, a pristine
//! text store, and a layered `BASE`/`WORKING`/`ACTUAL` working-copy node
//! model addressed by `op_depth`.
//!
//! This crate is a thin facade over its constituent crates; most callers
//! only need the re-exports below.
//!
//! # Quick start
//!
//! ```no_run
//! use wcdb::{Resolver, WcdbConfig};
//!
//! let resolver = Resolver::new();
//! let config = WcdbConfig::default();
//! let root = resolver.create_wcroot(std::path::Path::new("./wc")).unwrap();
//! wcdb::node::init(&root.store);
//! ```
//!
//! # Layout
//!
//! | Crate | Covers |
//! |-------|--------|
//! | [`wcdb_core`] | ids, errors, the skel codec, configuration |
//! | [`wcdb_kv`] | the transactional key-value substrate |
//! | [`wcdb_trail`] | retry-on-deadlock transaction runner |
//! | [`wcdb_tables`] | Strings and Representations tables |
//! | [`wcdb_diff`] | LCS diff, two/three-way assembly, normalization |
//! | [`wcdb_pristine`] | content-addressed pristine text store |
//! | [`wcdb_engine`] | WC-root resolution, locks, the NODES/ACTUAL model |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use wcdb_core as core;
pub use wcdb_diff as diff;
pub use wcdb_engine as engine;
pub use wcdb_kv as kv;
pub use wcdb_pristine as pristine;
pub use wcdb_tables as tables;
pub use wcdb_trail as trail;

pub use wcdb_core::config::{WcdbConfig, WcdbConfigBuilder};
pub use wcdb_core::error::{WcdbError, WcdbResult};
pub use wcdb_core::types::{
    Md5Checksum, NodeKind, OpDepth, Presence, RelPath, ReposId, Revision, Sha1Checksum, SvnDepth,
    WcId, WorkingStatus,
};

pub use wcdb_engine::node;
pub use wcdb_engine::{EngineRefs, LockTable, NodeStore, Resolver, WcLock, WcRoot, LEVELS_INFINITY};

pub use wcdb_kv::{Store, Table, Txn};
