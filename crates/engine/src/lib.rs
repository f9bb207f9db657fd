//! Working-copy engine: resolves absolute paths to working-copy roots,
//! tracks in-process sub-tree locks, and implements the layered
//! `NODES`/`ACTUAL` node model (§4.8–§4.10).
//!
//! Grounded in the teacher's `crates/engine` layout plus `wc_db_pdh.c`
//! (root resolution), `wc_db_private.h` (lock bookkeeping), and `wc_db.h`
//! (the node model's operation surface).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod lock;
pub mod model;
pub mod node;
pub mod refs;
pub mod tables;
pub mod wcroot;

pub use lock::{LockTable, WcLock, LEVELS_INFINITY};
pub use node::NodeStore;
pub use refs::EngineRefs;
pub use wcroot::{Resolver, WcRoot};
