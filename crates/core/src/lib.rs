//! Shared identifiers, the unified error type, the skel codec, and runtime
//! configuration for the working-copy and repository metadata engine.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod skel;
pub mod types;

pub use config::{WcdbConfig, WcdbConfigBuilder};
pub use error::{WcdbError, WcdbResult};
pub use skel::{parse as skel_parse, unparse as skel_unparse, Skel};
pub use types::{
    Md5Checksum, NodeKind, OpDepth, Presence, RelPath, ReposId, Revision, Sha1Checksum, SvnDepth,
    WcId, WorkingStatus,
};
