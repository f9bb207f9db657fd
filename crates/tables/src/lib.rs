//! Content-addressed chunked storage: the Strings Table (§4.2) and
//! Representations Table (§4.3), both stateless facades over a
//! [`wcdb_kv::Table`] obtained from an open transaction.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod key_gen;
pub mod reps;
pub mod strings;

pub use reps::{RepsTable, Representation};
pub use strings::StringsTable;
