//! Persistence layer: libSQL-backed storage for registered catchers and
//! wild-catcher sightings.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{CatcherRecord, ProfileStore};
