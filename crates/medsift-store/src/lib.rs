//! MedSift Store — SQLite persistence for documents and analysis results.

pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::SqliteStore;
pub use types::*;
