//! Database schema and the SQLite record store

pub mod init;
pub mod records;

pub use init::*;
pub use records::SqliteRecordStore;
