//! Browser storage adapters.

pub mod indexed_db;
pub mod local_storage;
