//! filestream-db: the object lookup store.
//!
//! This crate provides SQLite-backed storage with connection pooling,
//! embedded migrations, the [`models::FileRecord`] model, and the queries
//! the server uses to resolve object IDs.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
