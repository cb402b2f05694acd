//! The lookup store seam.
//!
//! Handlers resolve object IDs through [`LookupStore`] rather than touching
//! the database directly, so the store can be swapped in tests.

use async_trait::async_trait;

use filestream_core::{Error, ObjectId, Result};
use filestream_db::models::FileRecord;
use filestream_db::pool::{self, DbPool};
use filestream_db::queries;

/// Maps object IDs to their stored records.
#[async_trait]
pub trait LookupStore: Send + Sync {
    /// Fetch the record for `id`, or `None` if the ID is unknown.
    async fn get_file(&self, id: &ObjectId) -> Result<Option<FileRecord>>;
}

/// [`LookupStore`] backed by the SQLite pool.
#[derive(Clone)]
pub struct SqliteLookupStore {
    pool: DbPool,
}

impl SqliteLookupStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LookupStore for SqliteLookupStore {
    async fn get_file(&self, id: &ObjectId) -> Result<Option<FileRecord>> {
        let pool = self.pool.clone();
        let id = id.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool::get_conn(&pool)?;
            queries::files::get_file(&conn, &id)
        })
        .await
        .map_err(|e| Error::Internal(format!("spawn_blocking join error: {e}")))?
    }
}
