//! The lookup store's SQLite connection pool.
//!
//! A running server only reads `files`; records are added out of band by
//! `filestream add-file`, usually while the server is up. The on-disk pool
//! therefore runs in WAL mode with a busy timeout so that a CLI writer never
//! makes stream lookups fail with `SQLITE_BUSY`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use filestream_core::{Error, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::migrations;

/// Connections are handed to `spawn_blocking` lookups, one per request.
pub type DbPool = Pool<SqliteConnectionManager>;

pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// How long a lookup waits on a concurrent writer before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on concurrent lookups hitting the database file.
const MAX_CONNECTIONS: u32 = 8;

/// Open (or create) the lookup database at `db_path` and bring its schema
/// up to date.
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
    });
    build(manager, MAX_CONNECTIONS)
}

/// A private in-memory lookup database.
///
/// Each call gets its own shared-cache database, so concurrently running
/// tests never see each other's records while connections inside one pool
/// do share them.
pub fn init_memory_pool() -> Result<DbPool> {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let n = NEXT.fetch_add(1, Ordering::Relaxed);
    let manager =
        SqliteConnectionManager::file(format!("file:filestream_mem_{n}?mode=memory&cache=shared"));
    build(manager, 4)
}

fn build(manager: SqliteConnectionManager, max_size: u32) -> Result<DbPool> {
    let pool = Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to open lookup database: {e}")))?;

    migrations::run_migrations(&*get_conn(&pool)?)?;
    Ok(pool)
}

pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("Failed to get connection from pool: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewFile;
    use crate::queries::files;

    fn new_file(message_id: i64) -> NewFile {
        NewFile {
            message_id,
            file_name: Some("ep01.mkv".into()),
            ..Default::default()
        }
    }

    #[test]
    fn memory_pool_has_files_table() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='files'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn memory_pools_are_isolated() {
        let a = init_memory_pool().unwrap();
        let b = init_memory_pool().unwrap();
        let record = files::insert_file(&get_conn(&a).unwrap(), new_file(1)).unwrap();

        assert!(files::get_file(&get_conn(&b).unwrap(), &record.id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn records_are_shared_across_pooled_connections() {
        let pool = init_memory_pool().unwrap();
        let writer = get_conn(&pool).unwrap();
        let reader = get_conn(&pool).unwrap();

        let record = files::insert_file(&writer, new_file(7)).unwrap();
        let found = files::get_file(&reader, &record.id).unwrap().unwrap();
        assert_eq!(found.message_id, Some(7));
    }

    #[test]
    fn file_pool_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filestream.db");
        let pool = init_pool(&path.to_string_lossy()).unwrap();

        let mode: String = get_conn(&pool)
            .unwrap()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn cli_writes_are_visible_to_a_running_server() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filestream.db");
        let server = init_pool(&path.to_string_lossy()).unwrap();
        let server_conn = get_conn(&server).unwrap();

        // A second pool on the same file plays the `add-file` process.
        let cli = init_pool(&path.to_string_lossy()).unwrap();
        let record = files::insert_file(&get_conn(&cli).unwrap(), new_file(42)).unwrap();
        drop(cli);

        let found = files::get_file(&server_conn, &record.id).unwrap().unwrap();
        assert_eq!(found.file_name.as_deref(), Some("ep01.mkv"));
    }
}
