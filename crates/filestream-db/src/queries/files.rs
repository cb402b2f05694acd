//! Lookup-record CRUD operations.

use chrono::Utc;
use filestream_core::{Error, ObjectId, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::models::{FileRecord, NewFile};

const COLS: &str = "id, message_id, anime_title, file_name, file_size, mime_type,
    poster, genres, quality, drive_id, created_at";

/// Insert a new lookup record, minting an ID when none is supplied.
pub fn insert_file(conn: &Connection, new: NewFile) -> Result<FileRecord> {
    let id = new.id.unwrap_or_else(ObjectId::generate);
    let created_at = Utc::now().to_rfc3339();
    let genres = new
        .genres
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| Error::Internal(format!("Failed to encode genres: {e}")))?;

    conn.execute(
        "INSERT INTO files (id, message_id, anime_title, file_name, file_size, mime_type,
            poster, genres, quality, drive_id, created_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
        rusqlite::params![
            id.as_str(),
            new.message_id,
            new.anime_title,
            new.file_name,
            new.file_size,
            new.mime_type,
            new.poster,
            genres,
            new.quality,
            new.drive_id,
            created_at,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(ref f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::Validation(format!("file {id} already exists"))
        }
        other => Error::database(other),
    })?;

    Ok(FileRecord {
        id,
        message_id: Some(new.message_id),
        anime_title: new.anime_title,
        file_name: new.file_name,
        file_size: new.file_size,
        mime_type: new.mime_type,
        poster: new.poster,
        genres: new.genres,
        quality: new.quality,
        drive_id: new.drive_id,
        created_at,
    })
}

/// Look up a record by object ID.
pub fn get_file(conn: &Connection, id: &ObjectId) -> Result<Option<FileRecord>> {
    conn.query_row(
        &format!("SELECT {COLS} FROM files WHERE id = ?1"),
        [id.as_str()],
        FileRecord::from_row,
    )
    .optional()
    .map_err(Error::database)
}

/// List all records, newest first.
pub fn list_files(conn: &Connection) -> Result<Vec<FileRecord>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {COLS} FROM files ORDER BY created_at DESC"
        ))
        .map_err(Error::database)?;
    let rows = stmt
        .query_map([], FileRecord::from_row)
        .map_err(Error::database)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Error::database)
}
