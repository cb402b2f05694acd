//! Rust structs mapping to database tables.

use filestream_core::ObjectId;

/// A lookup record describing one streamable object.
///
/// Every descriptive column is optional; the server substitutes defaults
/// when a field is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub id: ObjectId,
    /// Reference to the upstream message holding the media.
    pub message_id: Option<i64>,
    pub anime_title: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub poster: Option<String>,
    pub genres: Option<Vec<String>>,
    pub quality: Option<String>,
    pub drive_id: Option<String>,
    pub created_at: String,
}

impl FileRecord {
    /// Build a record from a row selected with [`crate::queries::files`]'s
    /// column list.
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let id: String = row.get(0)?;
        let id = id.parse::<ObjectId>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        let genres: Option<String> = row.get(7)?;
        let genres = genres
            .map(|g| serde_json::from_str::<Vec<String>>(&g))
            .transpose()
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
            })?;

        Ok(Self {
            id,
            message_id: row.get(1)?,
            anime_title: row.get(2)?,
            file_name: row.get(3)?,
            file_size: row.get(4)?,
            mime_type: row.get(5)?,
            poster: row.get(6)?,
            genres,
            quality: row.get(8)?,
            drive_id: row.get(9)?,
            created_at: row.get(10)?,
        })
    }
}

/// Fields supplied when registering a new object.
#[derive(Debug, Clone, Default)]
pub struct NewFile {
    pub id: Option<ObjectId>,
    pub message_id: i64,
    pub anime_title: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub poster: Option<String>,
    pub genres: Option<Vec<String>>,
    pub quality: Option<String>,
    pub drive_id: Option<String>,
}
