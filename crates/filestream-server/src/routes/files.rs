//! File metadata API.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use filestream_core::ObjectId;
use filestream_db::models::FileRecord;

use crate::context::AppContext;
use crate::error::AppError;

/// Metadata and links for one object.
#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: String,
    pub title: String,
    pub stream_url: String,
    pub download_link: String,
    pub drive_link: Option<String>,
    pub poster: Option<String>,
    pub genres: Option<Vec<String>>,
    pub quality: Option<String>,
}

impl FileResponse {
    fn from_record(record: FileRecord, base_url: &str) -> Self {
        let id = record.id.to_string();
        Self {
            title: record.anime_title.unwrap_or_else(|| "Unknown".into()),
            stream_url: format!("{base_url}/watch/{id}"),
            download_link: format!("{base_url}/dl/{id}"),
            drive_link: record
                .drive_id
                .filter(|d| !d.is_empty())
                .map(|d| format!("https://drive.google.com/file/d/{d}/view")),
            poster: record.poster,
            genres: record.genres,
            quality: record.quality,
            id,
        }
    }
}

/// GET /api/file/{id}
pub async fn get_file(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let id: ObjectId = id.parse()?;
    let record = ctx
        .store
        .get_file(&id)
        .await?
        .ok_or_else(|| filestream_core::Error::not_found("file", &id))?;

    Ok(Json(FileResponse::from_record(record, ctx.public_base_url())))
}
