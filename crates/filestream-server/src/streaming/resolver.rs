//! Object metadata resolution.
//!
//! The stored record decides whether an object exists at all. Given a
//! record, the upstream is asked for authoritative metadata; if that fails
//! for any reason the stored fields are used instead and the request goes
//! on.

use std::sync::Arc;
use std::time::Duration;

use filestream_core::{Error, ObjectId, ObjectMetadata, Result};
use filestream_db::models::FileRecord;
use filestream_upstream::{RemoteMedia, UpstreamSource};

use crate::store::LookupStore;

/// Everything the stream route needs about one object.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub record: FileRecord,
    pub metadata: ObjectMetadata,
    /// Upstream message holding the media.
    pub message_id: i64,
    /// Open handle from the live lookup, reused by the stream driver.
    pub handle: Option<RemoteMedia>,
}

/// Resolves object IDs to metadata using the lookup store and upstream.
pub struct MetadataResolver {
    store: Arc<dyn LookupStore>,
    source: Arc<dyn UpstreamSource>,
    timeout: Duration,
}

impl MetadataResolver {
    pub fn new(
        store: Arc<dyn LookupStore>,
        source: Arc<dyn UpstreamSource>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            source,
            timeout,
        }
    }

    /// Resolve `id`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the store has no record, [`Error::Internal`]
    /// if the record has no upstream message reference, and any store
    /// failure as-is. Upstream failures never surface here.
    pub async fn resolve(&self, id: &ObjectId) -> Result<Resolved> {
        let record = self
            .store
            .get_file(id)
            .await?
            .ok_or_else(|| Error::not_found("file", id))?;

        let message_id = record.message_id.ok_or_else(|| {
            Error::Internal(format!("file {id} has no upstream message reference"))
        })?;

        let handle = match tokio::time::timeout(self.timeout, self.source.open_media(message_id)).await
        {
            Ok(Ok(handle)) => {
                tracing::debug!(
                    %id,
                    message_id,
                    kind = handle.media.kind_name(),
                    "Live metadata resolved"
                );
                Some(handle)
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    %id,
                    message_id,
                    kind = ?e.kind(),
                    "Live metadata lookup failed, using stored record: {e}"
                );
                None
            }
            Err(_) => {
                tracing::warn!(
                    %id,
                    message_id,
                    timeout_secs = self.timeout.as_secs(),
                    "Live metadata lookup timed out, using stored record"
                );
                None
            }
        };

        let metadata = match &handle {
            Some(h) => h.metadata(),
            None => stored_metadata(&record),
        };

        Ok(Resolved {
            record,
            metadata,
            message_id,
            handle,
        })
    }
}

/// Metadata from the stored record, with defaults for missing fields.
fn stored_metadata(record: &FileRecord) -> ObjectMetadata {
    let size = record
        .file_size
        .and_then(|s| u64::try_from(s).ok())
        .unwrap_or(0);
    ObjectMetadata::with_defaults(
        size,
        record.file_name.as_deref(),
        record.mime_type.as_deref(),
    )
}
