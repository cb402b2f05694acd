//! Upstream message and media payload types.
//!
//! A message carries at most one media payload. The payload's kind is an
//! explicit variant, each wrapping the same [`MediaFile`] description.

use serde::{Deserialize, Serialize};

use filestream_core::ObjectMetadata;

/// Size, name, and type of a media payload as reported by the upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub file_size: u64,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// A media payload, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "file", rename_all = "lowercase")]
pub enum Media {
    Video(MediaFile),
    Document(MediaFile),
    Audio(MediaFile),
    Animation(MediaFile),
    Voice(MediaFile),
}

impl Media {
    /// The file description, whatever the kind.
    pub fn file(&self) -> &MediaFile {
        match self {
            Media::Video(f)
            | Media::Document(f)
            | Media::Audio(f)
            | Media::Animation(f)
            | Media::Voice(f) => f,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Media::Video(_) => "video",
            Media::Document(_) => "document",
            Media::Audio(_) => "audio",
            Media::Animation(_) => "animation",
            Media::Voice(_) => "voice",
        }
    }
}

/// A message as returned by the upstream store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMessage {
    pub id: i64,
    #[serde(default)]
    pub media: Option<Media>,
}

impl RemoteMessage {
    /// Extract a streamable handle, if the message carries media.
    pub fn into_media(self) -> Option<RemoteMedia> {
        let media = self.media?;
        Some(RemoteMedia {
            message_id: self.id,
            media,
        })
    }
}

/// An opened handle to a message's media, reusable for streaming without
/// a second metadata round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMedia {
    pub message_id: i64,
    pub media: Media,
}

impl RemoteMedia {
    /// Authoritative metadata, with defaults for missing name and type.
    pub fn metadata(&self) -> ObjectMetadata {
        let file = self.media.file();
        ObjectMetadata::with_defaults(
            file.file_size,
            file.file_name.as_deref(),
            file.mime_type.as_deref(),
        )
    }
}
