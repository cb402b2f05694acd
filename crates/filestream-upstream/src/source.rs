//! The upstream source capability.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::error::{UpstreamError, UpstreamResult};
use crate::media::{RemoteMedia, RemoteMessage};

/// A lazy, forward-only sequence of byte chunks read from the upstream.
pub type ChunkStream = Pin<Box<dyn Stream<Item = UpstreamResult<Bytes>> + Send + 'static>>;

/// A remote store holding media objects, addressed by message ID.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    /// Fetch a message and whatever media it carries.
    async fn get_message(&self, message_id: i64) -> UpstreamResult<RemoteMessage>;

    /// Read up to `limit` bytes of `media` starting at `offset`.
    ///
    /// The stream is pull-driven: nothing is read until it is polled, and
    /// chunk boundaries are not guaranteed to align with any fixed size.
    fn stream_chunks(&self, media: &RemoteMedia, offset: u64, limit: u64) -> ChunkStream;

    /// Fetch a message and open a handle to its media.
    async fn open_media(&self, message_id: i64) -> UpstreamResult<RemoteMedia> {
        self.get_message(message_id).await?.into_media().ok_or_else(|| {
            UpstreamError::Protocol(format!("message {message_id} carries no media"))
        })
    }
}
