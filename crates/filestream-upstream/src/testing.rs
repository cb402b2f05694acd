//! In-memory upstream source with scriptable faults.
//!
//! Used by the server's unit and integration tests to stand in for a real
//! message store: objects are byte buffers, and failures can be injected
//! at a chosen chunk or on the metadata lookup.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{UpstreamError, UpstreamResult};
use crate::media::{Media, MediaFile, RemoteMedia, RemoteMessage};
use crate::source::{ChunkStream, UpstreamSource};

/// Builds the error injected by a fault. Errors are not `Clone`, so each
/// injection constructs a fresh one.
pub type ErrorFactory = fn() -> UpstreamError;

struct MemoryObject {
    media: Media,
    data: Bytes,
    /// Fail after this many chunks have been yielded.
    stream_fault: Option<(usize, ErrorFactory)>,
    metadata_fault: Option<ErrorFactory>,
    metadata_delay: Option<Duration>,
}

/// Upstream source serving byte buffers from memory.
pub struct MemorySource {
    objects: HashMap<i64, MemoryObject>,
    chunk_size: usize,
    /// Ignore the caller's limit and keep yielding to the end of the object.
    overshoot: bool,
    chunk_reads: Arc<AtomicUsize>,
    metadata_calls: AtomicUsize,
}

impl MemorySource {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            objects: HashMap::new(),
            chunk_size: chunk_size.max(1),
            overshoot: false,
            chunk_reads: Arc::new(AtomicUsize::new(0)),
            metadata_calls: AtomicUsize::new(0),
        }
    }

    /// Register a video object under `message_id`.
    pub fn with_video(self, message_id: i64, file_name: &str, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let media = Media::Video(MediaFile {
            file_size: data.len() as u64,
            file_name: Some(file_name.to_owned()),
            mime_type: Some("video/mp4".to_owned()),
        });
        self.with_media(message_id, media, data)
    }

    /// Register an object with an explicit media payload description.
    pub fn with_media(mut self, message_id: i64, media: Media, data: impl Into<Bytes>) -> Self {
        self.objects.insert(
            message_id,
            MemoryObject {
                media,
                data: data.into(),
                stream_fault: None,
                metadata_fault: None,
                metadata_delay: None,
            },
        );
        self
    }

    /// Fail the stream for `message_id` once `after_chunks` chunks were sent.
    pub fn with_stream_fault(mut self, message_id: i64, after_chunks: usize, error: ErrorFactory) -> Self {
        if let Some(obj) = self.objects.get_mut(&message_id) {
            obj.stream_fault = Some((after_chunks, error));
        }
        self
    }

    /// Fail every metadata lookup for `message_id`.
    pub fn with_metadata_fault(mut self, message_id: i64, error: ErrorFactory) -> Self {
        if let Some(obj) = self.objects.get_mut(&message_id) {
            obj.metadata_fault = Some(error);
        }
        self
    }

    /// Delay metadata lookups for `message_id`.
    pub fn with_metadata_delay(mut self, message_id: i64, delay: Duration) -> Self {
        if let Some(obj) = self.objects.get_mut(&message_id) {
            obj.metadata_delay = Some(delay);
        }
        self
    }

    /// Yield past the requested limit, like an upstream that ignores it.
    pub fn with_overshoot(mut self) -> Self {
        self.overshoot = true;
        self
    }

    /// Total chunks yielded across all streams.
    pub fn chunk_reads(&self) -> usize {
        self.chunk_reads.load(Ordering::SeqCst)
    }

    /// Total metadata lookups served.
    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamSource for MemorySource {
    async fn get_message(&self, message_id: i64) -> UpstreamResult<RemoteMessage> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        let Some(obj) = self.objects.get(&message_id) else {
            return Ok(RemoteMessage {
                id: message_id,
                media: None,
            });
        };
        if let Some(delay) = obj.metadata_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(fault) = obj.metadata_fault {
            return Err(fault());
        }
        Ok(RemoteMessage {
            id: message_id,
            media: Some(obj.media.clone()),
        })
    }

    fn stream_chunks(&self, media: &RemoteMedia, offset: u64, limit: u64) -> ChunkStream {
        let obj = self.objects.get(&media.message_id);
        let data = obj.map(|o| o.data.clone());
        let fault = obj.and_then(|o| o.stream_fault);
        let chunk_size = self.chunk_size;
        let overshoot = self.overshoot;
        let reads = Arc::clone(&self.chunk_reads);
        let message_id = media.message_id;

        Box::pin(async_stream::stream! {
            let data = match data {
                Some(d) => d,
                None => {
                    yield Err(UpstreamError::Protocol(format!("message {message_id} not found")));
                    return;
                }
            };
            let len = data.len() as u64;
            if offset >= len {
                yield Err(UpstreamError::OffsetInvalid { offset });
                return;
            }

            let end = if overshoot { len } else { offset.saturating_add(limit).min(len) };
            let mut pos = offset as usize;
            let mut sent = 0;
            while (pos as u64) < end {
                if let Some((after, error)) = fault {
                    if sent == after {
                        yield Err(error());
                        return;
                    }
                }
                let next = (pos + chunk_size).min(end as usize);
                reads.fetch_add(1, Ordering::SeqCst);
                sent += 1;
                yield Ok(data.slice(pos..next));
                pos = next;
            }
        })
    }
}
