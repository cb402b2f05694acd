//! The chunked stream driver.
//!
//! Pulls chunks from the upstream starting at the range start and forwards
//! them as a response body, stopping exactly when the byte budget
//! (`end - start + 1`) is spent. The body is lazy: a chunk is only fetched
//! when hyper polls for the next one, so a slow client throttles the
//! upstream reads.
//!
//! By the time the first chunk is requested the status line and
//! `Content-Length` are already committed, so upstream failures cannot be
//! reported. They end the body early instead and the client sees a short
//! read it can resume with a new `Range` request.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use bytes::Bytes;
use futures::{Stream, StreamExt};

use filestream_core::ByteRange;
use filestream_upstream::{RemoteMedia, UpstreamError, UpstreamSource};

/// Single-use driver for one response body.
pub struct StreamDriver {
    source: Arc<dyn UpstreamSource>,
    message_id: i64,
    handle: Option<RemoteMedia>,
    start: u64,
    budget: u64,
}

impl StreamDriver {
    /// Create a driver for `range` of the media in `message_id`.
    ///
    /// `handle` is the media handle opened during metadata resolution, if
    /// any; without one the driver opens its own before the first read.
    pub fn new(
        source: Arc<dyn UpstreamSource>,
        message_id: i64,
        handle: Option<RemoteMedia>,
        range: &ByteRange,
    ) -> Self {
        Self {
            source,
            message_id,
            handle,
            start: range.start(),
            budget: range.len(),
        }
    }

    /// Consume the driver into a response body.
    pub fn into_body(self) -> Body {
        Body::from_stream(self.into_stream())
    }

    /// Consume the driver into a lazy, budget-exact chunk stream.
    ///
    /// The stream never yields an error; every failure ends it early.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
        let StreamDriver {
            source,
            message_id,
            handle,
            start,
            budget,
        } = self;

        async_stream::stream! {
            let mut tally = Tally::new(message_id, budget);

            let media = match handle {
                Some(h) => h,
                None => match source.open_media(message_id).await {
                    Ok(h) => h,
                    Err(e) => {
                        log_failure(&e, &tally);
                        tally.finish();
                        return;
                    }
                },
            };

            let mut chunks = source.stream_chunks(&media, start, budget);
            while tally.remaining() > 0 {
                match chunks.next().await {
                    Some(Ok(chunk)) => {
                        let chunk = tally.clip(chunk);
                        if !chunk.is_empty() {
                            yield Ok(chunk);
                        }
                    }
                    Some(Err(e)) => {
                        log_failure(&e, &tally);
                        break;
                    }
                    None => {
                        tracing::debug!(
                            message_id,
                            sent = tally.sent,
                            budget,
                            "Upstream ended before the range was complete"
                        );
                        break;
                    }
                }
            }
            tally.finish();
        }
    }
}

/// Running byte count for one body. Logs on drop if the body was abandoned
/// before the driver finished, which is how a client disconnect shows up.
struct Tally {
    message_id: i64,
    budget: u64,
    sent: u64,
    finished: bool,
}

impl Tally {
    fn new(message_id: i64, budget: u64) -> Self {
        Self {
            message_id,
            budget,
            sent: 0,
            finished: false,
        }
    }

    fn remaining(&self) -> u64 {
        self.budget - self.sent
    }

    /// Cut `chunk` down to the remaining budget and count it as sent.
    fn clip(&mut self, chunk: Bytes) -> Bytes {
        let remaining = self.remaining();
        let chunk = if chunk.len() as u64 > remaining {
            // remaining < chunk.len() so it fits in usize.
            chunk.slice(..remaining as usize)
        } else {
            chunk
        };
        self.sent += chunk.len() as u64;
        chunk
    }

    fn finish(&mut self) {
        self.finished = true;
        tracing::trace!(
            message_id = self.message_id,
            sent = self.sent,
            budget = self.budget,
            "Stream finished"
        );
    }
}

impl Drop for Tally {
    fn drop(&mut self) {
        if !self.finished {
            tracing::trace!(
                message_id = self.message_id,
                sent = self.sent,
                budget = self.budget,
                "Client disconnected mid-stream"
            );
        }
    }
}

fn log_failure(err: &UpstreamError, tally: &Tally) {
    let (message_id, sent, budget) = (tally.message_id, tally.sent, tally.budget);
    let kind = err.kind();
    if err.is_expected() {
        tracing::debug!(message_id, sent, budget, ?kind, "Stream truncated by upstream: {err}");
    } else {
        tracing::warn!(
            message_id,
            sent,
            budget,
            ?kind,
            "Stream truncated by unexpected upstream error: {err}"
        );
    }
}
