//! HTTP upstream source using reqwest.
//!
//! Messages live at `{base_url}/channels/{channel}/messages/{id}` and their
//! bytes at `.../content`. Content is read with one `Range` request per
//! chunk so that nothing is fetched before the consumer asks for it.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RANGE, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};

use filestream_core::config::HttpUpstreamConfig;

use crate::error::{UpstreamError, UpstreamResult};
use crate::media::{RemoteMedia, RemoteMessage};
use crate::source::{ChunkStream, UpstreamSource};

/// Longest backoff honoured from a `Retry-After` header.
const MAX_RETRY_AFTER_SECS: u64 = 30;

/// HTTP-backed upstream source.
pub struct HttpSource {
    client: Client,
    base_url: String,
    channel: String,
    max_retries: u32,
    chunk_size: u64,
}

impl HttpSource {
    /// Build a source from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the API token is not a valid header value or the
    /// client cannot be constructed.
    pub fn new(config: &HttpUpstreamConfig, chunk_size: u64) -> UpstreamResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(ref token) = config.api_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| UpstreamError::Other(format!("invalid api_token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("filestream/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            channel: config.channel.clone(),
            max_retries: config.max_retries,
            chunk_size: chunk_size.max(1),
        })
    }

    fn message_url(&self, message_id: i64) -> String {
        format!(
            "{}/channels/{}/messages/{message_id}",
            self.base_url, self.channel
        )
    }

    async fn get_message_once(&self, message_id: i64) -> UpstreamResult<RemoteMessage> {
        let response = self.client.get(self.message_url(message_id)).send().await?;
        let response = check_status(response, 0)?;
        Ok(response.json::<RemoteMessage>().await?)
    }
}

#[async_trait]
impl UpstreamSource for HttpSource {
    /// Fetch a message, retrying backoff signals and transport failures.
    async fn get_message(&self, message_id: i64) -> UpstreamResult<RemoteMessage> {
        let mut attempt = 0;
        loop {
            let err = match self.get_message_once(message_id).await {
                Ok(msg) => return Ok(msg),
                Err(e) => e,
            };

            let delay = match &err {
                UpstreamError::RateLimited { retry_after_secs } => {
                    Duration::from_secs((*retry_after_secs).min(MAX_RETRY_AFTER_SECS))
                }
                // Exponential backoff: 100ms, 200ms, 400ms, ...
                UpstreamError::Transport(_) => Duration::from_millis(100 << attempt.min(6)),
                _ => return Err(err),
            };

            if attempt >= self.max_retries {
                return Err(err);
            }
            attempt += 1;
            tracing::debug!(message_id, attempt, "Retrying upstream message fetch: {err}");
            tokio::time::sleep(delay).await;
        }
    }

    fn stream_chunks(&self, media: &RemoteMedia, offset: u64, limit: u64) -> ChunkStream {
        let client = self.client.clone();
        let url = format!("{}/content", self.message_url(media.message_id));
        let chunk_size = self.chunk_size;
        let max_piece = usize::try_from(chunk_size).unwrap_or(usize::MAX);

        Box::pin(async_stream::stream! {
            let mut pos = offset;
            let mut remaining = limit;
            while remaining > 0 {
                let want = remaining.min(chunk_size);
                let response = match open_range(&client, &url, pos, pos + want - 1).await {
                    Ok(r) => r,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                };

                // The body is pulled incrementally and cut off at `want`, so
                // an upstream that ignores or overshoots the range costs at
                // most one transport read beyond it.
                let mut body = response.bytes_stream();
                let mut got = 0u64;
                while got < want {
                    match body.next().await {
                        Some(Ok(piece)) => {
                            let take = (want - got).min(piece.len() as u64) as usize;
                            let mut piece = piece.slice(..take);
                            got += take as u64;
                            while !piece.is_empty() {
                                let part = piece.split_to(piece.len().min(max_piece));
                                yield Ok(part);
                            }
                        }
                        Some(Err(e)) => {
                            yield Err(UpstreamError::from(e));
                            return;
                        }
                        None => break,
                    }
                }
                drop(body);

                if got == 0 {
                    break;
                }
                pos += got;
                remaining -= got;
            }
        })
    }
}

/// Issue a single range request for `[start, end]` and validate the status.
async fn open_range(client: &Client, url: &str, start: u64, end: u64) -> UpstreamResult<Response> {
    let response = client
        .get(url)
        .header(RANGE, format!("bytes={start}-{end}"))
        .send()
        .await?;
    let response = check_status(response, start)?;

    // A 200 means the Range header was ignored and the body starts at zero.
    if response.status() != StatusCode::PARTIAL_CONTENT && start != 0 {
        return Err(UpstreamError::Protocol(format!(
            "expected 206 for offset {start}, got {}",
            response.status()
        )));
    }

    Ok(response)
}

/// Map non-success responses onto the upstream error taxonomy.
fn check_status(response: Response, offset: u64) -> UpstreamResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    Err(match status {
        StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited {
            retry_after_secs: response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(1),
        },
        StatusCode::RANGE_NOT_SATISFIABLE => UpstreamError::OffsetInvalid { offset },
        other => UpstreamError::Protocol(format!(
            "upstream returned {}",
            other.canonical_reason().unwrap_or(other.as_str())
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::media::{Media, MediaFile};

    fn source(server: &MockServer, chunk_size: u64, max_retries: u32) -> HttpSource {
        let config = HttpUpstreamConfig {
            base_url: format!("{}/", server.uri()),
            channel: "store".into(),
            api_token: Some("secret".into()),
            timeout_secs: 5,
            max_retries,
        };
        HttpSource::new(&config, chunk_size).unwrap()
    }

    fn handle(size: u64) -> RemoteMedia {
        RemoteMedia {
            message_id: 5,
            media: Media::Document(MediaFile {
                file_size: size,
                file_name: Some("f.bin".into()),
                mime_type: None,
            }),
        }
    }

    #[tokio::test]
    async fn get_message_parses_media() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/store/messages/5"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 5,
                "media": {"type": "video", "file": {"file_size": 10, "file_name": "a.mp4"}}
            })))
            .mount(&server)
            .await;

        let media = source(&server, 4, 0).open_media(5).await.unwrap();
        assert_eq!(media.media.file().file_size, 10);
    }

    #[tokio::test]
    async fn get_message_not_found_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = source(&server, 4, 3).get_message(5).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Protocol(_)));
    }

    #[tokio::test]
    async fn get_message_retries_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/store/messages/5"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/channels/store/messages/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 5})))
            .mount(&server)
            .await;

        let msg = source(&server, 4, 2).get_message(5).await.unwrap();
        assert_eq!(msg.id, 5);
        assert!(msg.media.is_none());
    }

    #[tokio::test]
    async fn get_message_gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .expect(2)
            .mount(&server)
            .await;

        let err = source(&server, 4, 1).get_message(5).await.unwrap_err();
        assert!(matches!(err, UpstreamError::RateLimited { retry_after_secs: 0 }));
    }

    #[tokio::test]
    async fn stream_chunks_issues_one_range_per_chunk() {
        let server = MockServer::start().await;
        let content = "/channels/store/messages/5/content";
        for (range, body) in [("bytes=2-5", "cdef"), ("bytes=6-8", "ghi")] {
            Mock::given(method("GET"))
                .and(path(content))
                .and(header("range", range))
                .respond_with(ResponseTemplate::new(206).set_body_string(body))
                .expect(1)
                .mount(&server)
                .await;
        }

        let chunks: Vec<_> = source(&server, 4, 0)
            .stream_chunks(&handle(10), 2, 7)
            .collect()
            .await;
        let bytes: Vec<u8> = chunks
            .into_iter()
            .flat_map(|c| c.unwrap().to_vec())
            .collect();
        assert_eq!(bytes, b"cdefghi");
    }

    #[tokio::test]
    async fn stream_chunks_reports_offset_invalid_and_stops() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(416))
            .expect(1)
            .mount(&server)
            .await;

        let items: Vec<_> = source(&server, 4, 3)
            .stream_chunks(&handle(10), 8, 8)
            .collect()
            .await;
        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(UpstreamError::OffsetInvalid { offset: 8 })
        ));
    }

    #[tokio::test]
    async fn ignored_range_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("whole-file"))
            .mount(&server)
            .await;

        let items: Vec<_> = source(&server, 4, 0)
            .stream_chunks(&handle(10), 4, 4)
            .collect()
            .await;
        assert!(matches!(items[0], Err(UpstreamError::Protocol(_))));
    }

    #[tokio::test]
    async fn oversized_full_body_is_cut_at_chunk_size() {
        let server = MockServer::start().await;
        let body: Vec<u8> = (0..8 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let items: Vec<_> = source(&server, 4, 0)
            .stream_chunks(&handle(body.len() as u64), 0, 10)
            .collect()
            .await;

        // Offset 0 tolerates the ignored range but reads only one chunk of it;
        // the follow-up request at offset 4 must be ranged.
        assert_eq!(items.len(), 2);
        match &items[0] {
            Ok(chunk) => assert_eq!(chunk.as_ref(), &body[..4]),
            Err(e) => panic!("unexpected error: {e}"),
        }
        assert!(matches!(items[1], Err(UpstreamError::Protocol(_))));
    }

    #[tokio::test]
    async fn overshooting_partial_responses_are_clipped() {
        let server = MockServer::start().await;
        let data: Vec<u8> = (0..200u8).collect();
        for (range, start) in [("bytes=0-3", 0usize), ("bytes=4-7", 4), ("bytes=8-9", 8)] {
            Mock::given(method("GET"))
                .and(header("range", range))
                .respond_with(
                    ResponseTemplate::new(206).set_body_bytes(data[start..start + 64].to_vec()),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        let chunks: Vec<_> = source(&server, 4, 0)
            .stream_chunks(&handle(200), 0, 10)
            .collect()
            .await;
        let mut bytes = Vec::new();
        for chunk in chunks {
            let chunk = chunk.unwrap();
            assert!(chunk.len() <= 4);
            bytes.extend_from_slice(&chunk);
        }
        assert_eq!(bytes, &data[..10]);
    }

    #[tokio::test]
    async fn stream_is_lazy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(206).set_body_string("abcd"))
            .expect(0)
            .mount(&server)
            .await;

        let stream = source(&server, 4, 0).stream_chunks(&handle(10), 0, 8);
        drop(stream);
    }
}
