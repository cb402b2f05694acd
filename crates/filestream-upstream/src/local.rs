//! Local-directory upstream source.
//!
//! Objects are plain files named `{message_id}_{file_name}` under a root
//! directory. Useful for development and for exercising the server without
//! network access.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::error::{UpstreamError, UpstreamResult};
use crate::media::{Media, MediaFile, RemoteMedia, RemoteMessage};
use crate::source::{ChunkStream, UpstreamSource};

/// Upstream source reading files from a directory.
pub struct LocalSource {
    root: PathBuf,
    chunk_size: u64,
}

impl LocalSource {
    pub fn new(root: impl AsRef<Path>, chunk_size: u64) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Find the file registered under `message_id`, returning its path and
    /// display name.
    async fn locate(&self, message_id: i64) -> UpstreamResult<Option<(PathBuf, String)>> {
        let prefix = format!("{message_id}_");
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(display) = name.strip_prefix(&prefix) {
                if entry.file_type().await?.is_file() {
                    return Ok(Some((entry.path(), display.to_owned())));
                }
            }
        }
        Ok(None)
    }

    fn path_for(&self, media: &RemoteMedia) -> UpstreamResult<PathBuf> {
        let name = media.media.file().file_name.as_deref().ok_or_else(|| {
            UpstreamError::Protocol(format!("message {} has no file name", media.message_id))
        })?;
        Ok(self.root.join(format!("{}_{name}", media.message_id)))
    }
}

#[async_trait]
impl UpstreamSource for LocalSource {
    async fn get_message(&self, message_id: i64) -> UpstreamResult<RemoteMessage> {
        let Some((path, name)) = self.locate(message_id).await? else {
            return Ok(RemoteMessage {
                id: message_id,
                media: None,
            });
        };

        let file_size = tokio::fs::metadata(&path).await?.len();
        let mime_type = guess_mime_type(&name);
        let file = MediaFile {
            file_size,
            file_name: Some(name),
            mime_type: Some(mime_type.to_owned()),
        };
        let media = if mime_type.starts_with("video/") {
            Media::Video(file)
        } else if mime_type.starts_with("audio/") {
            Media::Audio(file)
        } else {
            Media::Document(file)
        };

        Ok(RemoteMessage {
            id: message_id,
            media: Some(media),
        })
    }

    fn stream_chunks(&self, media: &RemoteMedia, offset: u64, limit: u64) -> ChunkStream {
        let path = self.path_for(media);
        let size = media.media.file().file_size;
        let capacity = usize::try_from(self.chunk_size).unwrap_or(usize::MAX);

        Box::pin(async_stream::stream! {
            let path = match path {
                Ok(p) => p,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            if offset >= size {
                yield Err(UpstreamError::OffsetInvalid { offset });
                return;
            }

            let mut file = match tokio::fs::File::open(&path).await {
                Ok(f) => f,
                Err(e) => {
                    yield Err(UpstreamError::Transport(e));
                    return;
                }
            };
            if let Err(e) = file.seek(SeekFrom::Start(offset)).await {
                yield Err(UpstreamError::Transport(e));
                return;
            }

            // Wrap in a Take to limit reads to exactly `limit` bytes.
            let mut chunks = ReaderStream::with_capacity(file.take(limit), capacity);
            while let Some(item) = chunks.next().await {
                yield item.map_err(UpstreamError::Transport);
            }
        })
    }
}

/// Guess the MIME type from a file name's extension.
pub fn guess_mime_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "webm" => "video/webm",
        "ts" => "video/mp2t",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "ogg" | "oga" => "audio/ogg",
        "m4a" => "audio/mp4",
        "srt" => "application/x-subrip",
        "zip" => "application/zip",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(files: &[(&str, &[u8])]) -> (tempfile::TempDir, LocalSource) {
        let dir = tempfile::tempdir().unwrap();
        for (name, data) in files {
            std::fs::write(dir.path().join(name), data).unwrap();
        }
        let source = LocalSource::new(dir.path(), 4);
        (dir, source)
    }

    async fn collect(stream: ChunkStream) -> (Vec<u8>, Vec<usize>, Option<UpstreamError>) {
        let mut bytes = Vec::new();
        let mut sizes = Vec::new();
        let mut stream = stream;
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    sizes.push(chunk.len());
                    bytes.extend_from_slice(&chunk);
                }
                Err(e) => return (bytes, sizes, Some(e)),
            }
        }
        (bytes, sizes, None)
    }

    #[tokio::test]
    async fn message_resolves_by_prefix() {
        let (_dir, source) = setup(&[("7_Episode 1.mkv", b"0123456789"), ("70_other.mp3", b"x")]);

        let media = source.open_media(7).await.unwrap();
        assert_eq!(media.media.kind_name(), "video");
        let meta = media.metadata();
        assert_eq!(meta.size, 10);
        assert_eq!(meta.name, "Episode 1.mkv");
        assert_eq!(meta.mime_type, "video/x-matroska");

        let audio = source.open_media(70).await.unwrap();
        assert_eq!(audio.media.kind_name(), "audio");
    }

    #[tokio::test]
    async fn unknown_message_has_no_media() {
        let (_dir, source) = setup(&[("1_a.bin", b"a")]);
        let msg = source.get_message(2).await.unwrap();
        assert!(msg.media.is_none());
        assert!(source.open_media(2).await.is_err());
    }

    #[tokio::test]
    async fn streams_window_in_chunks() {
        let (_dir, source) = setup(&[("3_data.bin", b"abcdefghijklmnop")]);
        let media = source.open_media(3).await.unwrap();

        let (bytes, sizes, err) = collect(source.stream_chunks(&media, 2, 9)).await;
        assert!(err.is_none());
        assert_eq!(bytes, b"cdefghijk");
        assert!(sizes.iter().all(|&n| n <= 4));
    }

    #[tokio::test]
    async fn offset_past_end_is_invalid() {
        let (_dir, source) = setup(&[("3_data.bin", b"abc")]);
        let media = source.open_media(3).await.unwrap();

        let (bytes, _, err) = collect(source.stream_chunks(&media, 3, 1)).await;
        assert!(bytes.is_empty());
        assert!(matches!(err, Some(UpstreamError::OffsetInvalid { offset: 3 })));
    }

    #[tokio::test]
    async fn vanished_file_is_transport_error() {
        let (dir, source) = setup(&[("3_data.bin", b"abc")]);
        let media = source.open_media(3).await.unwrap();
        std::fs::remove_file(dir.path().join("3_data.bin")).unwrap();

        let (_, _, err) = collect(source.stream_chunks(&media, 0, 3)).await;
        assert!(matches!(err, Some(UpstreamError::Transport(_))));
    }

    #[test]
    fn mime_guessing() {
        assert_eq!(guess_mime_type("movie.MKV"), "video/x-matroska");
        assert_eq!(guess_mime_type("movie.mp4"), "video/mp4");
        assert_eq!(guess_mime_type("song.flac"), "audio/flac");
        assert_eq!(guess_mime_type("README"), "application/octet-stream");
    }
}
