//! Request-scoped media types: object metadata, byte ranges, and
//! content disposition.

use serde::{Deserialize, Serialize};
use std::fmt;

/// File name used when neither the upstream nor the stored record has one.
pub const DEFAULT_FILE_NAME: &str = "video.mp4";

/// MIME type used when neither the upstream nor the stored record has one.
pub const DEFAULT_MIME_TYPE: &str = "video/mp4";

/// Nominal size of a chunk requested from the upstream source (1 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// Size, display name, and MIME type of a streamable object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub size: u64,
    pub name: String,
    pub mime_type: String,
}

impl ObjectMetadata {
    /// Build metadata, substituting the generic defaults for missing or
    /// blank name and MIME type.
    pub fn with_defaults(size: u64, name: Option<&str>, mime_type: Option<&str>) -> Self {
        let pick = |v: Option<&str>, default: &str| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .to_owned()
        };
        Self {
            size,
            name: pick(name, DEFAULT_FILE_NAME),
            mime_type: pick(mime_type, DEFAULT_MIME_TYPE),
        }
    }
}

/// An inclusive byte interval `[start, end]` within an object of `total`
/// bytes.
///
/// Only [`ByteRange::new`] constructs one, so `start <= end < total`
/// always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start: u64,
    end: u64,
    total: u64,
}

impl ByteRange {
    /// Validate and build a range. Returns `None` unless
    /// `start <= end < total`.
    pub fn new(start: u64, end: u64, total: u64) -> Option<Self> {
        (start <= end && end < total).then_some(Self { start, end, total })
    }

    /// The whole object, `[0, total - 1]`. `None` for an empty object.
    pub fn full(total: u64) -> Option<Self> {
        total.checked_sub(1).and_then(|last| Self::new(0, last, total))
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of bytes covered: `end - start + 1`.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// A validated range always covers at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether the range spans the entire object.
    pub fn is_full(&self) -> bool {
        self.start == 0 && self.end + 1 == self.total
    }
}

impl fmt::Display for ByteRange {
    /// Formats as the `Content-Range` value `bytes {start}-{end}/{total}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

/// Whether a client should render the object inline or save it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
