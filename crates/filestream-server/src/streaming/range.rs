//! `Range` header parsing and validation.
//!
//! Only the single-range `bytes=<start>-[<end>]` form is accepted. Suffix
//! ranges (`bytes=-N`) and multi-range lists are rejected as malformed.

use filestream_core::ByteRange;

/// The interval a request asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// No `Range` header: the whole object, answered with 200.
    Full(ByteRange),
    /// A satisfiable `Range` header, answered with 206.
    Partial(ByteRange),
}

impl RangeRequest {
    pub fn range(&self) -> ByteRange {
        match self {
            RangeRequest::Full(r) | RangeRequest::Partial(r) => *r,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, RangeRequest::Partial(_))
    }
}

/// Why a `Range` header could not be honoured. Both cases render as 416.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("malformed Range header {header:?}")]
    Malformed { header: String, total: u64 },

    #[error("range {start}-{end:?} is outside an object of {total} bytes")]
    Unsatisfiable {
        start: u64,
        end: Option<u64>,
        total: u64,
    },
}

impl RangeError {
    /// Size of the object the range was checked against.
    pub fn total(&self) -> u64 {
        match self {
            RangeError::Malformed { total, .. } | RangeError::Unsatisfiable { total, .. } => *total,
        }
    }
}

impl From<RangeError> for filestream_core::Error {
    fn from(e: RangeError) -> Self {
        filestream_core::Error::RangeNotSatisfiable { total: e.total() }
    }
}

/// Resolve a `Range` header against an object of `total` bytes.
///
/// An absent or blank header selects the full object. An empty object has
/// no satisfiable range at all, with or without a header.
pub fn parse_range(header: Option<&str>, total: u64) -> Result<RangeRequest, RangeError> {
    let Some(header) = header.map(str::trim).filter(|h| !h.is_empty()) else {
        return ByteRange::full(total)
            .map(RangeRequest::Full)
            .ok_or(RangeError::Unsatisfiable {
                start: 0,
                end: None,
                total,
            });
    };

    let malformed = || RangeError::Malformed {
        header: header.to_owned(),
        total,
    };

    let spec = header.strip_prefix("bytes=").ok_or_else(malformed)?;
    let (start, end) = spec.split_once('-').ok_or_else(malformed)?;

    let start: u64 = start.trim().parse().map_err(|_| malformed())?;
    let end: Option<u64> = match end.trim() {
        "" => total.checked_sub(1),
        s => Some(s.parse().map_err(|_| malformed())?),
    };

    end.and_then(|end| ByteRange::new(start, end, total))
        .map(RangeRequest::Partial)
        .ok_or(RangeError::Unsatisfiable { start, end, total })
}
