//! Response header construction for streamed objects.

use axum::http::header::{
    ACCEPT_RANGES, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE,
    CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE,
};
use axum::http::{HeaderMap, HeaderValue, StatusCode};

use filestream_core::{ByteRange, Disposition, ObjectMetadata};

use super::range::RangeRequest;

/// The static CORS policy attached to every response.
pub fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(5);
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS, HEAD"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Range, User-Agent, X-Requested-With"),
    );
    headers.insert(
        ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("Content-Length, Content-Range, Content-Disposition"),
    );
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    headers
}

/// Headers for a successful (200 or 206) streamed response.
///
/// `Content-Range` is sent even on full-object responses; some players
/// rely on it.
pub fn build_headers(range: &ByteRange, meta: &ObjectMetadata, disposition: Disposition) -> HeaderMap {
    let mut headers = cors_headers();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_str(&meta.mime_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(CONTENT_RANGE, header_value(range.to_string()));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(range.len()));
    headers.insert(
        CONTENT_DISPOSITION,
        content_disposition(disposition, &meta.name),
    );
    headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers
}

/// `Content-Range` for a 416 response: `bytes */{total}`.
pub fn unsatisfied_range(total: u64) -> HeaderValue {
    header_value(format!("bytes */{total}"))
}

/// 206 when the client sent a `Range` header, 200 otherwise.
pub fn status_for(request: &RangeRequest) -> StatusCode {
    if request.is_partial() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    }
}

/// `{disposition}; filename="{name}"`.
///
/// Names are sent as raw UTF-8 (obs-text); quotes and control characters
/// are replaced so the value stays a single well-formed header.
fn content_disposition(disposition: Disposition, name: &str) -> HeaderValue {
    let name: String = name
        .chars()
        .map(|c| match c {
            '"' => '\'',
            '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let value = format!("{disposition}; filename=\"{name}\"");
    HeaderValue::from_bytes(value.as_bytes())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

// Values built here from digits and ASCII punctuation are always valid.
fn header_value(s: String) -> HeaderValue {
    HeaderValue::try_from(s).unwrap_or_else(|_| HeaderValue::from_static(""))
}
