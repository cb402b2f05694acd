//! Range-streamed media routes.
//!
//! `/stream/{id}` and `/watch/{id}` play inline, `/dl/{id}` downloads. A
//! request moves through resolve, validate, build headers, and stream.
//! Every failure up to the header build maps to a status code. Once the
//! body starts, failures can only shorten it (see [`StreamDriver`]).

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use filestream_core::{Disposition, ObjectId};

use crate::context::AppContext;
use crate::error::AppError;
use crate::streaming::headers::{build_headers, cors_headers, status_for};
use crate::streaming::{parse_range, StreamDriver};

/// GET /stream/{id}, GET /watch/{id}
pub async fn stream_inline(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    serve(ctx, id, &headers, Disposition::Inline).await
}

/// GET /dl/{id}
pub async fn stream_download(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    serve(ctx, id, &headers, Disposition::Attachment).await
}

/// OPTIONS on any stream route: CORS preflight, no lookup.
pub async fn preflight() -> impl IntoResponse {
    (StatusCode::OK, cors_headers())
}

async fn serve(
    ctx: AppContext,
    id: String,
    headers: &HeaderMap,
    disposition: Disposition,
) -> Result<Response, AppError> {
    let id: ObjectId = id.parse()?;
    let resolved = ctx.resolver().resolve(&id).await?;

    let range_header = headers
        .get(header::RANGE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
    let request = parse_range(range_header.as_deref(), resolved.metadata.size)?;
    let range = request.range();

    let response_headers = build_headers(&range, &resolved.metadata, disposition);

    tracing::debug!(
        %id,
        message_id = resolved.message_id,
        range = %range,
        %disposition,
        live = resolved.handle.is_some(),
        "Streaming object"
    );

    let body = StreamDriver::new(
        ctx.source.clone(),
        resolved.message_id,
        resolved.handle,
        &range,
    )
    .into_body();

    Ok((status_for(&request), response_headers, body).into_response())
}
