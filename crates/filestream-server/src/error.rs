//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`filestream_core::Error`] so that route
//! handlers can return `Result<T, AppError>` directly.

use axum::http::header::CONTENT_RANGE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::streaming::headers::unsatisfied_range;
use crate::streaming::RangeError;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: filestream_core::Error,
}

impl AppError {
    pub fn new(inner: filestream_core::Error) -> Self {
        Self { inner }
    }
}

impl From<filestream_core::Error> for AppError {
    fn from(e: filestream_core::Error) -> Self {
        Self::new(e)
    }
}

impl From<RangeError> for AppError {
    fn from(e: RangeError) -> Self {
        tracing::debug!("Rejecting range: {e}");
        Self::new(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if let filestream_core::Error::RangeNotSatisfiable { total } = self.inner {
            return (
                status,
                [(CONTENT_RANGE, unsatisfied_range(total))],
                "416: Range not satisfiable",
            )
                .into_response();
        }

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in handler"
            );
        }

        let code = match &self.inner {
            filestream_core::Error::NotFound { .. } => "not_found",
            filestream_core::Error::RangeNotSatisfiable { .. } => "range_not_satisfiable",
            filestream_core::Error::Validation(_) => "validation_error",
            filestream_core::Error::Database { .. } => "database_error",
            filestream_core::Error::Io { .. } => "io_error",
            filestream_core::Error::Upstream(_) => "upstream_error",
            filestream_core::Error::Internal(_) => "internal_error",
        };

        let body = json!({
            "error": self.inner.to_string(),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
