//! CORS middleware.
//!
//! Every response, including errors, carries the same static CORS policy.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::streaming::headers::cors_headers;

/// Attach the static CORS headers to the response.
pub async fn cors_middleware(request: Request<axum::body::Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for (name, value) in cors_headers().iter() {
        headers.insert(name.clone(), value.clone());
    }
    response
}
