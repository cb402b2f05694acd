//! Axum router construction.
//!
//! Builds the application router with all routes and middleware layers.

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::cors::cors_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let inline = get(routes::stream::stream_inline).options(routes::stream::preflight);
    let download = get(routes::stream::stream_download).options(routes::stream::preflight);

    Router::new()
        .route("/", get(routes::health::status))
        .route("/api/file/{id}", get(routes::files::get_file))
        .route("/stream/{id}", inline.clone())
        .route("/watch/{id}", inline)
        .route("/dl/{id}", download)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn(cors_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
