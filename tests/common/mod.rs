//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which wires an in-memory DB and a scriptable
//! [`MemorySource`] into a full [`AppContext`]. Requests go through the real
//! router via `oneshot`; [`TestHarness::with_server`] starts Axum on a random
//! port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use tower::ServiceExt;

use filestream_core::config::Config;
use filestream_core::ObjectId;
use filestream_db::models::NewFile;
use filestream_db::pool::{get_conn, init_memory_pool, DbPool};
use filestream_db::queries::files;
use filestream_server::context::AppContext;
use filestream_server::router::build_router;
use filestream_server::store::SqliteLookupStore;
use filestream_upstream::testing::MemorySource;

/// Deterministic, position-dependent payload so slices can be checked.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// A fully collected response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub source: Arc<MemorySource>,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new(source: MemorySource) -> Self {
        Self::with_config(Config::default(), source)
    }

    /// Create a new harness with a custom configuration.
    pub fn with_config(config: Config, source: MemorySource) -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let source = Arc::new(source);
        let ctx = AppContext::new(
            config,
            Arc::new(SqliteLookupStore::new(db.clone())),
            source.clone(),
        );
        Self { ctx, db, source }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server(source: MemorySource) -> (Self, SocketAddr) {
        let harness = Self::new(source);
        let app = harness.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    pub fn router(&self) -> Router {
        build_router(self.ctx.clone())
    }

    /// Insert a lookup record and return its object ID.
    pub fn add_file(&self, new: NewFile) -> ObjectId {
        let conn = get_conn(&self.db).expect("failed to get connection");
        files::insert_file(&conn, new)
            .expect("failed to insert file")
            .id
    }

    /// Insert a minimal record pointing at `message_id`.
    pub fn add_message(&self, message_id: i64) -> ObjectId {
        self.add_file(NewFile {
            message_id,
            ..Default::default()
        })
    }

    /// Insert a record with no upstream message reference.
    pub fn add_orphan(&self, id: &str) -> ObjectId {
        get_conn(&self.db)
            .expect("failed to get connection")
            .execute(
                "INSERT INTO files (id, created_at) VALUES (?1, '2024-01-01T00:00:00Z')",
                [id],
            )
            .expect("failed to insert orphan record");
        id.parse().expect("invalid object id")
    }

    /// Send a request through the router and collect the whole body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let req = builder.body(Body::empty()).unwrap();

        let resp = self.router().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, &[]).await
    }

    pub async fn get_range(&self, uri: &str, range: &str) -> TestResponse {
        self.request(Method::GET, uri, &[("range", range)]).await
    }
}
