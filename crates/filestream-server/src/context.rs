//! Application context shared across route handlers.
//!
//! [`AppContext`] wraps the configuration and the two external
//! collaborators (lookup store and upstream source) in `Arc`s, so cloning
//! it per request is cheap. Nothing in it is mutated while serving.

use std::sync::Arc;
use std::time::Duration;

use filestream_core::config::Config;
use filestream_upstream::UpstreamSource;

use crate::store::LookupStore;
use crate::streaming::MetadataResolver;

/// Application context shared by all request handlers (via Axum state).
#[derive(Clone)]
pub struct AppContext {
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    /// Object ID lookup store.
    pub store: Arc<dyn LookupStore>,
    /// Upstream media source.
    pub source: Arc<dyn UpstreamSource>,
}

impl AppContext {
    pub fn new(
        config: Config,
        store: Arc<dyn LookupStore>,
        source: Arc<dyn UpstreamSource>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            source,
        }
    }

    /// A metadata resolver wired to this context's collaborators.
    pub fn resolver(&self) -> MetadataResolver {
        MetadataResolver::new(
            Arc::clone(&self.store),
            Arc::clone(&self.source),
            Duration::from_secs(self.config.upstream.metadata_timeout_secs),
        )
    }

    /// Public base URL without surrounding whitespace or slashes.
    pub fn public_base_url(&self) -> &str {
        self.config.server.public_url.trim().trim_matches('/')
    }
}
