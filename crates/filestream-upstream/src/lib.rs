//! filestream-upstream: the remote media source.
//!
//! The server never talks to the media store directly; it is handed an
//! [`UpstreamSource`] at construction time. Two implementations ship here:
//!
//! - [`HttpSource`]: a message store reached over HTTP, read one ranged
//!   request per chunk
//! - [`LocalSource`]: files on local disk, for development and tests
//!
//! The `testing` feature adds an in-memory source with scriptable faults.

pub mod error;
pub mod http;
pub mod local;
pub mod media;
pub mod source;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{ErrorKind, UpstreamError, UpstreamResult};
pub use http::HttpSource;
pub use local::LocalSource;
pub use media::{Media, MediaFile, RemoteMedia, RemoteMessage};
pub use source::{ChunkStream, UpstreamSource};

use std::sync::Arc;

use filestream_core::config::{UpstreamBackend, UpstreamConfig};

/// Build the upstream source selected by configuration.
pub fn from_config(config: &UpstreamConfig) -> UpstreamResult<Arc<dyn UpstreamSource>> {
    let chunk_size = config.effective_chunk_size();
    Ok(match &config.backend {
        UpstreamBackend::Http(http) => Arc::new(HttpSource::new(http, chunk_size)?),
        UpstreamBackend::Local { root } => Arc::new(LocalSource::new(root, chunk_size)),
    })
}
