//! HTTP middleware: request ID and CORS.

pub mod cors;
pub mod request_id;
