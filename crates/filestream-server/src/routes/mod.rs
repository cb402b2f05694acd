//! Route handlers for the HTTP surface.

pub mod files;
pub mod health;
pub mod stream;
