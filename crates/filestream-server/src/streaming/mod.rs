//! The range-aware streaming core: range parsing, metadata resolution,
//! response headers, and the chunked stream driver.

pub mod driver;
pub mod headers;
pub mod range;
pub mod resolver;

pub use driver::StreamDriver;
pub use range::{parse_range, RangeError, RangeRequest};
pub use resolver::{MetadataResolver, Resolved};
