//! HTTP protocol layer module
//!
//! Protocol helpers shared by the file handler: content types, conditional
//! requests, byte ranges and response builders.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::parse_range_header;
pub use response::{
    build_304_response, build_405_response, build_416_response, build_error_response,
    build_html_response, build_redirect_response,
};
