//! Request handler module
//!
//! Method validation, path resolution and file serving.

pub mod listing;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
