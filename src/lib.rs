//! servetool
//!
//! A small static file server for local testing. Serves the working directory
//! (or a chosen root) over HTTP/1.1 with a fixed extension map so that
//! `.wasm` binaries reach the browser as `application/wasm`.

pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
