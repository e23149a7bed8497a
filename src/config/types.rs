// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::collections::HashMap;
use std::net::{SocketAddr, ToSocketAddrs};

use crate::error::ServeError;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub files: FilesConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    /// Extra extension → MIME entries merged into the built-in map
    #[serde(default)]
    pub mime_types: HashMap<String, String>,
}

/// Listen address
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Empty (or `*`) binds every interface
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ServeError> {
        let host = match self.host.trim() {
            "" | "*" => "0.0.0.0",
            h => h.trim_start_matches('[').trim_end_matches(']'),
        };

        (host, self.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ServeError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }
}

/// What gets served and how directories behave
#[derive(Debug, Deserialize, Clone)]
pub struct FilesConfig {
    pub root: String,
    #[serde(default = "default_index_files")]
    pub index_files: Vec<String>,
    pub directory_listing: bool,
}

fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string(), "index.htm".to_string()]
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    /// Total cap in seconds on one connection: reading the request and
    /// writing the whole response both count against it
    pub connection_timeout: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
}
