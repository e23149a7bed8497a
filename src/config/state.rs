// Serving context module
// Everything the request handler needs, built once at startup and shared read-only

use std::path::PathBuf;
use std::time::Duration;

use super::types::Config;
use crate::error::ServeError;
use crate::http::mime::ExtensionMap;

/// Immutable per-process request context
#[derive(Debug, Clone)]
pub struct ServeContext {
    /// Canonical serving root; every served path must stay below it
    pub root: PathBuf,
    pub extensions: ExtensionMap,
    pub index_files: Vec<String>,
    pub directory_listing: bool,
    pub server_name: String,
    pub access_log: bool,
    pub access_log_format: String,
    pub connection_timeout: Duration,
}

impl ServeContext {
    pub fn new(config: &Config) -> Result<Self, ServeError> {
        let root = PathBuf::from(&config.files.root);
        let root = root
            .canonicalize()
            .map_err(|source| ServeError::Root { path: root, source })?;

        Ok(Self {
            root,
            extensions: ExtensionMap::with_overrides(&config.mime_types),
            index_files: config.files.index_files.clone(),
            directory_listing: config.files.directory_listing,
            server_name: config.http.server_name.clone(),
            access_log: config.logging.access_log,
            access_log_format: config.logging.access_log_format.clone(),
            connection_timeout: Duration::from_secs(config.performance.connection_timeout),
        })
    }
}
