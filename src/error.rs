//! Error types
//!
//! `ServeError` is process-fatal and ends up on stderr from `main`.
//! `RequestError` never leaves the request handler: it is turned into a
//! status response at the handler boundary.

use hyper::StatusCode;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Startup failures
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid listen address '{0}'")]
    InvalidAddress(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("cannot serve directory '{}': {source}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open log file: {0}")]
    Logger(#[source] io::Error),

    #[error("failed to start runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Per-request failures
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("path escapes the serving root: {0}")]
    Traversal(String),

    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RequestError {
    /// Classify an I/O error raised while touching `path`
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => {
                Self::NotFound(path.to_path_buf())
            }
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Traversal(_) | Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
