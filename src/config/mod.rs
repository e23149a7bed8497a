// Configuration module entry point
// Loads layered configuration and builds the immutable serving context

mod state;
mod types;

pub use state::ServeContext;
pub use types::{Config, FilesConfig, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

use crate::cli::Cli;
use crate::error::ServeError;

pub const DEFAULT_PORT: u16 = 8000;

/// Looked up in the working directory when `--config` is not given
const DEFAULT_CONFIG_NAME: &str = "servetool";

impl Config {
    /// Load configuration: defaults, then the config file, then `SERVETOOL_*`
    /// environment variables, then command-line flags.
    pub fn load(cli: &Cli) -> Result<Self, ServeError> {
        let file = match &cli.config {
            Some(path) => config::File::from(path.as_path()).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let mut builder = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("SERVETOOL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("files.root", ".")?
            .set_default("files.directory_listing", true)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "common")?
            .set_default("performance.connection_timeout", 30)?
            .set_default("http.server_name", concat!("servetool/", env!("CARGO_PKG_VERSION")))?;

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(ref host) = cli.bind {
            builder = builder.set_override("server.host", host.as_str())?;
        }
        if let Some(ref dir) = cli.directory {
            builder = builder.set_override("files.root", dir.to_string_lossy().into_owned())?;
        }

        Ok(builder.build()?.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};

    // Loading reads the process environment; tests that touch it run one at a time
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_guard() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn test_defaults() {
        let _env = env_guard();
        let cfg = Config::load(&Cli::parse_from(["servetool"])).unwrap();
        assert_eq!(cfg.server.port, DEFAULT_PORT);
        assert_eq!(cfg.server.host, "");
        assert_eq!(cfg.files.root, ".");
        assert_eq!(cfg.files.index_files, vec!["index.html", "index.htm"]);
        assert!(cfg.files.directory_listing);
        assert_eq!(cfg.logging.access_log_format, "common");
        assert!(cfg.mime_types.is_empty());
        assert_eq!(cfg.performance.connection_timeout, 30);
    }

    #[test]
    fn test_cli_overrides() {
        let _env = env_guard();
        let cli = Cli::parse_from(["servetool", "-p", "9123", "-b", "127.0.0.1", "-d", "/srv"]);
        let cfg = Config::load(&cli).unwrap();
        assert_eq!(cfg.server.port, 9123);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.files.root, "/srv");
    }

    #[test]
    fn test_config_file_and_cli_precedence() {
        let _env = env_guard();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8100

[files]
root = "public"
directory_listing = false

[mime_types]
data = "application/x-data"
"#
        )
        .unwrap();

        let path = file.path().to_string_lossy().into_owned();
        let cfg = Config::load(&Cli::parse_from(["servetool", "-c", path.as_str()])).unwrap();
        assert_eq!(cfg.server.port, 8100);
        assert_eq!(cfg.files.root, "public");
        assert!(!cfg.files.directory_listing);
        assert_eq!(
            cfg.mime_types.get("data").map(String::as_str),
            Some("application/x-data")
        );

        let cfg =
            Config::load(&Cli::parse_from(["servetool", "-c", path.as_str(), "-p", "8200"])).unwrap();
        assert_eq!(cfg.server.port, 8200);
    }

    #[test]
    fn test_environment_layer() {
        let _env = env_guard();
        std::env::set_var("SERVETOOL_SERVER__PORT", "9321");
        std::env::set_var("SERVETOOL_FILES__DIRECTORY_LISTING", "false");
        std::env::set_var("SERVETOOL_PERFORMANCE__CONNECTION_TIMEOUT", "90");

        let from_env = Config::load(&Cli::parse_from(["servetool"]));
        let cli_over_env = Config::load(&Cli::parse_from(["servetool", "-p", "9400"]));

        std::env::remove_var("SERVETOOL_SERVER__PORT");
        std::env::remove_var("SERVETOOL_FILES__DIRECTORY_LISTING");
        std::env::remove_var("SERVETOOL_PERFORMANCE__CONNECTION_TIMEOUT");

        let cfg = from_env.unwrap();
        assert_eq!(cfg.server.port, 9321);
        assert!(!cfg.files.directory_listing);
        assert_eq!(cfg.performance.connection_timeout, 90);

        let cfg = cli_over_env.unwrap();
        assert_eq!(cfg.server.port, 9400);
        assert!(!cfg.files.directory_listing);
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let _env = env_guard();
        let cli = Cli::parse_from(["servetool", "-c", "/nonexistent/servetool.toml"]);
        assert!(matches!(Config::load(&cli), Err(ServeError::Config(_))));
    }
}
