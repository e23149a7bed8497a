// Server module entry point
// Binding, the sequential accept loop, connection serving and shutdown signals

pub mod connection;
pub mod listener;
pub mod signal;

// Rust does not allow `loop` as a module name (keyword), so it is server_loop
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_reusable_listener;
pub use server_loop::start_server_loop;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{Config, ServeContext};
use crate::error::ServeError;
use crate::logger;

/// A bound, not yet serving, file server
pub struct Server {
    listener: TcpListener,
    ctx: Arc<ServeContext>,
}

impl Server {
    /// Resolve the serving root and bind the listen address.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(config: &Config) -> Result<Self, ServeError> {
        let ctx = Arc::new(ServeContext::new(config)?);
        let addr = config.server.socket_addr()?;
        let listener =
            create_reusable_listener(addr).map_err(|source| ServeError::Bind { addr, source })?;

        Ok(Self { listener, ctx })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn context(&self) -> &ServeContext {
        &self.ctx
    }

    /// Serve until `shutdown` resolves; the port is released on return
    pub async fn serve_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        start_server_loop(self.listener, self.ctx, shutdown).await;
    }
}

/// Bind, log the listening port and serve until SIGINT/SIGTERM
pub async fn run(config: Config) -> Result<(), ServeError> {
    let server = Server::bind(&config)?;
    logger::log_server_start(&server.local_addr()?, &server.context().root, &config);

    server.serve_until(signal::shutdown_signal()).await;
    logger::log_shutdown();
    Ok(())
}
