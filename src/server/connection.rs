// Connection handling module
// Serves one accepted TCP connection to completion

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;

use crate::config::ServeContext;
use crate::handler;
use crate::logger;

/// Serve a single connection and return once it is closed.
///
/// Keep-alive is off, so the connection carries exactly one request and the
/// accept loop moves on as soon as the response is written. The whole
/// exchange is bounded by the configured connection timeout.
///
/// # Arguments
///
/// * `stream` - The accepted TCP stream
/// * `peer_addr` - The peer's socket address, used for access logging
/// * `ctx` - Shared serving context
pub async fn serve_connection(stream: TcpStream, peer_addr: SocketAddr, ctx: &Arc<ServeContext>) {
    let io = TokioIo::new(stream);
    let timeout = ctx.connection_timeout;

    let service_ctx = Arc::clone(ctx);
    let service = service_fn(move |req| {
        handler::handle_request(req, Arc::clone(&service_ctx), peer_addr)
    });

    let mut builder = http1::Builder::new();
    builder.keep_alive(false);
    let conn = builder.serve_connection(io, service);

    match tokio::time::timeout(timeout, conn).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => logger::log_connection_error(&err),
        Err(_) => {
            logger::log_warning(&format!(
                "Connection from {peer_addr} timed out after {} seconds",
                timeout.as_secs()
            ));
        }
    }
}
