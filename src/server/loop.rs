// Server loop module
// Accepts connections one at a time and serves each before accepting the next

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::serve_connection;
use crate::config::ServeContext;
use crate::logger;

/// Run the accept loop until `shutdown` resolves.
///
/// Connections are handled inline rather than spawned, so requests are
/// answered strictly in acceptance order. The listener is owned here and
/// dropped on return, releasing the port.
pub async fn start_server_loop<F>(listener: TcpListener, ctx: Arc<ServeContext>, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => break,

            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        logger::log_debug(&format!("Accepted connection from {peer_addr}"));
                        serve_connection(stream, peer_addr, &ctx).await;
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }
        }
    }

    drop(listener);
}
