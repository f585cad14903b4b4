// Connection handling module
// Accepts a single TCP connection and serves HTTP/1.1 on it

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection if the connection limit allows it.
///
/// The counter is incremented before the limit check so concurrent accepts
/// cannot both slip under the limit; a rejected connection rolls it back.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    shutdown: watch::Receiver<bool>,
) {
    let counter = &state.active_connections;
    let prev_count = counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);
    handle_connection(stream, peer_addr, Arc::clone(state), shutdown);
}

/// Serve one connection on a spawned task.
///
/// Keep-alive is enabled when `keep_alive_timeout` is non-zero; headers must
/// arrive within `read_timeout`, and the whole connection is bounded by the
/// largest of the configured timeouts. Once `shutdown` turns true the
/// connection finishes its in-flight request and closes. The counter is
/// decremented when the connection ends.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let perf = &state.config.performance;
        let connection_timeout = Duration::from_secs(
            perf.read_timeout
                .max(perf.write_timeout)
                .max(perf.keep_alive_timeout),
        );

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .keep_alive(perf.keep_alive_timeout > 0)
            .header_read_timeout(Duration::from_secs(perf.read_timeout));

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| handler::handle_request(req, Arc::clone(&service_state), Some(peer_addr))),
        );

        let serve = async {
            tokio::pin!(conn);
            tokio::select! {
                result = conn.as_mut() => return result,
                _ = shutdown.wait_for(|stop| *stop) => conn.as_mut().graceful_shutdown(),
            }
            conn.await
        };

        match tokio::time::timeout(connection_timeout, serve).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    connection_timeout.as_secs()
                ));
            }
        }

        state.active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}
