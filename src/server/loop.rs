// Server loop module
// Accepts connections until shutdown is requested, then drains

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{watch, Notify};

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept connections on `listener` until `shutdown` is notified.
///
/// After shutdown the listener is closed, open connections are told to
/// close once idle, and they get up to `performance.write_timeout` seconds
/// to finish.
#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop(listener: TcpListener, state: Arc<AppState>, shutdown: Arc<Notify>) {
    let (stop_tx, stop_rx) = watch::channel(false);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, stop_rx.clone());
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }
            _ = shutdown.notified() => break,
        }
    }

    drop(listener);
    stop_tx.send_replace(true);
    let grace = Duration::from_secs(state.config.performance.write_timeout);
    drain_connections(&state, grace).await;
}

/// Wait until no connection is active or `grace` elapses
async fn drain_connections(state: &AppState, grace: Duration) {
    let deadline = tokio::time::Instant::now() + grace;
    loop {
        let active = state.active_connections.load(Ordering::SeqCst);
        if active == 0 {
            logger::log_shutdown("All connections closed", 0);
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            logger::log_shutdown("Grace period elapsed", active);
            return;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn test_state() -> Arc<AppState> {
        let mut cfg = Config::from_defaults().unwrap();
        cfg.logging.access_log = false;
        cfg.performance.write_timeout = 1;
        cfg.app.hostname = Some("loop-test".to_string());
        Arc::new(AppState::new(&cfg).unwrap())
    }

    async fn raw_request(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8_lossy(&response).into_owned()
    }

    #[tokio::test]
    async fn test_serves_api_over_tcp_and_shuts_down() {
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let state = test_state();
        let shutdown = Arc::new(Notify::new());
        let server = tokio::spawn(start_server_loop(
            listener,
            Arc::clone(&state),
            Arc::clone(&shutdown),
        ));

        let body = r#"{"conversion_type":"1","value":1000}"#;
        let request = format!(
            "POST /convert-api HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let response = raw_request(addr, &request).await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.contains(r#""result":1.0"#), "{response}");
        assert!(response.contains(r#""success":true"#), "{response}");

        let page = raw_request(
            addr,
            &format!("GET / HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n"),
        )
        .await;
        assert!(page.starts_with("HTTP/1.1 200"));
        assert!(page.contains("loop-test"));

        shutdown.notify_one();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_closes_idle_keep_alive_connections() {
        let mut cfg = Config::from_defaults().unwrap();
        cfg.logging.access_log = false;
        cfg.performance.write_timeout = 30;
        let state = Arc::new(AppState::new(&cfg).unwrap());

        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let server = tokio::spawn(start_server_loop(
            listener,
            Arc::clone(&state),
            Arc::clone(&shutdown),
        ));

        // One answered request, then the connection sits idle in keep-alive
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(format!("GET /healthz HTTP/1.1\r\nHost: {addr}\r\n\r\n").as_bytes())
            .await
            .unwrap();
        let mut response = Vec::new();
        let mut buf = [0u8; 512];
        while !response.ends_with(b"\r\n\r\nok") {
            let n = stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed before the response");
            response.extend_from_slice(&buf[..n]);
        }
        assert_eq!(state.active_connections.load(Ordering::SeqCst), 1);

        shutdown.notify_one();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("drain waited for the idle connection")
            .unwrap();
        assert_eq!(state.active_connections.load(Ordering::SeqCst), 0);
        assert_eq!(stream.read(&mut buf).await.unwrap_or(0), 0);
    }

    #[tokio::test]
    async fn test_connection_limit_rejects_extra_clients() {
        let mut cfg = Config::from_defaults().unwrap();
        cfg.logging.access_log = false;
        cfg.performance.max_connections = Some(0);
        cfg.performance.write_timeout = 1;
        let state = Arc::new(AppState::new(&cfg).unwrap());

        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let server = tokio::spawn(start_server_loop(
            listener,
            Arc::clone(&state),
            Arc::clone(&shutdown),
        ));

        // The server closes the socket without answering; depending on timing
        // the client sees EOF or a reset.
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let _ = stream
            .write_all(format!("GET / HTTP/1.1\r\nHost: {addr}\r\n\r\n").as_bytes())
            .await;
        let mut buf = [0u8; 64];
        let read = stream.read(&mut buf).await.unwrap_or(0);
        assert_eq!(read, 0);
        assert_eq!(state.active_connections.load(Ordering::SeqCst), 0);

        shutdown.notify_one();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap();
    }
}
