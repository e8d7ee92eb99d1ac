// Server module entry
// Accept loop, connection handling and graceful shutdown

pub mod connection;
pub mod listener;
pub mod signal;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::AppState;
use crate::logger;

pub use connection::{ConnectionLimiter, ConnectionPermit};
pub use listener::create_reusable_listener;
pub use signal::shutdown_signal;

/// Accept connections until `shutdown` resolves, then drain
///
/// Open connections are told to close after their current request.
/// Returns once every connection task has finished.
pub async fn serve<S>(listener: TcpListener, state: Arc<AppState>, shutdown: S)
where
    S: Future<Output = ()>,
{
    let limiter = ConnectionLimiter::new(state.config.performance.max_connections);
    let lifetime = Duration::from_secs(state.config.performance.connection_timeout);
    let (drain_tx, drain_rx) = tokio::sync::watch::channel(false);
    let mut tasks = tokio::task::JoinSet::new();

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                logger::log_shutdown_started(tasks.len());
                break;
            }

            accepted = listener.accept() => {
                let (stream, peer_addr) = match accepted {
                    Ok(v) => v,
                    Err(e) => {
                        logger::log_accept_error(&e);
                        continue;
                    }
                };
                let Some(permit) = limiter.try_acquire() else {
                    logger::log_connection_refused(&peer_addr, limiter.active());
                    drop(stream);
                    continue;
                };
                tracing::trace!(peer = %peer_addr, "connection accepted");
                tasks.spawn(connection::serve_connection(
                    stream,
                    peer_addr,
                    Arc::clone(&state),
                    lifetime,
                    drain_rx.clone(),
                    permit,
                ));
            }

            // Reap finished tasks so the set stays small
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    drop(listener);
    drain_tx.send_replace(true);
    while tasks.join_next().await.is_some() {}
    logger::log_shutdown_complete();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handler::upstream::UreqUpstream;
    use crate::store::MemoryAssetStore;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn roundtrip(addr: std::net::SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let config = Config::load_with("does-not-exist/spa-edge", |_| None).unwrap();
        let assets = Arc::new(
            MemoryAssetStore::new()
                .with_asset("/index.html", "<html>shell</html>")
                .with_asset("/app.js", "console.log(1)"),
        );
        let upstream = Arc::new(UreqUpstream::new(Duration::from_secs(1)));
        let state = Arc::new(AppState::with_parts(config, assets, upstream).unwrap());

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap(), 16).unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, state, async {
            let _ = stop_rx.await;
        }));

        let asset = roundtrip(addr, "GET /app.js HTTP/1.1\r\nHost: shop.test\r\nConnection: close\r\n\r\n").await;
        assert!(asset.starts_with("HTTP/1.1 200"), "{asset}");
        assert!(asset.ends_with("console.log(1)"));

        let deep_link = roundtrip(
            addr,
            "GET /blog/post-1 HTTP/1.1\r\nHost: shop.test\r\nAccept: text/html\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(deep_link.ends_with("<html>shell</html>"), "{deep_link}");

        let api = roundtrip(addr, "GET /api/health HTTP/1.1\r\nHost: shop.test\r\nConnection: close\r\n\r\n").await;
        assert!(api.to_ascii_lowercase().contains("access-control-allow-origin: *"));
        assert!(api.ends_with(r#"{"ok":true}"#));

        stop_tx.send(()).unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_idle_keep_alive_connection_does_not_hold_shutdown() {
        let mut config = Config::load_with("does-not-exist/spa-edge", |_| None).unwrap();
        config.performance.connection_timeout = 0;
        let assets = Arc::new(MemoryAssetStore::new().with_asset("/app.js", "console.log(1)"));
        let upstream = Arc::new(UreqUpstream::new(Duration::from_secs(1)));
        let state = Arc::new(AppState::with_parts(config, assets, upstream).unwrap());

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap(), 16).unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, state, async {
            let _ = stop_rx.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /app.js HTTP/1.1\r\nHost: shop.test\r\n\r\n")
            .await
            .unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.ends_with(b"console.log(1)") {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before the response arrived");
            buf.extend_from_slice(&chunk[..n]);
        }

        stop_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("shutdown waited on an idle connection")
            .unwrap();

        // The server side closed the kept-alive connection
        assert_eq!(stream.read(&mut chunk).await.unwrap(), 0);
    }
}
