// Connection handling module
// Admission against the connection cap and serving of a single TCP connection

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Counts live connections against an optional cap
#[derive(Debug, Clone)]
pub struct ConnectionLimiter {
    active: Arc<AtomicUsize>,
    max: Option<usize>,
}

/// Live connection slot, released on drop
#[derive(Debug)]
pub struct ConnectionPermit {
    active: Arc<AtomicUsize>,
}

impl ConnectionLimiter {
    pub fn new(max: Option<u64>) -> Self {
        Self {
            active: Arc::new(AtomicUsize::new(0)),
            max: max.map(|m| usize::try_from(m).unwrap_or(usize::MAX)),
        }
    }

    /// Claim a slot, or `None` when the cap is reached
    pub fn try_acquire(&self) -> Option<ConnectionPermit> {
        // Increment first, then check, so two racing accepts cannot both pass
        let prev = self.active.fetch_add(1, Ordering::SeqCst);
        if self.max.is_some_and(|max| prev >= max) {
            self.active.fetch_sub(1, Ordering::SeqCst);
            return None;
        }
        Some(ConnectionPermit {
            active: Arc::clone(&self.active),
        })
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for ConnectionPermit {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Serve one HTTP/1.1 connection until it closes or its lifetime runs out
///
/// A lifetime of zero leaves the connection unbounded. When `shutdown`
/// changes the connection finishes its current request and closes; an
/// idle keep-alive connection closes at once. Dropping the connection
/// drops any in-flight request future with it.
pub async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    lifetime: Duration,
    mut shutdown: watch::Receiver<bool>,
    _permit: ConnectionPermit,
) {
    let io = TokioIo::new(stream);

    let mut builder = http1::Builder::new();
    builder.keep_alive(true);

    let conn = builder.serve_connection(
        io,
        service_fn(move |req| handler::handle_request(req, Arc::clone(&state), peer_addr)),
    );
    tokio::pin!(conn);

    let served = async {
        tokio::select! {
            result = conn.as_mut() => return result,
            _ = shutdown.changed() => {}
        }
        conn.as_mut().graceful_shutdown();
        conn.await
    };

    if lifetime.is_zero() {
        if let Err(err) = served.await {
            logger::log_connection_error(&err);
        }
        return;
    }

    match tokio::time::timeout(lifetime, served).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => logger::log_connection_error(&err),
        Err(_) => logger::log_connection_timeout(&peer_addr),
    }
}
