//! Blocking `tiny_http` accept loop driven from async code.
//!
//! `recv_timeout` runs in `spawn_blocking` with a short poll interval so
//! the loop can notice the shutdown flag between requests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use certdb_db::CertDb;

use crate::error::ApiError;
use crate::handlers::{ApiResponse, handle};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub struct ApiServer {
    server: Arc<tiny_http::Server>,
    allowed_origin: String,
    shutdown: Arc<AtomicBool>,
}

impl ApiServer {
    /// Bind to `addr` (`host:port`; port `0` picks a free port).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Bind` if the address cannot be bound.
    pub fn bind(addr: &str, allowed_origin: &str) -> Result<Self, ApiError> {
        let server = tiny_http::Server::http(addr).map_err(|e| ApiError::Bind {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            server: Arc::new(server),
            allowed_origin: allowed_origin.to_string(),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Setting the returned flag stops [`Self::serve`] after the current
    /// poll interval.
    #[must_use]
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Answer requests until the shutdown flag is set.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Recv` if the blocking accept task panics. Receive
    /// errors are logged and the loop keeps going.
    pub async fn serve(&self, db: &CertDb) -> Result<(), ApiError> {
        tracing::info!(addr = ?self.local_addr(), origin = %self.allowed_origin, "API listening");
        while !self.shutdown.load(Ordering::Relaxed) {
            let server = Arc::clone(&self.server);
            let received = tokio::task::spawn_blocking(move || server.recv_timeout(POLL_INTERVAL))
                .await
                .map_err(|e| ApiError::Recv(format!("spawn_blocking join: {e}")))?;
            let Some(request) = accepted(received) else {
                continue;
            };

            let method = request.method().to_string();
            let target = request.url().to_string();
            let response = handle(db, &method, &target).await;
            tracing::info!(method = %method, path = %target, status = response.status, "request");
            self.respond(request, &response, method.eq_ignore_ascii_case("HEAD"));
        }
        tracing::info!("API stopped");
        Ok(())
    }

    fn respond(&self, request: tiny_http::Request, response: &ApiResponse, head: bool) {
        let body = if head { String::new() } else { response.body.to_string() };
        let mut reply = tiny_http::Response::from_string(body).with_status_code(response.status);
        for (name, value) in [
            ("Content-Type", "application/json"),
            ("Access-Control-Allow-Origin", self.allowed_origin.as_str()),
            ("Vary", "Origin"),
        ] {
            if let Ok(header) = tiny_http::Header::from_bytes(name, value) {
                reply.add_header(header);
            }
        }
        if let Err(error) = request.respond(reply) {
            tracing::warn!(%error, "failed to send response");
        }
    }
}

/// A failed accept is logged and skipped; the listener stays up.
fn accepted<T>(received: std::io::Result<Option<T>>) -> Option<T> {
    received.unwrap_or_else(|error| {
        tracing::warn!(%error, "failed to receive request");
        None
    })
}
