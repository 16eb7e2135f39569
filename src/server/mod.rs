//! HTTP panel host for the learning assistant.
//!
//! Provides REST endpoints for:
//! - Opening and closing chat panels
//! - Editing the draft and submitting questions
//! - Reading a panel's conversation log
//!
//! Binding and serving are split so callers (and tests) can bind port 0 and
//! learn the real address before traffic starts.

pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Address the host listens on for `port`, on every interface.
#[must_use]
pub fn listen_addr(port: u16) -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], port))
}

/// API router with CORS and request tracing applied.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// A panel host bound to its socket, not yet serving.
pub struct PanelHost {
    listener: TcpListener,
    app: Router,
    backend_url: String,
}

impl PanelHost {
    /// Bind `addr` for the given state.
    ///
    /// # Errors
    /// Returns an error if the address cannot be bound.
    pub async fn bind(state: Arc<AppState>, addr: SocketAddr) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let backend_url = state.config.backend_url.clone();
        Ok(Self {
            listener,
            app: build_app(state),
            backend_url,
        })
    }

    /// Address actually bound (resolves port 0).
    ///
    /// # Errors
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown_signal` completes, then drain open connections.
    ///
    /// # Errors
    /// Returns an error if the server stops on an I/O failure.
    pub async fn serve<F>(self, shutdown_signal: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        tracing::info!(
            backend = %self.backend_url,
            "Learning assistant panel host listening on http://{}",
            addr
        );

        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(shutdown_signal)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatBackend, ChatConfig, ChatRequest, ChatResult};
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct SilentBackend;

    #[async_trait]
    impl ChatBackend for SilentBackend {
        async fn send(&self, _request: &ChatRequest) -> ChatResult<Value> {
            Ok(json!({"response": "ok"}))
        }
    }

    #[test]
    fn test_listen_addr_covers_all_interfaces() {
        let addr = listen_addr(DEFAULT_PORT);
        assert!(addr.ip().is_unspecified());
        assert_eq!(addr.port(), 3000);
    }

    #[tokio::test]
    async fn test_host_serves_on_ephemeral_port_and_shuts_down() {
        let state = AppState::with_backend(ChatConfig::new(), Arc::new(SilentBackend));
        let host = PanelHost::bind(state, SocketAddr::from(([127, 0, 0, 1], 0))).await;
        assert!(host.is_ok());
        let Ok(host) = host else { return };

        let addr = host.local_addr().ok();
        assert!(addr.is_some_and(|a| a.port() != 0));

        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(host.serve(async {
            let _ = stopped.await;
        }));

        let health = match addr {
            Some(addr) => reqwest::get(format!("http://{addr}/health")).await.ok(),
            None => None,
        };
        let status = health.as_ref().map(reqwest::Response::status);
        assert_eq!(status, Some(reqwest::StatusCode::OK));

        let body = match health {
            Some(response) => response.json::<Value>().await.ok(),
            None => None,
        };
        assert_eq!(body.map(|b| b["service"].clone()), Some(json!("learning-assistant")));

        assert!(stop.send(()).is_ok());
        let finished = server.await;
        assert!(finished.is_ok_and(|result| result.is_ok()));
    }
}
