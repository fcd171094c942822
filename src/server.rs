//! Composition root: shared state, router assembly and the listening server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, middleware as axum_middleware, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::converter::DocumentConverter;
use crate::error::Pdf2MdError;
use crate::{middleware, routes};

/// State shared by every request. Immutable once built.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub converter: Arc<dyn DocumentConverter>,
}

impl AppState {
    pub fn new(config: ServerConfig, converter: Arc<dyn DocumentConverter>) -> Self {
        Self {
            config: Arc::new(config),
            converter,
        }
    }
}

/// Create the router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    routes::create_router(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}

/// A bound, not yet running, server.
pub struct Application {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
}

impl Application {
    /// Bind the listener and assemble the router.
    pub async fn build(
        config: ServerConfig,
        converter: Arc<dyn DocumentConverter>,
    ) -> Result<Self, Pdf2MdError> {
        let addr = config.bind_addr;
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            error!("Failed to bind TCP listener to {}: {}", addr, e);
            Pdf2MdError::Io(e)
        })?;
        let local_addr = listener.local_addr()?;

        info!(
            "Listening on {} (converter: {})",
            local_addr,
            converter.name()
        );

        let router = create_router(AppState::new(config, converter));
        Ok(Self {
            listener,
            router,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    pub async fn run_until_stopped(self) -> Result<(), Pdf2MdError> {
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    /// Serve until `signal` resolves, then drain in-flight requests.
    pub async fn run_with_shutdown<F>(self, signal: F) -> Result<(), Pdf2MdError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await?;
        info!("Server stopped");
        Ok(())
    }
}
