//! HTTP server: router, admission layer, graceful shutdown.

use std::future::{Future, IntoFuture};
use std::net::{Ipv4Addr, SocketAddr};
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::post, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::app::handler::fetch_urls;
use crate::app::middleware::admission_gate;
use crate::config::ServiceConfig;
use crate::core::admission::AdmissionController;
use crate::core::batch::BatchEngine;
use crate::core::fetch::HttpFetcher;
use crate::domain::model::BatchSettings;
use crate::domain::ports::{ConfigProvider, Fetcher};
use crate::utils::error::{LinkError, Result};
use crate::utils::validation::Validate;

/// How long connections get to answer once their batches are cancelled.
const CANCELLED_DRAIN: Duration = Duration::from_secs(1);

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub engine: BatchEngine,
    pub max_count_urls: usize,
    /// Parent of every request's token. Cancelled only once the shutdown
    /// grace period runs out.
    pub batches: CancellationToken,
}

pub struct Server {
    config: ServiceConfig,
    state: AppState,
    admission: Arc<AdmissionController>,
    shutdown: CancellationToken,
}

impl Server {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        Self::with_fetcher(config, Arc::new(HttpFetcher::new()))
    }

    pub fn with_fetcher(config: ServiceConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        config.validate()?;

        let state = AppState {
            engine: BatchEngine::new(fetcher, BatchSettings::from_config(&config)),
            max_count_urls: config.max_count_urls(),
            batches: CancellationToken::new(),
        };
        let admission = Arc::new(AdmissionController::new(config.max_concurrent_requests()));

        Ok(Self {
            config,
            state,
            admission,
            shutdown: CancellationToken::new(),
        })
    }

    /// Every path is served by the batch handler, as `/` alone would be.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", post(fetch_urls))
            .route("/{*path}", post(fetch_urls))
            .with_state(self.state.clone())
            .layer(middleware::from_fn_with_state(
                self.admission.clone(),
                admission_gate,
            ))
            .layer(TraceLayer::new_for_http())
    }

    pub fn admission(&self) -> Arc<AdmissionController> {
        self.admission.clone()
    }

    /// Stops accepting connections; in-flight requests keep running.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Cancels every in-flight batch.
    pub fn batch_token(&self) -> CancellationToken {
        self.state.batches.clone()
    }

    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.config.port))
    }

    /// Binds the configured port and serves until `signal` resolves.
    pub async fn start_with_shutdown(
        &self,
        signal: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let addr = self.bind_address();
        let listener = TcpListener::bind(addr).await.map_err(|e| LinkError::Server {
            message: format!("failed to bind {}: {}", addr, e),
        })?;
        tracing::info!("Listening on {}", addr);

        self.serve_with_shutdown(listener, signal).await
    }

    /// Serves on `listener` until `signal` resolves. New connections are
    /// refused from then on while in-flight requests run to completion for at
    /// most the configured shutdown timeout; after that their batches are
    /// cancelled and the server stops.
    pub async fn serve_with_shutdown(
        &self,
        listener: TcpListener,
        signal: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let shutdown = self.shutdown.clone();
        let batches = self.state.batches.clone();
        let grace = self.config.shutdown_grace();

        let mut serve = pin!(axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown.clone().cancelled_owned())
            .into_future());

        let stopping = async {
            tokio::select! {
                _ = signal => {}
                _ = shutdown.cancelled() => {}
            }
            tracing::info!("stop server");
            shutdown.cancel();
        };

        let served = tokio::select! {
            served = &mut serve => Some(served),
            _ = stopping => None,
        };
        let served = match served {
            Some(served) => served,
            None => match tokio::time::timeout(grace, &mut serve).await {
                Ok(served) => served,
                Err(_) => {
                    tracing::warn!(
                        "graceful shutdown timed out after {:?}, cancelling in-flight batches",
                        grace
                    );
                    batches.cancel();
                    match tokio::time::timeout(CANCELLED_DRAIN, &mut serve).await {
                        Ok(served) => served,
                        Err(_) => {
                            tracing::warn!("connections still open, stopping anyway");
                            Ok(())
                        }
                    }
                }
            },
        };
        batches.cancel();
        served.map_err(|e| LinkError::Server {
            message: e.to_string(),
        })?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
