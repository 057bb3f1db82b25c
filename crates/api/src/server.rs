//! HTTP server setup and lifecycle.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::routes;
use crate::state::SharedState;

pub struct Server {
    config: ServerConfig,
    state: SharedState,
    app: Router,
}

impl Server {
    pub fn new(config: ServerConfig, state: SharedState) -> Self {
        let app = routes::create_router(state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );

        Self { config, state, app }
    }

    /// Serve until ctrl-c/SIGTERM, then drain in-flight requests for at most
    /// the configured grace period. Liveness flips to shutting-down as soon
    /// as the signal lands.
    pub async fn start(self) -> anyhow::Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.http_port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("atlas api listening on http://{addr}");
        info!("liveness:  http://{addr}/health/live");
        info!("readiness: http://{addr}/health/ready");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let serve = axum::serve(listener, self.app).with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });
        let server_task = tokio::spawn(async move { serve.await });

        shutdown_signal().await;
        info!("shutdown signal received, draining requests");
        self.state.begin_shutdown();
        let _ = shutdown_tx.send(());

        let grace = Duration::from_secs(self.config.shutdown_timeout);
        match tokio::time::timeout(grace, server_task).await {
            Ok(joined) => joined??,
            Err(_) => warn!("shutdown grace period elapsed with requests in flight"),
        }

        info!("atlas api stopped");
        Ok(())
    }

    /// Router for in-process tests.
    pub fn router(self) -> Router {
        self.app
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
