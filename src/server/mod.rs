//! HTTP API for paper summaries and literature reviews.
//!
//! Routes live under `/api/paper-summarizer`, plus `/health`. Every route
//! answers JSON, including errors and unknown paths.

mod error;
mod handlers;
mod routes;

pub use error::{ApiError, FailureKind};
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tokio::signal;
use tracing::info;

use crate::config::Settings;
use crate::llm::TextGenerator;
use crate::service::Summarizer;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub summarizer: Arc<Summarizer>,
    pub started_at: Instant,
}

impl AppState {
    /// Wire the summarizer to an injected provider.
    pub fn new(settings: Settings, generator: Arc<dyn TextGenerator>) -> Self {
        let summarizer = Summarizer::new(generator, &settings);
        Self {
            settings: Arc::new(settings),
            summarizer: Arc::new(summarizer),
            started_at: Instant::now(),
        }
    }
}

/// Start the web server and run until Ctrl+C or SIGTERM.
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    state.settings.ensure_directories()?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting server at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        } else {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
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
