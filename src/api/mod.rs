//! REST API over a recomputed panel.
//!
//! Provides three GET endpoints:
//! - `/panel` — settings, totals, and summary
//! - `/consumers` — consumer attribute records, optionally filtered by room
//! - `/candidates/{index}` — ranked device candidates for one consumer

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::catalog::Catalog;
use crate::sizing::types::Panel;

pub use types::{CandidateRecord, ConsumerRecord, ErrorResponse, PanelResponse};

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the panel is recomputed and wrapped in `Arc`.
pub struct AppState {
    /// Recomputed panel.
    pub panel: Panel,
    /// Catalog the panel was sized against.
    pub catalog: Catalog,
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured `Router` ready to serve.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/panel", get(handlers::get_panel))
        .route("/consumers", get(handlers::get_consumers))
        .route("/candidates/{index}", get(handlers::get_candidates))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
