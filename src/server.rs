use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::caption;
use crate::dispatch::Dispatcher;
use crate::event;
use crate::readiness::Readiness;

/// Shared state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub readiness: Readiness,
    pub default_event_type: String,
}

/// Bind the webhook listener and serve until Ctrl-C / SIGTERM.
pub async fn run(state: AppState, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("🚀 Server listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/newcontent", post(new_content))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn new_content(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(payload) => debug!(
            "🔔 Received payload: {}",
            serde_json::to_string_pretty(&payload).unwrap_or_default()
        ),
        Err(_) => debug!("🔔 Received non-JSON payload ({} bytes)", body.len()),
    }

    let record = match event::parse(&body, &state.default_event_type) {
        Ok(record) => record,
        Err(err) => {
            warn!("⚠ Rejected payload: {}", err);
            return (StatusCode::BAD_REQUEST, err.to_string());
        }
    };

    let message = caption::compose(&record);

    if !state.readiness.is_ready() {
        info!("Messaging session not ready yet, holding notification for '{}'", record.name);
    }
    state.readiness.wait().await;

    state.dispatcher.dispatch(&message).await;

    (StatusCode::OK, String::new())
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    if state.readiness.is_ready() {
        (StatusCode::OK, Json(serde_json::json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "starting" })),
        )
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
