//! Notifier server library logic.
//!
//! Exposes the publish pipeline over HTTP. The change-log trigger delivers
//! a batch as the body of `POST /invoke`; the response is the per-record
//! [`BatchResult`]. `POST /invoke/legacy` answers with the single
//! `{statusCode, body}` object older callers expect.

pub mod config;

use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use notifier_publish::{AppSyncTransport, BatchResult, GraphqlTransport, PublishPipeline};
use notifier_types::StreamEvent;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// The pipeline as shared by request handlers.
pub type SharedPipeline = PublishPipeline<Arc<dyn GraphqlTransport>>;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SharedPipeline>,
}

impl AppState {
    pub fn new(pipeline: SharedPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// Builds the signed transport and pipeline from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the endpoint settings are invalid.
    pub fn from_config(config: &config::Config) -> Result<Self, config::ConfigError> {
        let transport = AppSyncTransport::new(
            config.transport_config()?,
            Arc::new(config.credentials.clone()),
        );
        if config.credentials.is_none() {
            tracing::warn!("no signing credentials configured; every publish will fail");
        }
        tracing::info!(
            endpoint = %transport.endpoint(),
            region = transport.region(),
            strategy = %config.pipeline.strategy,
            "publish pipeline configured"
        );

        let transport: Arc<dyn GraphqlTransport> = Arc::new(transport);
        Ok(Self::new(
            PublishPipeline::new(transport).with_strategy(config.pipeline.strategy),
        ))
    }
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Handler for `POST /invoke`.
async fn invoke_handler(
    Extension(state): Extension<AppState>,
    Json(event): Json<StreamEvent>,
) -> Json<BatchResult> {
    Json(state.pipeline.handle_batch(&event.records).await)
}

/// Handler for `POST /invoke/legacy`.
async fn invoke_legacy_handler(
    Extension(state): Extension<AppState>,
    Json(event): Json<StreamEvent>,
) -> Json<Value> {
    let result = state.pipeline.handle_batch(&event.records).await;
    Json(result.legacy_response())
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/invoke", post(invoke_handler))
        .route("/invoke/legacy", post(invoke_legacy_handler))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}
