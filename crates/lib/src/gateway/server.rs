//! Gateway HTTP server.

use crate::config::{self, Config};
use crate::context::{build_context, ProviderSummary};
use crate::gateway::protocol::ApiError;
use crate::pipeline::{self, InboundMessage, PipelineContext, ProcessedResult};
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared state for the gateway: config and the providers loaded at startup.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub pipeline: Arc<PipelineContext>,
    pub providers: Arc<ProviderSummary>,
    pub started_at: DateTime<Utc>,
}

impl GatewayState {
    pub fn new(config: Config, pipeline: PipelineContext) -> Self {
        let providers = ProviderSummary::from_config(&config);
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            providers: Arc::new(providers),
            started_at: Utc::now(),
        }
    }
}

/// Routes: `GET /` health, `POST /chat`.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/chat", post(chat_http))
        .with_state(state)
}

/// Load every provider, then serve until SIGINT/SIGTERM. A provider that fails to load aborts startup.
pub async fn run_gateway(config: Config) -> Result<()> {
    let bind = config.server.bind.trim().to_string();
    if !config::is_loopback_bind(&bind) {
        log::warn!(
            "binding to {} exposes /chat without authentication to the network",
            bind
        );
    }

    let pipeline = build_context(&config)
        .await
        .context("initializing capability providers")?;
    log::info!("capability providers ready");

    let bind_addr = format!("{}:{}", bind, config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    serve(listener, GatewayState::new(config, pipeline)).await
}

/// Serve the router on an already bound listener with graceful shutdown.
pub async fn serve(listener: TcpListener, state: GatewayState) -> Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
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
    log::info!("shutdown signal received, draining connections");
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.server.port,
        "startedAt": state.started_at.to_rfc3339(),
        "providers": *state.providers,
    }))
}

/// POST /chat — run one message through the pipeline.
async fn chat_http(
    State(state): State<GatewayState>,
    payload: Result<Json<InboundMessage>, JsonRejection>,
) -> Result<Json<ProcessedResult>, ApiError> {
    let Json(message) = payload.map_err(|rej| ApiError::Invalid(rej.body_text()))?;
    if message.text.trim().is_empty() {
        return Err(ApiError::Invalid("text must not be empty".to_string()));
    }

    let request_id = uuid::Uuid::new_v4();
    log::debug!(
        "chat {}: {} chars, source {}, target {}",
        request_id,
        message.text.chars().count(),
        message.source_language,
        message.target_language
    );
    match pipeline::process(&state.pipeline, &message).await {
        Ok(result) => {
            log::debug!(
                "chat {}: detected {}, sentiment {}",
                request_id,
                result.detected_language,
                result.sentiment.label
            );
            Ok(Json(result))
        }
        Err(e) => {
            log::error!("chat {}: {}", request_id, e);
            Err(e.into())
        }
    }
}
