//! Gateway HTTP server (single port).

use crate::config::{Config, Credentials, DispatchMode};
use crate::dispatch::{Ack, Dispatcher, Worker};
use crate::envelope::GatewayEnvelope;
use crate::pipeline::Pipeline;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Body returned by the inline path once processing has finished.
pub const INLINE_ACK_BODY: &str = "{}";

/// Shared state for the gateway handlers. Read-only after startup.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub dispatcher: Dispatcher,
    pub pipeline: Pipeline,
}

/// Router with all gateway routes. The caller owns the worker that drains `state.dispatcher`.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/invoke", post(invoke))
        .route("/line/webhook", post(line_webhook))
        .with_state(state)
}

/// Start the worker and serve until SIGINT/SIGTERM, then let in-flight invocations finish.
pub async fn run_gateway(config: Config, credentials: Credentials) -> Result<()> {
    let pipeline = Pipeline::from_config(&config, &credentials);
    let (dispatcher, rx) = Dispatcher::channel(config.gateway.queue_capacity);
    let worker = Worker::new(pipeline.clone(), rx).start();

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    log::info!(
        "gateway: dispatch={} delivery={}",
        config.gateway.dispatch.as_str(),
        config.channels.line.delivery.as_str()
    );
    let state = GatewayState {
        config: Arc::new(config),
        dispatcher,
        pipeline,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;

    // The router (and with it every dispatcher) is gone, so the worker's queue is closed.
    if let Err(e) = worker.await {
        log::warn!("worker task ended abnormally: {}", e);
    }
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// POST /invoke — body is a gateway envelope (`{"body": "<LINE JSON>"}`).
async fn invoke(State(state): State<GatewayState>, body: Bytes) -> Response {
    receive(&state, body).await
}

/// POST /line/webhook — body is LINE's native webhook JSON; wrapped into an envelope first.
async fn line_webhook(State(state): State<GatewayState>, body: Bytes) -> Response {
    let envelope = GatewayEnvelope::wrap(&body);
    receive(&state, Bytes::from(envelope.to_bytes())).await
}

/// Hand the envelope to the processing stage per dispatch mode. Always 200 with a fixed body.
async fn receive(state: &GatewayState, envelope: Bytes) -> Response {
    match state.config.gateway.dispatch {
        DispatchMode::Async => {
            state.dispatcher.dispatch(envelope);
            json_ok(Ack::BODY)
        }
        DispatchMode::Inline => {
            let outcome = state.pipeline.process(&envelope).await;
            log::info!("gateway: inline processing finished: {}", outcome);
            json_ok(INLINE_ACK_BODY)
        }
    }
}

fn json_ok(body: &'static str) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
        "dispatch": state.config.gateway.dispatch.as_str(),
        "delivery": state.pipeline.delivery().as_str(),
    }))
}
