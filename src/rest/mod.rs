// SPDX-License-Identifier: MIT
// rest/mod.rs — the mailbox HTTP surface.
//
// Axum HTTP server on the configured port (loopback by default; bind
// 0.0.0.0 so external processing services can reach /webhook).
//
// Endpoints:
//   POST /webhook   — receive a callback payload (any content type)
//   GET  /webhook   — query-string delivery, or health check when bare
//   GET  /poll      — timestamp-based check for a newer entry
//   GET  /status    — is there anything in the slot
//   POST /clear     — reset the slot
//   GET  /health    — daemon liveness document
//   GET  /metrics   — Prometheus text format counters

pub mod routes;

use anyhow::{Context as _, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::AppContext;

/// The routing header the external processing service echoes back with its
/// callback. Allowed through CORS so browser-held senders can set it.
const TARGET_HOST_HEADER: &str = "targethost";

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    // Webhook senders come from anywhere. Preflights are answered by the
    // CORS layer itself with 200.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(TARGET_HOST_HEADER),
        ]);

    Router::new()
        .route(
            "/webhook",
            post(routes::webhook::receive).get(routes::webhook::receive_get),
        )
        .route("/poll", get(routes::poll::poll))
        .route("/status", get(routes::status::status))
        .route("/clear", post(routes::status::clear))
        .route("/health", get(routes::health::health))
        .route("/metrics", get(routes::metrics::metrics))
        .layer(DefaultBodyLimit::max(ctx.config.webhook.max_body_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Bind and serve until a shutdown signal arrives.
pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address '{bind}'"))?;

    let router = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "mailbox HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(make_shutdown_future())
        .await
        .context("HTTP server error")?;

    info!("mailbox HTTP server stopped");
    Ok(())
}

/// Returns a future that resolves when a shutdown signal is received.
///
/// On Unix we listen for SIGTERM *and* Ctrl-C.
/// On other platforms we listen for Ctrl-C only.
async fn make_shutdown_future() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
}
