// SPDX-License-Identifier: MIT
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::AppContext;

/// GET /health — daemon liveness document, distinct from the bare
/// `GET /webhook` readiness reply.
pub async fn health(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    let uptime = ctx.started_at.elapsed().as_secs();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSecs": uptime,
        "port": ctx.config.port,
    }))
}
