// SPDX-License-Identifier: MIT
// rest/routes/webhook.rs — the inbound callback receiver.
//
// Normalization runs fully before the store lock is touched; the write
// itself cannot fail for content reasons. Exactly one store mutation per
// accepted delivery, zero on failure.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::mailbox::{normalize, Payload};
use crate::AppContext;

/// POST /webhook — body of any declared content type.
///
/// JSON-declaring content types are re-rendered as indented text so poll
/// consumers always get something renderable; everything else (including
/// declared-JSON that fails to parse) is stored as raw text. The payload is
/// never echoed back to the sender.
pub async fn receive(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let bytes = match body {
        Ok(b) => b,
        Err(e) => {
            // Unreadable or over-limit body: store untouched.
            ctx.metrics.inc_webhook_failures();
            warn!(err = %e, "webhook body read failed");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": e.to_string() })),
            ));
        }
    };

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let payload = normalize(content_type, &bytes);
    let shape = payload.shape();
    let received_at = ctx.mailbox.write(payload);
    ctx.metrics.inc_webhooks_received();

    info!(
        shape,
        received_at,
        bytes = bytes.len(),
        content_type = content_type.unwrap_or("<none>"),
        "webhook stored"
    );

    Ok(Json(json!({
        "success": true,
        "received": true,
        "message": "webhook received",
    })))
}

/// GET /webhook — alternate delivery channel for senders that cannot issue
/// POST bodies: the query string itself is the payload.
///
/// A bare GET (no query string) is a health check, not an empty write — the
/// mailbox must not be polluted by probes.
pub async fn receive_get(
    State(ctx): State<Arc<AppContext>>,
    RawQuery(query): RawQuery,
) -> Json<Value> {
    match query.filter(|q| !q.is_empty()) {
        Some(q) => {
            let received_at = ctx.mailbox.write(Payload::Text(q));
            ctx.metrics.inc_webhooks_received();
            info!(received_at, "webhook stored from query string");
            Json(json!({ "success": true, "received": true }))
        }
        None => Json(json!({
            "status": "ready",
            "message": "webhook endpoint is ready to receive POST requests",
        })),
    }
}
