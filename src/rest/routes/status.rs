// SPDX-License-Identifier: MIT
// rest/routes/status.rs — mailbox status read and slot reset.

use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::AppContext;

/// GET /status — is there anything in the slot right now.
pub async fn status(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    let snap = ctx.mailbox.read();
    match snap.payload {
        Some(payload) => Json(json!({
            "hasResponse": true,
            "response": payload.as_str(),
            "shape": payload.shape(),
            "timestamp": snap.received_at,
        })),
        None => Json(json!({
            "hasResponse": false,
            "response": Value::Null,
            "timestamp": snap.received_at,
        })),
    }
}

/// POST /clear — reset the slot to the empty sentinel.
///
/// Lets a client start a fresh request cycle without a stale prior result
/// being mistaken for a new one. Issued stamps are not rewound, so a poller
/// holding a pre-clear `since` still sees any post-clear write as new.
pub async fn clear(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    ctx.mailbox.clear();
    ctx.metrics.inc_clears();
    info!("mailbox cleared");
    Json(json!({ "success": true, "message": "mailbox cleared" }))
}
