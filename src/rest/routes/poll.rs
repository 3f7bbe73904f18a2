// SPDX-License-Identifier: MIT
// rest/routes/poll.rs — timestamp-based check for a newer mailbox entry.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::AppContext;

#[derive(Deserialize)]
pub struct PollQuery {
    /// Millisecond timestamp of the caller's last seen entry.
    /// Absent or unparseable means 0: "give me anything ever received".
    since: Option<String>,
}

/// GET /poll?since=<millis> — pure read, no side effects on the slot.
///
/// The payload and timestamp come from one store snapshot, so a reply
/// carrying a write's timestamp always carries that write's payload.
/// Multiple independent pollers can each discover the same update; nothing
/// is consumed here.
pub async fn poll(State(ctx): State<Arc<AppContext>>, Query(q): Query<PollQuery>) -> Json<Value> {
    let since: u64 = q
        .since
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let snap = ctx.mailbox.read();
    ctx.metrics.inc_polls_served();

    match snap.payload {
        Some(payload) if snap.received_at > since => {
            ctx.metrics.inc_polls_with_new();
            debug!(since, timestamp = snap.received_at, "poll returning new data");
            Json(json!({
                "response": payload.as_str(),
                "shape": payload.shape(),
                "timestamp": snap.received_at,
                "hasNew": true,
            }))
        }
        // Empty slot or nothing newer: hand back the live timestamp so the
        // caller can tell never-written (0) from simply-not-updated.
        _ => Json(json!({
            "response": Value::Null,
            "timestamp": snap.received_at,
            "hasNew": false,
        })),
    }
}
