// SPDX-License-Identifier: MIT
// rest/routes/metrics.rs — GET /metrics in Prometheus text format.

use axum::{extract::State, http::header};
use std::sync::Arc;

use crate::AppContext;

pub async fn metrics(
    State(ctx): State<Arc<AppContext>>,
) -> ([(header::HeaderName, &'static str); 1], String) {
    // Occupancy needs the store lock, so it's read here and passed in.
    let occupied = ctx.mailbox.read().payload.is_some();
    let body = ctx.metrics.render_prometheus(occupied);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}
