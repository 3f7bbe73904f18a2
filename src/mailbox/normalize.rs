// SPDX-License-Identifier: MIT
// Payload normalization — runs fully before any store write.

use super::store::Payload;

/// True when the declared content type names a JSON document: the bare JSON
/// media types or any `+json` structured-syntax suffix. Parameters after `;`
/// (charset etc.) are ignored.
fn declares_json(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence == "text/json" || essence.ends_with("+json")
}

/// Normalize an inbound body into a storable payload.
///
/// A JSON-declaring content type gets parsed and re-rendered as indented
/// text, so poll consumers always receive something renderable regardless of
/// how the sender formatted it. A body that fails to parse, or any non-JSON
/// content type, is stored as raw text (lossy UTF-8). Total — never fails,
/// never partially writes.
pub fn normalize(content_type: Option<&str>, body: &[u8]) -> Payload {
    if content_type.is_some_and(declares_json) {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
            if let Ok(rendered) = serde_json::to_string_pretty(&value) {
                return Payload::Json(rendered);
            }
        }
        // Malformed declared-JSON: recovered locally, not surfaced as a failure.
    }
    Payload::Text(String::from_utf8_lossy(body).into_owned())
}
