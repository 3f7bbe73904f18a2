// SPDX-License-Identifier: MIT
// Single-slot mailbox store.
//
// One process-wide slot holding the most recently received webhook payload
// plus its arrival stamp. A new write fully replaces the previous entry —
// no history, no queue. Readers always see payload and stamp from the same
// write because both live under one lock.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

// ─── Payload ─────────────────────────────────────────────────────────────────

/// A received payload, tagged with the shape it arrived in.
///
/// The store never interprets payload contents. `Json` only records that the
/// receiver canonicalized the body from a structured content type — the
/// rendered text inside is as opaque to the store as raw text is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "body", rename_all = "camelCase")]
pub enum Payload {
    /// Raw body text, stored verbatim.
    Text(String),
    /// Pretty-printed rendering of a structured body.
    Json(String),
}

impl Payload {
    /// The stored text, regardless of shape.
    pub fn as_str(&self) -> &str {
        match self {
            Payload::Text(s) | Payload::Json(s) => s,
        }
    }

    /// Shape tag as it appears on the wire.
    pub fn shape(&self) -> &'static str {
        match self {
            Payload::Text(_) => "text",
            Payload::Json(_) => "json",
        }
    }
}

// ─── MailboxSnapshot ─────────────────────────────────────────────────────────

/// One coherent view of the slot: payload and arrival stamp taken under a
/// single lock acquisition. `payload: None` with `received_at: 0` is the
/// empty sentinel — the state before any write, and after a clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxSnapshot {
    pub payload: Option<Payload>,
    /// Milliseconds since epoch, assigned at write time; 0 = never written.
    pub received_at: u64,
}

impl MailboxSnapshot {
    /// True iff this snapshot carries an entry newer than `since`.
    ///
    /// Derived from `received_at` alone: the sentinel stamp 0 is never newer
    /// than anything, so an empty slot always answers false.
    pub fn is_newer_than(&self, since: u64) -> bool {
        self.received_at > since
    }
}

// ─── MailboxStore ────────────────────────────────────────────────────────────

struct SlotState {
    payload: Option<Payload>,
    received_at: u64,
    /// High-water mark for issued stamps. Survives `clear` so a write after a
    /// clear can never re-issue a stamp at or below an earlier write's.
    last_stamp: u64,
}

/// The process-wide single-slot mailbox.
///
/// Constructed once at startup and handed to the HTTP handlers as part of the
/// shared `AppContext` — never a global. All operations are total, O(1), and
/// touch no I/O while the lock is held.
pub struct MailboxStore {
    slot: Mutex<SlotState>,
}

impl MailboxStore {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(SlotState {
                payload: None,
                received_at: 0,
                last_stamp: 0,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SlotState> {
        // Poisoning is unreachable: no code path panics while holding the lock.
        self.slot.lock().expect("mailbox slot lock poisoned")
    }

    /// Atomically replace the slot with `payload` and return the assigned
    /// arrival stamp.
    ///
    /// Stamps are wall-clock milliseconds clamped to strictly after the last
    /// issued stamp, so concurrent or same-millisecond writes still observe
    /// `received_at` strictly increasing in completion order.
    pub fn write(&self, payload: Payload) -> u64 {
        let now_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let mut slot = self.lock();
        let stamp = now_ms.max(slot.last_stamp + 1);
        slot.payload = Some(payload);
        slot.received_at = stamp;
        slot.last_stamp = stamp;
        stamp
    }

    /// Current entry (or the empty sentinel), without side effects.
    pub fn read(&self) -> MailboxSnapshot {
        let slot = self.lock();
        MailboxSnapshot {
            payload: slot.payload.clone(),
            received_at: slot.received_at,
        }
    }

    /// True iff the slot holds an entry with `received_at > since`.
    ///
    /// Always computed from the live stamp. Callers that also need the
    /// payload should take one `read()` and use
    /// [`MailboxSnapshot::is_newer_than`] so both fields come from the same
    /// lock acquisition.
    pub fn has_newer_than(&self, since: u64) -> bool {
        self.lock().received_at > since
    }

    /// Reset to the empty sentinel, discarding the current entry.
    ///
    /// The stamp high-water mark is deliberately kept: a poller holding a
    /// pre-clear `since` must still see any post-clear write as new.
    pub fn clear(&self) {
        let mut slot = self.lock();
        slot.payload = None;
        slot.received_at = 0;
    }
}

impl Default for MailboxStore {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn empty_store_reports_sentinel() {
        let store = MailboxStore::new();
        let snap = store.read();
        assert_eq!(snap.payload, None);
        assert_eq!(snap.received_at, 0);
        assert!(!store.has_newer_than(0));
    }

    #[test]
    fn read_after_write_returns_exact_pair() {
        let store = MailboxStore::new();
        let stamp = store.write(Payload::Text("hello".into()));
        let snap = store.read();
        assert_eq!(snap.payload, Some(Payload::Text("hello".into())));
        assert_eq!(snap.received_at, stamp);
    }

    #[test]
    fn stamps_strictly_increase_across_writes() {
        let store = MailboxStore::new();
        let mut last = 0;
        for i in 0..100 {
            let stamp = store.write(Payload::Text(format!("w{i}")));
            assert!(stamp > last, "stamp {stamp} not above previous {last}");
            last = stamp;
        }
    }

    #[test]
    fn has_newer_than_boundary() {
        let store = MailboxStore::new();
        let t = store.write(Payload::Text("x".into()));
        assert!(store.has_newer_than(t - 1));
        assert!(store.has_newer_than(0));
        assert!(!store.has_newer_than(t));
        assert!(!store.has_newer_than(t + 1));
    }

    #[test]
    fn new_write_fully_replaces_previous() {
        let store = MailboxStore::new();
        store.write(Payload::Json("{\n  \"a\": 1\n}".into()));
        let t2 = store.write(Payload::Text("second".into()));
        let snap = store.read();
        assert_eq!(snap.payload, Some(Payload::Text("second".into())));
        assert_eq!(snap.received_at, t2);
    }

    #[test]
    fn clear_resets_to_sentinel() {
        let store = MailboxStore::new();
        store.write(Payload::Text("x".into()));
        store.clear();
        let snap = store.read();
        assert_eq!(snap.payload, None);
        assert_eq!(snap.received_at, 0);
    }

    #[test]
    fn clear_does_not_rewind_stamps() {
        let store = MailboxStore::new();
        let t1 = store.write(Payload::Text("before".into()));
        store.clear();
        let t2 = store.write(Payload::Text("after".into()));
        assert!(t2 > t1, "post-clear stamp {t2} must exceed pre-clear {t1}");
        // A poller that saw t1 still detects the post-clear write.
        assert!(store.has_newer_than(t1));
    }

    #[test]
    fn snapshot_newer_than_matches_store() {
        let store = MailboxStore::new();
        let t = store.write(Payload::Text("x".into()));
        let snap = store.read();
        assert!(snap.is_newer_than(t - 1));
        assert!(!snap.is_newer_than(t));
    }

    #[test]
    fn concurrent_writers_get_distinct_increasing_stamps() {
        let store = Arc::new(MailboxStore::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                let mut stamps = Vec::new();
                for j in 0..50 {
                    stamps.push(store.write(Payload::Text(format!("{i}-{j}"))));
                }
                stamps
            }));
        }
        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total, "duplicate stamps issued under contention");
        // The final slot state must pair the highest stamp with some payload.
        let snap = store.read();
        assert_eq!(snap.received_at, *all.last().unwrap());
        assert!(snap.payload.is_some());
    }

    #[test]
    fn payload_shape_tags() {
        assert_eq!(Payload::Text("a".into()).shape(), "text");
        assert_eq!(Payload::Json("{}".into()).shape(), "json");
    }
}
