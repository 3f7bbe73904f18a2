// SPDX-License-Identifier: MIT
//! Simple in-process counters exposed as `GET /metrics` in Prometheus text format.
//! No external library needed — all counters are `AtomicU64` incremented inline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// In-process performance counters shared across all requests.
#[derive(Debug)]
pub struct MailboxMetrics {
    /// Total webhook deliveries written to the mailbox since start.
    pub webhooks_received: AtomicU64,
    /// Total webhook requests rejected (unreadable body) since start.
    pub webhook_failures: AtomicU64,
    /// Total poll requests served since start.
    pub polls_served: AtomicU64,
    /// Poll requests that returned new data since start.
    pub polls_with_new: AtomicU64,
    /// Total clear operations since start.
    pub clears: AtomicU64,
    /// Daemon start time — used to calculate uptime in the metrics response.
    pub started_at: Instant,
}

impl MailboxMetrics {
    pub fn new() -> Self {
        Self {
            webhooks_received: AtomicU64::new(0),
            webhook_failures: AtomicU64::new(0),
            polls_served: AtomicU64::new(0),
            polls_with_new: AtomicU64::new(0),
            clears: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn inc_webhooks_received(&self) {
        self.webhooks_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_webhook_failures(&self) {
        self.webhook_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_polls_served(&self) {
        self.polls_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_polls_with_new(&self) {
        self.polls_with_new.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_clears(&self) {
        self.clears.fetch_add(1, Ordering::Relaxed);
    }

    /// Render counters in Prometheus text format.
    ///
    /// Mailbox occupancy is passed in because it requires the store lock
    /// (not tracked here).
    pub fn render_prometheus(&self, mailbox_occupied: bool) -> String {
        let uptime = self.started_at.elapsed().as_secs();
        let webhooks_received = self.webhooks_received.load(Ordering::Relaxed);
        let webhook_failures = self.webhook_failures.load(Ordering::Relaxed);
        let polls_served = self.polls_served.load(Ordering::Relaxed);
        let polls_with_new = self.polls_with_new.load(Ordering::Relaxed);
        let clears = self.clears.load(Ordering::Relaxed);
        let occupied = u64::from(mailbox_occupied);

        format!(
            "# HELP hookd_uptime_seconds Daemon uptime in seconds.\n\
             # TYPE hookd_uptime_seconds gauge\n\
             hookd_uptime_seconds {uptime}\n\
             # HELP hookd_mailbox_occupied Whether the mailbox slot currently holds an entry (0/1).\n\
             # TYPE hookd_mailbox_occupied gauge\n\
             hookd_mailbox_occupied {occupied}\n\
             # HELP hookd_webhooks_received_total Webhook deliveries written to the mailbox since start.\n\
             # TYPE hookd_webhooks_received_total counter\n\
             hookd_webhooks_received_total {webhooks_received}\n\
             # HELP hookd_webhook_failures_total Webhook requests rejected before any store write since start.\n\
             # TYPE hookd_webhook_failures_total counter\n\
             hookd_webhook_failures_total {webhook_failures}\n\
             # HELP hookd_polls_served_total Poll requests served since start.\n\
             # TYPE hookd_polls_served_total counter\n\
             hookd_polls_served_total {polls_served}\n\
             # HELP hookd_polls_with_new_total Poll requests that returned new data since start.\n\
             # TYPE hookd_polls_with_new_total counter\n\
             hookd_polls_with_new_total {polls_with_new}\n\
             # HELP hookd_clears_total Mailbox clear operations since start.\n\
             # TYPE hookd_clears_total counter\n\
             hookd_clears_total {clears}\n"
        )
    }
}

impl Default for MailboxMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle — cheaply clonable.
pub type SharedMetrics = Arc<MailboxMetrics>;
