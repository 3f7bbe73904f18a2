// SPDX-License-Identifier: MIT
pub mod client;
pub mod config;
pub mod mailbox;
pub mod metrics;
pub mod rest;

use std::sync::Arc;
use std::time::Instant;

use config::HookdConfig;
use mailbox::MailboxStore;
use metrics::{MailboxMetrics, SharedMetrics};

/// Shared application state handed to every HTTP handler.
///
/// The mailbox store is constructed here exactly once and only ever reached
/// through this context — there is no global slot anywhere in the crate.
pub struct AppContext {
    pub config: Arc<HookdConfig>,
    /// The single-slot mailbox at the heart of the daemon.
    pub mailbox: Arc<MailboxStore>,
    /// In-process Prometheus-style counters.
    pub metrics: SharedMetrics,
    pub started_at: Instant,
}

impl AppContext {
    pub fn new(config: Arc<HookdConfig>) -> Self {
        Self {
            config,
            mailbox: Arc::new(MailboxStore::new()),
            metrics: Arc::new(MailboxMetrics::new()),
            started_at: Instant::now(),
        }
    }
}
