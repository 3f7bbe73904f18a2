use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::error;

const DEFAULT_PORT: u16 = 4310;
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 120;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── WebhookConfig ────────────────────────────────────────────────────────────

/// Webhook receiver configuration (`[webhook]` in the config file).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Maximum accepted request body size in bytes (default: 1 MiB).
    /// Oversized bodies are rejected before normalization, store untouched.
    pub max_body_bytes: usize,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

// ─── ClientConfig ─────────────────────────────────────────────────────────────

/// Defaults for the client subcommands (`[client]` in the config file).
///
/// Everything here can also be given per-invocation on the command line;
/// CLI flags win.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the daemon the client talks to.
    /// None = `http://127.0.0.1:{port}` derived from this config.
    pub server_url: Option<String>,
    /// Delay between poll attempts in milliseconds (default: 2000).
    pub interval_ms: u64,
    /// Give up after this many seconds of waiting (default: 120).
    pub timeout_secs: u64,
    /// Hard cap on poll attempts; 0 = bounded by the deadline only.
    pub max_attempts: u32,
    /// Outbound trigger URL handed to `hookd await --trigger` by default.
    /// The daemon never calls this — only the client does.
    pub trigger_url: Option<String>,
    /// Bearer token sent with the trigger request. None = no Authorization header.
    pub trigger_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            max_attempts: 0,
            trigger_url: None,
            trigger_token: None,
        }
    }
}

// ─── TOML config file ─────────────────────────────────────────────────────────

/// Optional config file — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// HTTP server port (default: 4310).
    port: Option<u16>,
    /// Bind address (default: "127.0.0.1"; use "0.0.0.0" so external
    /// processing services can reach /webhook).
    bind_address: Option<String>,
    /// Log level filter string, e.g. "debug", "info,hookd=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default, human-readable) | "json" (structured for log aggregators).
    log_format: Option<String>,
    /// Webhook receiver configuration (`[webhook]`).
    webhook: Option<WebhookConfig>,
    /// Client subcommand defaults (`[client]`).
    client: Option<ClientConfig>,
}

fn load_toml(path: &Path) -> Option<TomlConfig> {
    let contents = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config file — using defaults");
            None
        }
    }
}

// ─── HookdConfig ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HookdConfig {
    pub port: u16,
    /// Bind address for the HTTP server (HOOKD_BIND env var, default: "127.0.0.1").
    pub bind_address: String,
    pub log: String,
    /// Log output format: "pretty" (default) | "json" (structured for Loki/Elasticsearch).
    pub log_format: String,
    /// Webhook receiver limits.
    pub webhook: WebhookConfig,
    /// Client subcommand defaults.
    pub client: ClientConfig,
}

impl HookdConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `config_path`
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        bind_address: Option<String>,
        log: Option<String>,
        config_path: Option<&Path>,
    ) -> Self {
        let toml = config_path.and_then(load_toml).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let bind_address = bind_address
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let log_format = std::env::var("HOOKD_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        let webhook = toml.webhook.unwrap_or_default();
        let client = toml.client.unwrap_or_default();

        Self {
            port,
            bind_address,
            log,
            log_format,
            webhook,
            client,
        }
    }

    /// Base URL the client subcommands target: the configured override, or
    /// loopback on this config's port.
    pub fn server_url(&self) -> String {
        match &self.client.server_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://127.0.0.1:{}", self.port),
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
