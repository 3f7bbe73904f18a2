// SPDX-License-Identifier: MIT
use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use hookd::client::{poller::PollBudget, ClientError, MailboxClient, Trigger};
use hookd::config::HookdConfig;
use hookd::{rest, AppContext};

#[derive(Parser)]
#[command(
    name = "hookd",
    about = "hookd — single-slot webhook mailbox daemon",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port
    #[arg(long, env = "HOOKD_PORT")]
    port: Option<u16>,

    /// Bind address for the HTTP server (default: 127.0.0.1; use 0.0.0.0 so
    /// external processing services can reach /webhook)
    #[arg(long, env = "HOOKD_BIND")]
    bind_address: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "HOOKD_LOG")]
    log: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "HOOKD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,

    /// Path to a TOML config file
    #[arg(long, env = "HOOKD_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Suppress progress and informational output.
    ///
    /// Errors are still printed to stderr. JSON output (--json flags) is
    /// unaffected. Use this flag when piping output to other tools.
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Start the mailbox daemon (default when no subcommand given).
    ///
    /// Runs hookd in the foreground until SIGTERM or Ctrl-C.
    ///
    /// Examples:
    ///   hookd serve
    ///   hookd
    Serve,
    /// Show whether the mailbox currently holds a result.
    ///
    /// Examples:
    ///   hookd status
    ///   hookd status --json
    Status {
        /// Print the raw JSON status document.
        #[arg(long)]
        json: bool,
    },
    /// Reset the mailbox so a stale result cannot be mistaken for a new one.
    ///
    /// Examples:
    ///   hookd clear
    Clear,
    /// Wait for the next webhook delivery and print its payload.
    ///
    /// Records the current mailbox timestamp as a baseline, optionally fires
    /// the outbound trigger (passing this daemon's /webhook URL in the
    /// targetHost header), then polls until something newer arrives or the
    /// budget runs out.
    ///
    /// Examples:
    ///   hookd await
    ///   hookd await --trigger --timeout 60
    ///   hookd await --interval-ms 500 --max-attempts 20
    Await {
        /// Fire the configured trigger URL before polling.
        #[arg(long)]
        trigger: bool,
        /// Trigger URL (overrides [client] trigger_url from the config file).
        #[arg(long, env = "HOOKD_TRIGGER_URL")]
        trigger_url: Option<String>,
        /// Give up after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,
        /// Delay between poll attempts in milliseconds.
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Hard cap on poll attempts (0 = deadline only).
        #[arg(long)]
        max_attempts: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Arc::new(HookdConfig::new(
        args.port,
        args.bind_address,
        args.log,
        args.config.as_deref(),
    ));

    // Init once — must happen before any tracing calls.
    let _file_guard = setup_logging(&config.log, args.log_file.as_deref(), &config.log_format);

    let quiet = args.quiet;
    match args.command {
        None | Some(Command::Serve) => run_server(config).await?,
        Some(Command::Status { json }) => {
            let exit_code = run_status(&config, json).await;
            std::process::exit(exit_code);
        }
        Some(Command::Clear) => run_clear(&config, quiet).await?,
        Some(Command::Await {
            trigger,
            trigger_url,
            timeout,
            interval_ms,
            max_attempts,
        }) => {
            let exit_code = run_await(
                &config,
                trigger,
                trigger_url,
                timeout,
                interval_ms,
                max_attempts,
                quiet,
            )
            .await?;
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

// ── hookd serve ───────────────────────────────────────────────────────────────

async fn run_server(config: Arc<HookdConfig>) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.port,
        bind = %config.bind_address,
        "starting hookd"
    );
    let ctx = Arc::new(AppContext::new(config));
    rest::start_rest_server(ctx).await
}

// ── hookd status ──────────────────────────────────────────────────────────────

async fn run_status(config: &HookdConfig, json: bool) -> i32 {
    let client = match MailboxClient::new(&config.server_url()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };

    match client.status().await {
        Ok(s) => {
            if json {
                let doc = serde_json::json!({
                    "hasResponse": s.has_response,
                    "response": s.response,
                    "timestamp": s.timestamp,
                });
                println!("{doc}");
            } else if s.has_response {
                println!(
                    "hookd: 1 result waiting (received at {})",
                    format_stamp(s.timestamp)
                );
                if let Some(body) = s.response {
                    println!("{body}");
                }
            } else {
                println!("hookd: mailbox empty");
            }
            0
        }
        Err(_) => {
            if json {
                println!(r#"{{"status":"not_running"}}"#);
            } else {
                println!("hookd: not running at {}", config.server_url());
            }
            1
        }
    }
}

/// Format an epoch-millis stamp as local time, or "never" for the sentinel.
fn format_stamp(millis: u64) -> String {
    if millis == 0 {
        return "never".to_string();
    }
    match chrono::DateTime::from_timestamp_millis(millis as i64) {
        Some(dt) => dt
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string(),
        None => millis.to_string(),
    }
}

// ── hookd clear ───────────────────────────────────────────────────────────────

async fn run_clear(config: &HookdConfig, quiet: bool) -> Result<()> {
    let client = MailboxClient::new(&config.server_url())?;
    client
        .clear()
        .await
        .context("could not clear the mailbox — is the daemon running?")?;
    if !quiet {
        println!("mailbox cleared");
    }
    Ok(())
}

// ── hookd await ───────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
async fn run_await(
    config: &HookdConfig,
    trigger: bool,
    trigger_url: Option<String>,
    timeout: Option<u64>,
    interval_ms: Option<u64>,
    max_attempts: Option<u32>,
    quiet: bool,
) -> Result<i32> {
    let client = MailboxClient::new(&config.server_url())?;

    let budget = PollBudget {
        interval: Duration::from_millis(interval_ms.unwrap_or(config.client.interval_ms)),
        deadline: Duration::from_secs(timeout.unwrap_or(config.client.timeout_secs)),
        max_attempts: max_attempts.unwrap_or(config.client.max_attempts),
    };

    let trigger = if trigger || trigger_url.is_some() {
        let url = trigger_url
            .or_else(|| config.client.trigger_url.clone())
            .context("--trigger given but no trigger URL configured (set [client] trigger_url or --trigger-url)")?;
        Some(Trigger {
            url,
            token: config.client.trigger_token.clone(),
        })
    } else {
        None
    };

    // Spinner while waiting. Suppressed by --quiet so piped output stays clean.
    let spinner = if quiet {
        None
    } else {
        let s = indicatif::ProgressBar::new_spinner();
        s.set_style(
            indicatif::ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
        );
        s.set_message("waiting for webhook…");
        s.enable_steady_tick(Duration::from_millis(80));
        Some(s)
    };

    let result = client.await_result(budget, trigger.as_ref()).await;

    if let Some(s) = &spinner {
        s.finish_and_clear();
    }

    match result {
        Ok(r) => {
            if !quiet {
                eprintln!("received at {}", format_stamp(r.received_at));
            }
            println!("{}", r.payload);
            Ok(0)
        }
        Err(e @ ClientError::BudgetExhausted { .. }) => {
            eprintln!("hookd: {e}");
            Ok(1)
        }
        Err(e) => Err(e).context("await failed — is the daemon running?"),
    }
}

// ── Logging ───────────────────────────────────────────────────────────────────

/// Initialize the tracing subscriber.
/// If `log_file` is set, logs go to both stdout and a daily-rolling file.
/// Returns a `WorkerGuard` that must stay alive for the process lifetime.
///
/// `log_format` may be `"pretty"` (default, human-readable compact format) or
/// `"json"` (structured JSON for log aggregators like Loki/Elasticsearch).
///
/// If the log directory cannot be created, falls back to stdout-only logging
/// with a warning — never panics.
fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("hookd.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            // Fall back to stdout-only — don't panic on a bad log path.
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt()
                    .json()
                    .with_env_filter(log_level)
                    .init();
            } else {
                tracing_subscriber::fmt()
                    .with_env_filter(log_level)
                    .compact()
                    .init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(log_level)
            .init();
        None
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .compact()
            .init();
        None
    }
}
