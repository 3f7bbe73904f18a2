// SPDX-License-Identifier: MIT
//! HTTP client for the mailbox daemon.
//!
//! CLI subcommands (`hookd status`, `hookd clear`, `hookd await`) use this to
//! talk to a running instance. `await_result` drives the [`poller`] state
//! machine: record a baseline, optionally fire the outbound trigger, then
//! poll on the configured interval until new data arrives or the budget runs
//! out. The daemon itself never uses this module — triggers are strictly a
//! client concern.

pub mod poller;

use serde::Deserialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

use self::poller::{PollBudget, Poller, Step};

/// Per-request timeout for every HTTP call the client makes.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("no result after {attempts} poll attempt(s) in {elapsed:?}")]
    BudgetExhausted { attempts: u32, elapsed: Duration },
}

/// Reply from `GET /poll`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollReply {
    pub response: Option<String>,
    pub timestamp: u64,
    pub has_new: bool,
}

/// Reply from `GET /status`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReply {
    pub has_response: bool,
    pub response: Option<String>,
    pub timestamp: u64,
}

/// The outbound call that hands the processing service our webhook URL as a
/// callback address.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub url: String,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub token: Option<String>,
}

/// The awaited result of one request cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwaitedResult {
    pub payload: String,
    pub received_at: u64,
}

/// A short-lived client for one CLI invocation.
pub struct MailboxClient {
    base_url: String,
    http: reqwest::Client,
}

impl MailboxClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// The `/webhook` URL a processing service should call back on.
    pub fn webhook_url(&self) -> String {
        format!("{}/webhook", self.base_url)
    }

    /// Check whether the daemon answers its health endpoint.
    pub async fn is_reachable(&self) -> bool {
        self.http
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    pub async fn poll(&self, since: u64) -> Result<PollReply, ClientError> {
        let resp = self
            .http
            .get(format!("{}/poll", self.base_url))
            .query(&[("since", since.to_string())])
            .send()
            .await?;
        Ok(check_status(resp).await?.json().await?)
    }

    pub async fn status(&self) -> Result<StatusReply, ClientError> {
        let resp = self
            .http
            .get(format!("{}/status", self.base_url))
            .send()
            .await?;
        Ok(check_status(resp).await?.json().await?)
    }

    pub async fn clear(&self) -> Result<(), ClientError> {
        let resp = self
            .http
            .post(format!("{}/clear", self.base_url))
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    /// Fire the outbound trigger, passing our webhook URL in the
    /// `targetHost` header so the processing service knows where to call
    /// back. The eventual result arrives out-of-band at `/webhook`.
    pub async fn trigger(&self, trigger: &Trigger) -> Result<(), ClientError> {
        let mut req = self
            .http
            .post(&trigger.url)
            .header("targetHost", self.webhook_url())
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(token) = &trigger.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?;
        check_status(resp).await?;
        info!(url = %trigger.url, "trigger accepted");
        Ok(())
    }

    /// Run one full await cycle: baseline, optional trigger, poll loop.
    ///
    /// Polling stops the moment new data is observed — the state machine
    /// never re-polls past a receipt.
    pub async fn await_result(
        &self,
        budget: PollBudget,
        trigger: Option<&Trigger>,
    ) -> Result<AwaitedResult, ClientError> {
        // The store's current stamp is the baseline: anything at or below it
        // predates this cycle.
        let baseline = self.poll(0).await?.timestamp;
        let mut poller = Poller::new(budget);
        poller.begin(baseline);
        debug!(baseline, "await cycle started");

        if let Some(t) = trigger {
            self.trigger(t).await?;
        }

        let start = Instant::now();
        loop {
            tokio::time::sleep(budget.interval).await;
            let reply = self.poll(baseline).await?;
            let payload = if reply.has_new { reply.response } else { None };
            match poller.observe(reply.timestamp, payload, start.elapsed()) {
                Step::Continue => continue,
                Step::Received {
                    payload,
                    received_at,
                } => {
                    info!(received_at, "result received");
                    return Ok(AwaitedResult {
                        payload,
                        received_at,
                    });
                }
                Step::GaveUp { attempts, elapsed } => {
                    return Err(ClientError::BudgetExhausted { attempts, elapsed });
                }
            }
        }
    }
}

/// Turn a non-2xx reply into `ClientError::Status` with the body attached.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}
