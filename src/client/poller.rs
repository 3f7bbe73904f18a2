// SPDX-License-Identifier: MIT
// client/poller.rs — the client-side polling state machine.
//
// Idle → Awaiting (baseline recorded) → Received, bounded by a deadline
// and/or an attempt cap. Pure stepping logic: no clocks, no sockets, no
// timers — the driver feeds in observations and elapsed time, which keeps
// every transition unit-testable without a server.

use std::time::Duration;

/// Attempt/time budget for one await cycle.
#[derive(Debug, Clone, Copy)]
pub struct PollBudget {
    /// Delay between poll attempts.
    pub interval: Duration,
    /// Give up once this much wall-clock time has elapsed.
    pub deadline: Duration,
    /// Hard cap on poll attempts; 0 = bounded by the deadline only.
    pub max_attempts: u32,
}

/// Where the poller is in its cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerState {
    /// No cycle in progress.
    Idle,
    /// Baseline recorded; polling until something newer shows up.
    Awaiting { baseline: u64, attempts: u32 },
    /// New data consumed. Polling must not continue past this point —
    /// that is what keeps one poller from re-reporting an already
    /// delivered result.
    Received { payload: String, received_at: u64 },
}

/// What the driver should do after feeding in one poll reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing newer yet and budget remains — wait the interval, poll again.
    Continue,
    /// New data observed; the cycle is over.
    Received { payload: String, received_at: u64 },
    /// Budget exhausted without new data.
    GaveUp { attempts: u32, elapsed: Duration },
}

pub struct Poller {
    budget: PollBudget,
    state: PollerState,
}

impl Poller {
    pub fn new(budget: PollBudget) -> Self {
        Self {
            budget,
            state: PollerState::Idle,
        }
    }

    pub fn state(&self) -> &PollerState {
        &self.state
    }

    pub fn budget(&self) -> PollBudget {
        self.budget
    }

    /// Start a cycle: record the pre-trigger baseline timestamp.
    ///
    /// Everything at or below `baseline` is old news; only a strictly newer
    /// stamp counts as the awaited result.
    pub fn begin(&mut self, baseline: u64) {
        self.state = PollerState::Awaiting {
            baseline,
            attempts: 0,
        };
    }

    /// Feed in one poll reply and the wall-clock time elapsed since `begin`.
    ///
    /// `payload` is `Some` only when the server flagged new data. Calling
    /// this outside `Awaiting` is a no-op `Continue` (the driver loop has
    /// already terminated in the other states).
    pub fn observe(&mut self, timestamp: u64, payload: Option<String>, elapsed: Duration) -> Step {
        let PollerState::Awaiting { baseline, attempts } = &self.state else {
            return Step::Continue;
        };
        let (baseline, attempts) = (*baseline, *attempts + 1);

        if let Some(payload) = payload {
            if timestamp > baseline {
                self.state = PollerState::Received {
                    payload: payload.clone(),
                    received_at: timestamp,
                };
                return Step::Received {
                    payload,
                    received_at: timestamp,
                };
            }
        }

        let out_of_attempts = self.budget.max_attempts > 0 && attempts >= self.budget.max_attempts;
        if elapsed >= self.budget.deadline || out_of_attempts {
            self.state = PollerState::Idle;
            return Step::GaveUp { attempts, elapsed };
        }

        self.state = PollerState::Awaiting { baseline, attempts };
        Step::Continue
    }

    /// Abandon the current cycle and return to `Idle`.
    pub fn reset(&mut self) {
        self.state = PollerState::Idle;
    }
}
