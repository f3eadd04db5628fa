//! Bounded-time polling for workflow run completion.
//!
//! The poller decides when an asynchronously triggered workflow has
//! settled. It is deliberately tolerant: transient fetch failures count as
//! "still waiting" and are bounded only by the outer wall-clock deadline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::github::{self, PlatformClient};

/// How many recent runs to fetch per poll.
const FETCH_COUNT: u32 = 10;

/// How many of the fetched runs to inspect; older history is ignored.
const RECENT_WINDOW: usize = 5;

/// Terminal outcome of one polling session.
///
/// Kept as a tri-state rather than a boolean: a workflow that never
/// triggered is a different situation from one that ran out the clock, and
/// callers react differently to each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Every recent run reached a terminal status.
    Satisfied,
    /// Runs were still pending when the wait budget ran out.
    TimedOut,
    /// Two consecutive polls found no runs at all; the workflow most
    /// likely never triggered. Deliberate fail-fast, not an error.
    NeverTriggered,
}

impl PollOutcome {
    /// Returns true when all recent runs completed within the budget.
    pub fn is_satisfied(&self) -> bool {
        *self == PollOutcome::Satisfied
    }
}

/// Polls a workflow's recent runs until they settle or a deadline passes.
pub struct RunPoller<C> {
    client: Arc<C>,
    /// Pause between polls.
    interval: Duration,
    /// Pause before retrying when no runs have been recorded yet.
    grace: Duration,
}

impl<C: PlatformClient> RunPoller<C> {
    /// Creates a poller with the production cadence (10s interval, 5s
    /// no-runs grace).
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            interval: Duration::from_secs(10),
            grace: Duration::from_secs(5),
        }
    }

    /// Overrides the polling cadence. Tests use this to run fast.
    pub fn with_cadence(mut self, interval: Duration, grace: Duration) -> Self {
        self.interval = interval;
        self.grace = grace;
        self
    }

    /// Waits until the named workflow's recent runs have all completed.
    ///
    /// State machine: `Waiting` re-entered after every poll or transient
    /// error, leaving only through the three [`PollOutcome`] terminals.
    pub async fn await_completion(&self, workflow_file: &str, max_wait: Duration) -> PollOutcome {
        info!(workflow = %workflow_file, budget_secs = max_wait.as_secs(), "waiting for workflow runs to settle");

        let started = Instant::now();
        let mut empty_polls = 0u32;

        while started.elapsed() < max_wait {
            match github::workflow_runs(&*self.client, workflow_file, FETCH_COUNT).await {
                Some(runs) if !runs.is_empty() => {
                    let recent = &runs[..runs.len().min(RECENT_WINDOW)];
                    let pending = recent.iter().filter(|r| r.is_pending()).count();
                    let completed = recent.iter().filter(|r| r.is_completed()).count();

                    debug!(completed, pending, "poll status");

                    if pending == 0 {
                        info!(workflow = %workflow_file, "all recent runs completed");
                        return PollOutcome::Satisfied;
                    }
                }
                Some(_) => {
                    empty_polls += 1;
                    if empty_polls == 1 {
                        debug!(workflow = %workflow_file, "no runs recorded yet; retrying shortly");
                        sleep(self.grace).await;
                        continue;
                    }
                    warn!(workflow = %workflow_file, "no runs found after two checks; workflow may never have triggered");
                    return PollOutcome::NeverTriggered;
                }
                None => {
                    // Transient fetch failure: still waiting.
                    debug!(workflow = %workflow_file, "fetch failed while polling; will retry");
                }
            }

            debug!(elapsed_secs = started.elapsed().as_secs(), "still waiting");
            sleep(self.interval).await;
        }

        warn!(workflow = %workflow_file, waited_secs = started.elapsed().as_secs(), "workflow wait budget exhausted");
        PollOutcome::TimedOut
    }
}
