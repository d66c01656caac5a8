//! Per-request cancellation and deadline handle

use crate::error::Interrupted;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Deadline used when `now + budget` is not representable (roughly 30 years)
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Wall-clock budget and cancellation for one request
///
/// Every suspension point of a request runs through [`RequestContext::run`], so
/// the probe, the download and the delivery all share one deadline instead of
/// getting a fresh budget each. The token is a child of the process-wide
/// shutdown token.
#[derive(Clone, Debug)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Instant,
    budget: Duration,
}

impl RequestContext {
    /// Create a context that expires `budget` from now, cancelled together with `parent`
    pub fn new(parent: &CancellationToken, budget: Duration) -> Self {
        Self {
            cancel: parent.child_token(),
            deadline: deadline_after(budget),
            budget,
        }
    }

    /// The full budget this context was created with
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left before the deadline
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Cancel this request (children of the parent token are unaffected)
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the request was cancelled or its deadline passed
    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || Instant::now() >= self.deadline
    }

    /// Drive `fut` to completion unless the deadline passes or the request is cancelled
    ///
    /// On interruption `fut` is dropped; child processes spawned with
    /// `kill_on_drop` are killed as a result.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, Interrupted>
    where
        F: Future,
    {
        if self.cancel.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupted::Cancelled),
            _ = tokio::time::sleep_until(self.deadline) => {
                Err(Interrupted::DeadlineExceeded(self.budget))
            }
            output = fut => Ok(output),
        }
    }
}

fn deadline_after(budget: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(budget)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}
