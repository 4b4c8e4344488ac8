//! Absolute deadlines with cooperative cancellation

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::NavigationFailure;

/// A point in time after which a wait gives up, plus a token the caller can
/// trip to abandon it early
#[derive(Debug, Clone)]
pub struct Deadline {
    at: Instant,
    cancel: CancellationToken,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self::with_cancel(budget, CancellationToken::new())
    }

    pub fn with_cancel(budget: Duration, cancel: CancellationToken) -> Self {
        Self {
            at: Instant::now() + budget,
            cancel,
        }
    }

    pub fn at(&self) -> Instant {
        self.at
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// A deadline `budget` from now, never later than this one, sharing its token
    pub fn child(&self, budget: Duration) -> Deadline {
        Deadline {
            at: self.at.min(Instant::now() + budget),
            cancel: self.cancel.clone(),
        }
    }

    /// Drive `fut` until it completes, the deadline passes, or the token trips
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, NavigationFailure> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(NavigationFailure::Cancelled),
            _ = tokio::time::sleep_until(self.at) => Err(NavigationFailure::Timeout),
            out = fut => Ok(out),
        }
    }

    /// Sleep for `delay`, failing at once if the deadline would pass first
    pub async fn sleep(&self, delay: Duration) -> Result<(), NavigationFailure> {
        if self.cancel.is_cancelled() {
            return Err(NavigationFailure::Cancelled);
        }
        if delay >= self.remaining() {
            return Err(NavigationFailure::Timeout);
        }
        self.run(tokio::time::sleep(delay)).await
    }
}
