//! Page stabilization detection
//!
//! A page is stable once the document has finished loading, a landmark is
//! present, and the element and resource counts stop moving for a number of
//! consecutive probes.

use std::time::Duration;
use tracing::{debug, trace};

use super::deadline::Deadline;
use crate::config::Config;
use crate::error::NavigationFailure;
use crate::session::traits::{Locator, PageContext, PageProbe};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityPolicy {
    pub poll_interval: Duration,
    /// Identical consecutive probes required
    pub settle_polls: u32,
}

impl Default for StabilityPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            settle_polls: 2,
        }
    }
}

impl From<&Config> for StabilityPolicy {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval),
            settle_polls: config.settle_polls.max(1),
        }
    }
}

/// Poll `page` until it is stable or `deadline` ends the wait
pub async fn wait_stable(
    page: &dyn PageContext,
    landmarks: &[Locator],
    policy: &StabilityPolicy,
    deadline: &Deadline,
) -> Result<PageProbe, NavigationFailure> {
    let mut previous: Option<(u64, u64)> = None;
    let mut streak = 0u32;

    loop {
        match deadline.run(page.probe(landmarks)).await? {
            Ok(probe) if probe.is_complete() && probe.landmark_present => {
                let fingerprint = probe.fingerprint();
                streak = if previous == Some(fingerprint) { streak + 1 } else { 1 };
                previous = Some(fingerprint);
                trace!("{} settled probe {}/{}", probe.url, streak, policy.settle_polls);

                if streak >= policy.settle_polls {
                    debug!("Page stable: {} ({} nodes)", probe.url, probe.node_count);
                    return Ok(probe);
                }
            }
            Ok(probe) => {
                trace!("{} not ready: state={} landmark={}", probe.url, probe.ready_state, probe.landmark_present);
                previous = None;
                streak = 0;
            }
            Err(e) if !page.is_active() => return Err(NavigationFailure::Browser(e.to_string())),
            // Evaluation races with document replacement mid-navigation; poll again.
            Err(e) => debug!("Probe failed, retrying: {}", e),
        }

        deadline.sleep(policy.poll_interval).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock::{MockDocument, MockSite};
    use crate::session::traits::{BrowserOptions, ContextFactory};

    fn fast() -> StabilityPolicy {
        StabilityPolicy {
            poll_interval: Duration::from_millis(5),
            settle_polls: 2,
        }
    }

    #[tokio::test]
    async fn test_waits_for_settle_delay() {
        let site = MockSite::new();
        site.add_page(
            "https://example.test/p",
            MockDocument::new("<html><body><main>ok</main></body></html>")
                .settle_after(Duration::from_millis(40)),
        );
        let page = site.open_context(&BrowserOptions::default()).await.unwrap().page();
        page.navigate("https://example.test/p").await.unwrap();

        let probe = wait_stable(page.as_ref(), &[Locator::css("main")], &fast(), &Deadline::after(Duration::from_secs(2)))
            .await
            .unwrap();
        assert!(probe.is_complete());
    }

    #[tokio::test]
    async fn test_missing_landmark_times_out() {
        let site = MockSite::new();
        site.add_page("https://example.test/p", MockDocument::new("<html><body></body></html>"));
        let page = site.open_context(&BrowserOptions::default()).await.unwrap().page();
        page.navigate("https://example.test/p").await.unwrap();

        let result = wait_stable(
            page.as_ref(),
            &[Locator::css("#never")],
            &fast(),
            &Deadline::after(Duration::from_millis(60)),
        )
        .await;
        assert_eq!(result.unwrap_err(), NavigationFailure::Timeout);
    }

    #[tokio::test]
    async fn test_closed_page_fails_fast() {
        let site = MockSite::new();
        let context = site.open_context(&BrowserOptions::default()).await.unwrap();
        let page = context.page();
        context.close().await.unwrap();

        let result = wait_stable(page.as_ref(), &[], &fast(), &Deadline::after(Duration::from_secs(5))).await;
        assert!(matches!(result, Err(NavigationFailure::Browser(_))));
    }
}
