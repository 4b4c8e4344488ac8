//! Randomized pauses between page interactions

use rand::Rng;
use std::time::Duration;

use crate::config::Config;
use crate::error::NavigationFailure;
use crate::navigator::deadline::Deadline;

/// Human-like pause generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumanPacing {
    min_ms: u64,
    max_ms: u64,
}

impl HumanPacing {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: max_ms.max(min_ms),
        }
    }

    /// No pauses at all
    pub fn disabled() -> Self {
        Self::new(0, 0)
    }

    pub fn from_config(config: &Config) -> Self {
        if config.stealth_enabled {
            Self::new(config.pacing_min, config.pacing_max)
        } else {
            Self::disabled()
        }
    }

    pub fn next_delay(&self) -> Duration {
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        // Generate before any await; ThreadRng is not Send.
        let ms = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    /// Pause for a random delay, bounded by `deadline`
    pub async fn pause(&self, deadline: &Deadline) -> Result<(), NavigationFailure> {
        let delay = self.next_delay();
        if delay.is_zero() {
            return Ok(());
        }
        deadline.sleep(delay).await
    }
}

impl Default for HumanPacing {
    fn default() -> Self {
        Self::new(500, 1_500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_stays_in_bounds() {
        let pacing = HumanPacing::new(10, 20);
        for _ in 0..100 {
            let delay = pacing.next_delay();
            assert!(delay >= Duration::from_millis(10) && delay <= Duration::from_millis(20));
        }
    }

    #[test]
    fn test_disabled_pacing_never_sleeps() {
        assert_eq!(HumanPacing::disabled().next_delay(), Duration::ZERO);
    }

    #[test]
    fn test_stealth_off_disables_pacing() {
        let config = Config {
            stealth_enabled: false,
            ..Default::default()
        };
        assert_eq!(HumanPacing::from_config(&config), HumanPacing::disabled());
    }

    #[tokio::test]
    async fn test_pause_respects_deadline() {
        let pacing = HumanPacing::new(3_000, 3_000);
        let started = std::time::Instant::now();
        let result = pacing.pause(&Deadline::after(Duration::from_millis(100))).await;
        assert_eq!(result, Err(NavigationFailure::Timeout));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_disabled_pause_ignores_expired_deadline() {
        let deadline = Deadline::after(Duration::ZERO);
        tokio_test::assert_ok!(HumanPacing::disabled().pause(&deadline).await);
    }

    #[test]
    fn test_swapped_bounds_are_normalized() {
        let pacing = HumanPacing::new(30, 5);
        let delay = pacing.next_delay();
        assert!(delay >= Duration::from_millis(5) && delay <= Duration::from_millis(30));
    }
}
