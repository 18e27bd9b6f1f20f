//! Randomized pauses between browser actions.

use std::time::Duration;

use rand::Rng;

use crate::config::CrawlSettings;

/// A uniformly random delay in `[min, max]`. Returns `min` when the range is
/// empty.
pub fn random_delay(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let millis = rand::rng().random_range(min.as_millis()..=max.as_millis());
    Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
}

/// Sleeps for a random backoff within the configured bounds.
pub async fn pause(settings: &CrawlSettings) {
    let delay = random_delay(settings.backoff_min, settings.backoff_max);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
