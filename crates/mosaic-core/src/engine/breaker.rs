use crate::cache::CacheKey;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Failure bookkeeping for one cache key.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureRecord {
    pub consecutive_failures: u32,
    pub cooldown_until: Option<Instant>,
}

/// Per-key circuit breaker.
///
/// After `threshold` consecutive failures a key cools down for `cooldown`;
/// during that time fetches for it are suppressed, not queued. Expiry
/// re-admits the next attempt; only a success clears the failure count, so
/// a failing attempt after expiry re-arms immediately. State is in-memory
/// and resets on restart.
pub struct FailureTracker {
    threshold: u32,
    cooldown: Duration,
    records: Mutex<HashMap<CacheKey, FailureRecord>>,
}

impl FailureTracker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Remaining cooldown for a key, if it is currently suppressed. An
    /// expired cooldown is cleared as a side effect.
    pub fn cooling_down(&self, key: &CacheKey) -> Option<Duration> {
        let mut records = self.records.lock().unwrap();
        let record = records.get_mut(key)?;
        let until = record.cooldown_until?;
        let now = Instant::now();
        if until > now {
            Some(until - now)
        } else {
            record.cooldown_until = None;
            None
        }
    }

    /// Record a failed fetch. Returns true when this failure armed the
    /// cooldown.
    pub fn record_failure(&self, key: &CacheKey) -> bool {
        let mut records = self.records.lock().unwrap();
        let record = records.entry(key.clone()).or_default();
        record.consecutive_failures += 1;
        if record.consecutive_failures >= self.threshold && record.cooldown_until.is_none() {
            record.cooldown_until = Some(Instant::now() + self.cooldown);
            return true;
        }
        false
    }

    /// Record a successful fetch: clears the key's failure history.
    pub fn record_success(&self, key: &CacheKey) {
        self.records.lock().unwrap().remove(key);
    }

    /// Snapshot of a key's record.
    pub fn record(&self, key: &CacheKey) -> FailureRecord {
        self.records
            .lock()
            .unwrap()
            .get(key)
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::defaults;
    use crate::types::TileRequest;

    fn key() -> CacheKey {
        CacheKey::for_request(&TileRequest::new("Some idea", defaults::sentiment()))
    }

    #[test]
    fn test_arms_at_threshold() {
        let tracker = FailureTracker::new(3, Duration::from_secs(300));
        let key = key();

        assert!(!tracker.record_failure(&key));
        assert!(!tracker.record_failure(&key));
        assert!(tracker.cooling_down(&key).is_none());

        assert!(tracker.record_failure(&key));
        let remaining = tracker.cooling_down(&key).unwrap();
        assert!(remaining <= Duration::from_secs(300));
        assert!(remaining > Duration::from_secs(290));
    }

    #[test]
    fn test_success_resets() {
        let tracker = FailureTracker::new(3, Duration::from_secs(300));
        let key = key();

        tracker.record_failure(&key);
        tracker.record_failure(&key);
        tracker.record_success(&key);
        assert_eq!(tracker.record(&key).consecutive_failures, 0);

        // Threshold counts from scratch after a success
        assert!(!tracker.record_failure(&key));
        assert!(!tracker.record_failure(&key));
        assert!(tracker.record_failure(&key));
    }

    #[test]
    fn test_expiry_readmits_then_failure_rearms() {
        let tracker = FailureTracker::new(1, Duration::from_millis(20));
        let key = key();

        assert!(tracker.record_failure(&key));
        assert!(tracker.cooling_down(&key).is_some());

        std::thread::sleep(Duration::from_millis(30));
        assert!(tracker.cooling_down(&key).is_none());

        // Count was not cleared by expiry, so one more failure re-arms
        assert!(tracker.record_failure(&key));
        assert!(tracker.cooling_down(&key).is_some());
    }

    #[test]
    fn test_keys_are_independent() {
        let tracker = FailureTracker::new(1, Duration::from_secs(300));
        let a = key();
        let b = CacheKey::for_request(&TileRequest::new("Other idea", defaults::sentiment()));

        tracker.record_failure(&a);
        assert!(tracker.cooling_down(&a).is_some());
        assert!(tracker.cooling_down(&b).is_none());
    }
}
