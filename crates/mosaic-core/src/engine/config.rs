use crate::error::{MosaicError, Result};
use crate::tiles::{defaults, TileKind};
use std::collections::HashMap;
use std::time::Duration;

/// Configuration for the tile engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Consecutive failures before a key starts cooling down. Default: 3.
    pub failure_threshold: u32,

    /// How long a cooling-down key suppresses fetches. Default: 5 minutes.
    pub cooldown: Duration,

    /// Freshness window for kinds without an override. Default: 15 minutes.
    pub default_freshness: Duration,

    /// Per-kind freshness overrides. Slow-moving tiles (market size,
    /// competition) default to 30 minutes, news to 10.
    pub freshness_overrides: HashMap<TileKind, Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut freshness_overrides = HashMap::new();
        freshness_overrides.insert(defaults::market_size(), Duration::from_secs(30 * 60));
        freshness_overrides.insert(defaults::competition(), Duration::from_secs(30 * 60));
        freshness_overrides.insert(defaults::news_analysis(), Duration::from_secs(10 * 60));

        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(5 * 60),
            default_freshness: Duration::from_secs(15 * 60),
            freshness_overrides,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_default_freshness(mut self, window: Duration) -> Self {
        self.default_freshness = window;
        self
    }

    pub fn with_freshness_override(mut self, kind: TileKind, window: Duration) -> Self {
        self.freshness_overrides.insert(kind, window);
        self
    }

    /// Freshness window for a kind.
    pub fn freshness_for(&self, kind: &TileKind) -> Duration {
        self.freshness_overrides
            .get(kind)
            .copied()
            .unwrap_or(self.default_freshness)
    }

    pub fn validate(&self) -> Result<()> {
        if self.failure_threshold == 0 {
            return Err(MosaicError::Validation(
                "failure_threshold must be > 0".into(),
            ));
        }

        if self.cooldown.is_zero() {
            return Err(MosaicError::Validation("cooldown must be > 0".into()));
        }

        if self.default_freshness.is_zero() {
            return Err(MosaicError::Validation(
                "default_freshness must be > 0".into(),
            ));
        }

        if let Some((kind, _)) = self
            .freshness_overrides
            .iter()
            .find(|(_, window)| window.is_zero())
        {
            return Err(MosaicError::Validation(format!(
                "freshness override for `{}` must be > 0",
                kind
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.failure_threshold, 3);
        assert_eq!(
            config.freshness_for(&defaults::market_size()),
            Duration::from_secs(30 * 60)
        );
        assert_eq!(
            config.freshness_for(&defaults::sentiment()),
            Duration::from_secs(15 * 60)
        );
    }

    #[test]
    fn test_validation() {
        assert!(EngineConfig::new()
            .with_failure_threshold(0)
            .validate()
            .is_err());
        assert!(EngineConfig::new()
            .with_cooldown(Duration::ZERO)
            .validate()
            .is_err());
        assert!(EngineConfig::new()
            .with_freshness_override(defaults::sentiment(), Duration::ZERO)
            .validate()
            .is_err());
    }
}
