use crate::error::{MosaicError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend function invoked for kinds with no specific mapping.
pub const FALLBACK_FUNCTION: &str = "dashboard-insights";

/// Maximum length of a tile kind identifier.
const MAX_KIND_LEN: usize = 64;

/// One analytical dimension of the dashboard (market size, sentiment,
/// competition, ...). String-backed so deployments can introduce kinds the
/// well-known set doesn't cover; unknown kinds route to [`FALLBACK_FUNCTION`]
/// and the generic normalizer rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileKind(String);

impl TileKind {
    /// Validated constructor. Kind identifiers are non-empty lowercase
    /// `snake_case` (`a-z`, `0-9`, `_`), at most 64 characters.
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(MosaicError::Validation("Tile kind must not be empty".into()));
        }
        if name.len() > MAX_KIND_LEN {
            return Err(MosaicError::Validation(format!(
                "Tile kind `{}` exceeds {} characters",
                name, MAX_KIND_LEN
            )));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(MosaicError::Validation(format!(
                "Tile kind `{}` must be lowercase snake_case",
                name
            )));
        }
        Ok(TileKind(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backend function handling this kind. Kinds outside the well-known set
    /// resolve to [`FALLBACK_FUNCTION`].
    pub fn function_name(&self) -> &'static str {
        match self.0.as_str() {
            "market_size" => "market-size",
            "competition" => "competition",
            "sentiment" => "sentiment",
            "news_analysis" => "news-analysis",
            "google_trends" => "google-trends",
            "reddit_signals" => "reddit-signals",
            "twitter_signals" => "twitter-signals",
            "amazon_reviews" => "amazon-reviews",
            "youtube_signals" => "youtube-signals",
            _ => FALLBACK_FUNCTION,
        }
    }

    /// Whether this kind has its own backend function mapping.
    pub fn is_well_known(&self) -> bool {
        self.function_name() != FALLBACK_FUNCTION
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for TileKind {
    type Err = MosaicError;

    fn from_str(s: &str) -> Result<Self> {
        TileKind::new(s)
    }
}

/// The 9 well-known tile kinds shipped with Mosaic.
pub mod defaults {
    use super::*;

    pub fn market_size() -> TileKind {
        TileKind::new("market_size").unwrap()
    }
    pub fn competition() -> TileKind {
        TileKind::new("competition").unwrap()
    }
    pub fn sentiment() -> TileKind {
        TileKind::new("sentiment").unwrap()
    }
    pub fn news_analysis() -> TileKind {
        TileKind::new("news_analysis").unwrap()
    }
    pub fn google_trends() -> TileKind {
        TileKind::new("google_trends").unwrap()
    }
    pub fn reddit_signals() -> TileKind {
        TileKind::new("reddit_signals").unwrap()
    }
    pub fn twitter_signals() -> TileKind {
        TileKind::new("twitter_signals").unwrap()
    }
    pub fn amazon_reviews() -> TileKind {
        TileKind::new("amazon_reviews").unwrap()
    }
    pub fn youtube_signals() -> TileKind {
        TileKind::new("youtube_signals").unwrap()
    }

    pub fn all() -> Vec<TileKind> {
        vec![
            market_size(),
            competition(),
            sentiment(),
            news_analysis(),
            google_trends(),
            reddit_signals(),
            twitter_signals(),
            amazon_reviews(),
            youtube_signals(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_kinds() {
        assert!(TileKind::new("market_size").is_ok());
        assert!(TileKind::new("a2b").is_ok());
        assert!(TileKind::new("").is_err());
        assert!(TileKind::new("Market_Size").is_err());
        assert!(TileKind::new("market size").is_err());
        assert!(TileKind::new(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_function_mapping() {
        assert_eq!(defaults::market_size().function_name(), "market-size");
        assert_eq!(defaults::news_analysis().function_name(), "news-analysis");
        assert_eq!(
            TileKind::new("pricing_signals").unwrap().function_name(),
            FALLBACK_FUNCTION
        );
    }

    #[test]
    fn test_well_known() {
        for kind in defaults::all() {
            assert!(kind.is_well_known(), "{} should be well-known", kind);
        }
        assert!(!TileKind::new("custom_tile").unwrap().is_well_known());
    }
}
