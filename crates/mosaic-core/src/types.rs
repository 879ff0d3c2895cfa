use crate::tiles::TileKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// A request for one tile's data.
///
/// Identity is the tuple (idea text normalized, kind, filters) — see
/// [`crate::cache::CacheKey`]. The idea text is always an explicit input;
/// nothing in the engine reads ambient state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileRequest {
    /// Free-text startup/product description that scopes all fetched data.
    pub idea_text: String,

    /// Which tile to fetch.
    pub kind: TileKind,

    /// Optional request parameters (region, time range, ...). Part of the
    /// cache identity. BTreeMap so serialization order is stable.
    #[serde(default)]
    pub filters: BTreeMap<String, Value>,

    /// Bypass a fresh cache entry and refetch, replacing it on success.
    #[serde(default)]
    pub force_refresh: bool,
}

impl TileRequest {
    pub fn new(idea_text: impl Into<String>, kind: TileKind) -> Self {
        Self {
            idea_text: idea_text.into(),
            kind,
            filters: BTreeMap::new(),
            force_refresh: false,
        }
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn force(mut self) -> Self {
        self.force_refresh = true;
        self
    }
}

/// Backend's own assessment of its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl DataQuality {
    /// Lenient parse: unrecognized or missing values are `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "high" => DataQuality::High,
            "medium" => DataQuality::Medium,
            "low" => DataQuality::Low,
            _ => DataQuality::Unknown,
        }
    }
}

/// Human-readable explanation attached to a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Explanation {
    #[serde(default)]
    pub summary: String,

    /// What the numbers mean for the idea, when the backend provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meaning: Option<String>,
}

impl From<String> for Explanation {
    fn from(summary: String) -> Self {
        Self {
            summary,
            meaning: None,
        }
    }
}

/// A source backing a tile's numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source: String,
    /// 0.0–1.0.
    #[serde(default)]
    pub relevance: f64,
}

/// A renderable chart series. Rendering itself is out of scope; this is the
/// data contract only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    #[serde(rename = "type")]
    pub chart_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub series: Vec<Value>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Canonical normalized tile payload.
///
/// `metrics` keys are kind-specific and unvalidated — consumers must treat
/// every metric access as optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TileData {
    #[serde(default)]
    pub metrics: Map<String, Value>,

    #[serde(default)]
    pub explanation: Explanation,

    #[serde(default)]
    pub citations: Vec<Citation>,

    #[serde(default)]
    pub charts: Vec<Chart>,

    /// Canonical 0.0–1.0. Percent-scale backend values are rescaled at the
    /// normalization boundary.
    #[serde(default)]
    pub confidence: f64,

    #[serde(default)]
    pub data_quality: DataQuality,

    /// Backend fields the per-kind rule did not recognize, preserved
    /// verbatim so consumers keep access to backend-specific extras.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One stored cache entry: an immutable snapshot. A refresh writes a new
/// entry, it never mutates in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: TileData,
    pub written_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(data: TileData) -> Self {
        Self {
            data,
            written_at: Utc::now(),
        }
    }

    /// Fresh iff strictly younger than `window` at `now`.
    pub fn is_fresh_at(&self, window: Duration, now: DateTime<Utc>) -> bool {
        let Ok(window) = chrono::Duration::from_std(window) else {
            return true;
        };
        now.signed_duration_since(self.written_at) < window
    }

    pub fn is_fresh(&self, window: Duration) -> bool {
        self.is_fresh_at(window, Utc::now())
    }
}

/// Per-key lifecycle of a tile fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileState {
    Idle,
    Loading,
    Success,
    Error,
    CoolingDown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_freshness_boundary() {
        let written = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let entry = CacheEntry {
            data: TileData::default(),
            written_at: written,
        };
        let window = Duration::from_secs(30 * 60);

        let just_inside = written + chrono::Duration::minutes(30) - chrono::Duration::milliseconds(1);
        let boundary = written + chrono::Duration::minutes(30);
        let just_outside = written + chrono::Duration::minutes(30) + chrono::Duration::milliseconds(1);

        assert!(entry.is_fresh_at(window, just_inside));
        assert!(!entry.is_fresh_at(window, boundary));
        assert!(!entry.is_fresh_at(window, just_outside));
    }

    #[test]
    fn test_tile_data_roundtrip_keeps_extra() {
        let mut data = TileData::default();
        data.metrics.insert("tam".into(), 42.into());
        data.extra.insert("foo".into(), 42.into());

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["foo"], 42);

        let back: TileData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_data_quality_parse() {
        assert_eq!(DataQuality::parse("High"), DataQuality::High);
        assert_eq!(DataQuality::parse("medium"), DataQuality::Medium);
        assert_eq!(DataQuality::parse("garbage"), DataQuality::Unknown);
    }

    #[test]
    fn test_request_builder() {
        let req = TileRequest::new("AI productivity app", crate::tiles::defaults::market_size())
            .with_filter("region", "eu")
            .force();
        assert!(req.force_refresh);
        assert_eq!(req.filters["region"], "eu");
    }
}
