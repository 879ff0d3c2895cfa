mod breaker;
mod config;

pub use breaker::{FailureRecord, FailureTracker};
pub use config::EngineConfig;

use crate::cache::{CacheKey, TileCache};
use crate::error::{MosaicError, Result};
use crate::fetch::RemoteFetcher;
use crate::normalize;
use crate::tiles::TileKind;
use crate::types::{CacheEntry, TileData, TileRequest, TileState};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// Which path produced the returned tile data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    /// Fresh cache hit; the backend was not called.
    Cache,
    /// Fetched from the backend on this call.
    Remote,
    /// The refresh did not happen; this is previously cached data.
    Stale,
}

/// Result of a tile fetch: the data plus how it was obtained.
#[derive(Debug, Clone)]
pub struct TileFetch {
    pub data: TileData,
    pub source: FetchSource,
    /// Present when `source` is [`FetchSource::Stale`]: why the refresh
    /// failed or was suppressed.
    pub refresh_error: Option<String>,
}

/// Orchestrates per-tile fetches across the cache, the circuit breaker and
/// the remote boundary.
///
/// Each (idea, kind, filters) tuple is an independent key: its cache entry,
/// failure record and lifecycle state never interact with another key's, so
/// a dashboard fetching many tiles concurrently cannot have one tile's
/// failure corrupt another's.
pub struct TileEngine<C: TileCache, F: RemoteFetcher> {
    cache: Arc<C>,
    fetcher: Arc<F>,
    config: EngineConfig,
    failures: FailureTracker,
    states: RwLock<HashMap<CacheKey, TileState>>,
}

impl<C: TileCache, F: RemoteFetcher> TileEngine<C, F> {
    pub fn new(cache: Arc<C>, fetcher: Arc<F>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let failures = FailureTracker::new(config.failure_threshold, config.cooldown);
        Ok(Self {
            cache,
            fetcher,
            config,
            failures,
            states: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current lifecycle state of a request's key.
    pub fn state(&self, request: &TileRequest) -> TileState {
        let key = CacheKey::for_request(request);
        self.states
            .read()
            .unwrap()
            .get(&key)
            .copied()
            .unwrap_or(TileState::Idle)
    }

    /// Snapshot of a request's failure record.
    pub fn failure_record(&self, request: &TileRequest) -> FailureRecord {
        self.failures.record(&CacheKey::for_request(request))
    }

    /// Fetch one tile.
    ///
    /// The dominant path is a fresh cache hit, answered without touching
    /// the network. A miss (or `force_refresh`) goes to the backend unless
    /// the key is cooling down after repeated failures. Failures never
    /// regress the caller from data to no-data: whenever any cached entry
    /// exists, it is returned marked [`FetchSource::Stale`] with the
    /// refresh error attached, and only a failure with nothing cached
    /// surfaces as `Err`.
    pub async fn fetch_tile(&self, request: &TileRequest) -> Result<TileFetch> {
        let key = CacheKey::for_request(request);
        let window = self.config.freshness_for(&request.kind);

        if !request.force_refresh {
            if let Some(entry) = self.cached(&key) {
                if entry.is_fresh(window) {
                    self.set_state(&key, TileState::Success);
                    return Ok(TileFetch {
                        data: entry.data,
                        source: FetchSource::Cache,
                        refresh_error: None,
                    });
                }
            }
        }

        // Suppressed keys never reach the fetcher.
        if let Some(retry_in) = self.failures.cooling_down(&key) {
            self.set_state(&key, TileState::CoolingDown);
            let err = MosaicError::CooldownActive {
                kind: request.kind.clone(),
                retry_in,
            };
            return self.stale_or(err, &key);
        }

        if request.force_refresh {
            // A forced refresh replaces the entry, never merges with it.
            if let Err(e) = self.cache.invalidate(&key) {
                log::warn!("Cache invalidation failed for {}: {}", key, e);
            }
        }

        self.set_state(&key, TileState::Loading);
        match self.invoke(request).await {
            Ok(raw) => {
                let data = normalize::normalize(&request.kind, &raw);
                // Best effort: a failed write never blocks the result.
                if let Err(e) = self.cache.put(&key, &data) {
                    log::warn!("Cache write failed for {}: {}", key, e);
                }
                self.failures.record_success(&key);
                self.set_state(&key, TileState::Success);
                Ok(TileFetch {
                    data,
                    source: FetchSource::Remote,
                    refresh_error: None,
                })
            }
            Err(e) => {
                if self.failures.record_failure(&key) {
                    log::warn!(
                        "Cooling down {} after {} consecutive failures",
                        key,
                        self.config.failure_threshold
                    );
                    self.set_state(&key, TileState::CoolingDown);
                } else {
                    self.set_state(&key, TileState::Error);
                }
                let err = MosaicError::RemoteFetch {
                    kind: request.kind.clone(),
                    message: e.to_string(),
                };
                self.stale_or(err, &key)
            }
        }
    }

    /// Fetch several kinds for one idea concurrently. Partial failures are
    /// collected per kind; one failing kind never aborts the batch.
    pub async fn fetch_tiles(
        &self,
        idea_text: &str,
        kinds: &[TileKind],
        filters: &BTreeMap<String, Value>,
    ) -> HashMap<TileKind, Result<TileFetch>> {
        let fetches = kinds.iter().map(|kind| {
            let request = TileRequest {
                idea_text: idea_text.to_string(),
                kind: kind.clone(),
                filters: filters.clone(),
                force_refresh: false,
            };
            async move {
                let result = self.fetch_tile(&request).await;
                (request.kind, result)
            }
        });
        futures::future::join_all(fetches).await.into_iter().collect()
    }

    /// Call the backend function for a request and peel the `{data, error}`
    /// envelope. No automatic retries: retry is the user's refresh action
    /// or the cooldown-gated next natural call.
    async fn invoke(&self, request: &TileRequest) -> Result<Value> {
        let function = request.kind.function_name();
        if !request.kind.is_well_known() {
            log::debug!(
                "No function mapping for tile kind `{}`, using `{}`",
                request.kind,
                function
            );
        }
        let payload = json!({
            "ideaText": request.idea_text,
            "tileType": request.kind.as_str(),
            "filters": request.filters,
        });
        let response = self.fetcher.invoke(function, payload).await?;
        if let Some(error) = response.error {
            return Err(MosaicError::Invoke {
                function: function.to_string(),
                message: error.to_string(),
            });
        }
        Ok(response.data)
    }

    /// Read the cached entry for a key, treating storage errors as a miss.
    fn cached(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.cache.get(key) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Prefer previously cached data over surfacing a refresh failure.
    fn stale_or(&self, err: MosaicError, key: &CacheKey) -> Result<TileFetch> {
        match self.cached(key) {
            Some(entry) => Ok(TileFetch {
                data: entry.data,
                source: FetchSource::Stale,
                refresh_error: Some(err.to_string()),
            }),
            None => Err(err),
        }
    }

    fn set_state(&self, key: &CacheKey, state: TileState) {
        self.states.write().unwrap().insert(key.clone(), state);
    }
}
