use crate::cache::{CacheStats, RedbTileCache, TileCache};
use crate::engine::{EngineConfig, TileEngine, TileFetch};
use crate::error::Result;
use crate::fetch::RemoteFetcher;
use crate::tiles::TileKind;
use crate::types::{TileRequest, TileState};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// High-level, embedded Mosaic API: one redb file plus a fetcher.
///
/// # Example
/// ```rust,no_run
/// use mosaic_core::{EngineConfig, InvokeResponse, Mosaic, RemoteFetcher, Result, TileRequest};
/// use mosaic_core::tiles::defaults;
///
/// struct MyFetcher;
///
/// #[async_trait::async_trait]
/// impl RemoteFetcher for MyFetcher {
///     async fn invoke(&self, _function: &str, _payload: serde_json::Value) -> Result<InvokeResponse> {
///         Ok(InvokeResponse::ok(serde_json::json!({"tam": 4_500_000_000u64})))
///     }
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let mosaic = Mosaic::open("./tiles.redb", EngineConfig::default(), MyFetcher)?;
///     let request = TileRequest::new("AI productivity app", defaults::market_size());
///     let fetch = mosaic.fetch(&request).await?;
///     println!("{:?}", fetch.data.metrics);
///     Ok(())
/// }
/// ```
pub struct Mosaic<F: RemoteFetcher> {
    engine: TileEngine<RedbTileCache, F>,
    cache: Arc<RedbTileCache>,
}

impl<F: RemoteFetcher> Mosaic<F> {
    /// Open (or create) a tile cache at the given path and wire it to a
    /// fetcher.
    pub fn open(path: impl AsRef<Path>, config: EngineConfig, fetcher: F) -> Result<Self> {
        let cache = Arc::new(RedbTileCache::open(path)?);
        let engine = TileEngine::new(cache.clone(), Arc::new(fetcher), config)?;
        Ok(Self { engine, cache })
    }

    /// Fetch one tile. See [`TileEngine::fetch_tile`].
    pub async fn fetch(&self, request: &TileRequest) -> Result<TileFetch> {
        self.engine.fetch_tile(request).await
    }

    /// Fetch several kinds for one idea concurrently, collecting partial
    /// failures per kind.
    pub async fn fetch_all(
        &self,
        idea_text: &str,
        kinds: &[TileKind],
    ) -> HashMap<TileKind, Result<TileFetch>> {
        self.engine
            .fetch_tiles(idea_text, kinds, &BTreeMap::new())
            .await
    }

    /// Fetch several kinds with shared filters.
    pub async fn fetch_all_filtered(
        &self,
        idea_text: &str,
        kinds: &[TileKind],
        filters: &BTreeMap<String, Value>,
    ) -> HashMap<TileKind, Result<TileFetch>> {
        self.engine.fetch_tiles(idea_text, kinds, filters).await
    }

    /// Current lifecycle state of a request's key.
    pub fn state(&self, request: &TileRequest) -> TileState {
        self.engine.state(request)
    }

    /// Access the underlying engine.
    pub fn engine(&self) -> &TileEngine<RedbTileCache, F> {
        &self.engine
    }

    pub fn cache_stats(&self) -> Result<CacheStats> {
        self.cache.stats()
    }

    pub fn clear_cache(&self) -> Result<()> {
        self.cache.clear()
    }
}
