pub mod api;
pub mod cache;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod tiles;
pub mod types;

pub use api::Mosaic;
pub use cache::{CacheKey, CacheStats, RedbTileCache, TileCache, CURRENT_SCHEMA_VERSION};
pub use engine::{EngineConfig, FailureRecord, FetchSource, TileEngine, TileFetch};
pub use error::{MosaicError, Result};
pub use fetch::{InvokeResponse, RemoteFetcher};
pub use normalize::normalize;
pub use tiles::{TileKind, FALLBACK_FUNCTION};
pub use types::{
    CacheEntry, Chart, Citation, DataQuality, Explanation, TileData, TileRequest, TileState,
};
