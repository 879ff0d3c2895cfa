use crate::cache::CacheKey;
use crate::error::Result;
use crate::types::{CacheEntry, TileData};

/// Persistent store for normalized tile payloads.
///
/// Implementations must treat an undecodable stored entry as absent: `get`
/// returns `Ok(None)`, never an error, so a poisoned entry cannot fail a
/// fetch. Storage-level errors are still reported; the orchestrator decides
/// the recovery policy (reads degrade to a miss, writes are best-effort).
pub trait TileCache: Send + Sync {
    /// Read the entry for a key. `Ok(None)` on absence or an undecodable
    /// stored value.
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;

    /// Write `{data, now}` for the key, replacing any previous entry.
    fn put(&self, key: &CacheKey, data: &TileData) -> Result<()>;

    /// Remove the entry for a key. Removing a missing key is not an error.
    fn invalidate(&self, key: &CacheKey) -> Result<()>;

    /// Number of stored entries.
    fn len(&self) -> Result<u64>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every entry.
    fn clear(&self) -> Result<()>;

    /// Store statistics snapshot.
    fn stats(&self) -> Result<CacheStats>;
}

/// Statistics for a tile cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: u64,
    pub schema_version: u32,
}
