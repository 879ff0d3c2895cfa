use crate::cache::{CacheKey, CacheStats, TileCache};
use crate::error::{MosaicError, Result};
use crate::types::{CacheEntry, TileData};
use chrono::{TimeZone, Utc};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Table definitions
const TILES: TableDefinition<&str, &[u8]> = TableDefinition::new("tiles");
const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

/// Current schema version.
/// v1 = bincode envelope with a serde_json payload, pipe-delimited keys.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;
const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Stored value: a bincode envelope around a serde_json payload. Tile data
/// carries dynamic JSON, which cannot round-trip through a
/// non-self-describing format, so only the envelope is binary.
#[derive(Serialize, Deserialize)]
struct StoredEntry {
    written_at_ms: i64,
    payload: Vec<u8>,
}

/// Redb-based tile cache.
pub struct RedbTileCache {
    db: Arc<Database>,
    #[allow(dead_code)]
    path: PathBuf,
}

impl RedbTileCache {
    /// Open or create a cache database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MosaicError::Validation(format!("Failed to create directory: {}", e))
            })?;
        }

        let is_new = !path.exists();
        let db = Database::create(&path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(TILES)?;
            let mut meta = write_txn.open_table(META)?;
            if is_new {
                meta.insert(
                    SCHEMA_VERSION_KEY,
                    CURRENT_SCHEMA_VERSION.to_string().as_bytes(),
                )?;
            }
        }
        write_txn.commit()?;

        if !is_new {
            Self::check_schema_version(&db)?;
        }

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    /// Check schema version. Returns error if the file is from a different
    /// key/envelope scheme.
    fn check_schema_version(db: &Database) -> Result<()> {
        let read_txn = db.begin_read()?;
        let version = {
            let table = read_txn.open_table(META).ok();
            table
                .and_then(|t| {
                    t.get(SCHEMA_VERSION_KEY).ok().flatten().and_then(|v| {
                        std::str::from_utf8(v.value())
                            .ok()
                            .and_then(|s| s.parse::<u32>().ok())
                    })
                })
                .unwrap_or(CURRENT_SCHEMA_VERSION)
        };

        if version != CURRENT_SCHEMA_VERSION {
            return Err(MosaicError::Validation(format!(
                "Cache schema v{} does not match this binary's v{}. Clear the cache file.",
                version, CURRENT_SCHEMA_VERSION
            )));
        }
        Ok(())
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize a tile payload into the stored envelope.
    fn encode(data: &TileData) -> Result<Vec<u8>> {
        let payload = serde_json::to_vec(data)?;
        let entry = StoredEntry {
            written_at_ms: Utc::now().timestamp_millis(),
            payload,
        };
        Ok(bincode::serialize(&entry)?)
    }

    /// Decode a stored envelope. `None` for bytes this version cannot read;
    /// callers treat that as a miss.
    fn decode(bytes: &[u8]) -> Option<CacheEntry> {
        let stored: StoredEntry = bincode::deserialize(bytes).ok()?;
        let data: TileData = serde_json::from_slice(&stored.payload).ok()?;
        let written_at = Utc.timestamp_millis_opt(stored.written_at_ms).single()?;
        Some(CacheEntry { data, written_at })
    }

    #[cfg(test)]
    fn insert_raw(&self, key: &CacheKey, bytes: &[u8]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TILES)?;
            table.insert(key.as_str(), bytes)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

impl TileCache for RedbTileCache {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TILES)?;
        let Some(raw) = table.get(key.as_str())? else {
            return Ok(None);
        };
        match Self::decode(raw.value()) {
            Some(entry) => Ok(Some(entry)),
            None => {
                log::warn!("Dropping undecodable cache entry for {}", key);
                Ok(None)
            }
        }
    }

    fn put(&self, key: &CacheKey, data: &TileData) -> Result<()> {
        let bytes = Self::encode(data)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TILES)?;
            table.insert(key.as_str(), bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn invalidate(&self, key: &CacheKey) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TILES)?;
            table.remove(key.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn len(&self) -> Result<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TILES)?;
        let mut count = 0u64;
        for item in table.iter()? {
            let _ = item?;
            count += 1;
        }
        Ok(count)
    }

    fn clear(&self) -> Result<()> {
        let keys: Vec<String> = {
            let read_txn = self.db.begin_read()?;
            let table = read_txn.open_table(TILES)?;
            let mut keys = Vec::new();
            for item in table.iter()? {
                let (key, _) = item?;
                keys.push(key.value().to_string());
            }
            keys
        };

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TILES)?;
            for key in &keys {
                table.remove(key.as_str())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    fn stats(&self) -> Result<CacheStats> {
        Ok(CacheStats {
            entries: self.len()?,
            schema_version: CURRENT_SCHEMA_VERSION,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::defaults;
    use crate::types::TileRequest;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    fn create_test_cache() -> (RedbTileCache, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("tiles_test.redb");
        let cache = RedbTileCache::open(&db_path).unwrap();
        (cache, temp_dir)
    }

    fn test_key() -> CacheKey {
        CacheKey::for_request(&TileRequest::new(
            "AI productivity app",
            defaults::market_size(),
        ))
    }

    fn test_data() -> TileData {
        let mut data = TileData::default();
        data.metrics.insert("tam".into(), json!(4_500_000_000u64));
        data.metrics.insert("sam".into(), json!(1_350_000_000u64));
        data.confidence = 0.8;
        data.extra.insert("foo".into(), json!(42));
        data
    }

    #[test]
    fn test_put_get_roundtrip() {
        let (cache, _temp) = create_test_cache();
        let key = test_key();

        assert!(cache.get(&key).unwrap().is_none());

        cache.put(&key, &test_data()).unwrap();
        let entry = cache.get(&key).unwrap().unwrap();
        assert_eq!(entry.data, test_data());
        assert!(entry.is_fresh(Duration::from_secs(60)));
    }

    #[test]
    fn test_put_replaces() {
        let (cache, _temp) = create_test_cache();
        let key = test_key();

        cache.put(&key, &test_data()).unwrap();
        let mut newer = test_data();
        newer.metrics.insert("tam".into(), json!(9_000_000_000u64));
        cache.put(&key, &newer).unwrap();

        let entry = cache.get(&key).unwrap().unwrap();
        assert_eq!(entry.data.metrics["tam"], json!(9_000_000_000u64));
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_invalidate() {
        let (cache, _temp) = create_test_cache();
        let key = test_key();

        // Missing key is fine
        cache.invalidate(&key).unwrap();

        cache.put(&key, &test_data()).unwrap();
        cache.invalidate(&key).unwrap();
        assert!(cache.get(&key).unwrap().is_none());
    }

    #[test]
    fn test_undecodable_entry_is_a_miss() {
        let (cache, _temp) = create_test_cache();
        let key = test_key();

        cache.insert_raw(&key, b"not an envelope").unwrap();
        assert!(cache.get(&key).unwrap().is_none());
    }

    #[test]
    fn test_clear_and_stats() {
        let (cache, _temp) = create_test_cache();
        for kind in defaults::all() {
            let key = CacheKey::for_request(&TileRequest::new("Some idea", kind));
            cache.put(&key, &test_data()).unwrap();
        }
        assert_eq!(cache.len().unwrap(), 9);

        let stats = cache.stats().unwrap();
        assert_eq!(stats.entries, 9);
        assert_eq!(stats.schema_version, CURRENT_SCHEMA_VERSION);

        cache.clear().unwrap();
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("tiles_test.redb");
        let key = test_key();

        {
            let cache = RedbTileCache::open(&db_path).unwrap();
            cache.put(&key, &test_data()).unwrap();
        }

        let cache = RedbTileCache::open(&db_path).unwrap();
        let entry = cache.get(&key).unwrap().unwrap();
        assert_eq!(entry.data, test_data());
    }
}
