mod key;
mod redb_cache;
mod traits;

pub use key::{CacheKey, MAX_IDEA_KEY_LEN};
pub use redb_cache::{RedbTileCache, CURRENT_SCHEMA_VERSION};
pub use traits::{CacheStats, TileCache};
