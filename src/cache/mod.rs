//! Read cache for published content.
//!
//! Holds one pre-serialized `{version, data}` entry per content type. The cache is a
//! derived copy of the content store; it has no TTL and is only written by the
//! internal publish and rebuild paths.

mod memory;
mod sqlite;

pub use memory::MemoryCache;
pub use sqlite::SqliteCache;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::CacheEntry;

/// Key-value store holding serialized cache entries.
#[async_trait]
pub trait ReadCache: Send + Sync {
    /// Get the serialized entry stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<(), AppError>;

    /// Remove `key`. Returns whether an entry existed.
    async fn delete(&self, key: &str) -> Result<bool, AppError>;
}

/// Serialize `entry` and store it under `key`.
pub async fn store_entry(
    cache: &dyn ReadCache,
    key: &str,
    entry: &CacheEntry,
) -> Result<(), AppError> {
    let value = serde_json::to_string(entry)
        .map_err(|e| AppError::Cache(format!("Failed to encode cache entry: {}", e)))?;
    cache.set(key, value).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_store_entry_serializes_version_and_data() {
        let cache = MemoryCache::new();
        let entry = CacheEntry {
            version: 7,
            data: json!({ "bio": "Engineer" }),
        };

        store_entry(&cache, "about", &entry).await.unwrap();

        assert_eq!(
            cache.get("about").await.unwrap().as_deref(),
            Some(r#"{"version":7,"data":{"bio":"Engineer"}}"#)
        );
        assert_eq!(cache.get("projects").await.unwrap(), None);
    }
}
