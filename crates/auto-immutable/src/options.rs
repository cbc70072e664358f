//! Option structs for the cache and the store.

use serde::Deserialize;

/// Options for [`Cache`](crate::cache::Cache).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Above this many declared paths an accessor builds a lookup table of
    /// its own paths when refreshing instead of scanning them per stale path.
    pub lookup_threshold: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self { lookup_threshold: 100 }
    }
}

/// Options for [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Storage key under which the initial tree is kept for resets.
    pub storage_key: String,
    pub cache: CacheOptions,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            storage_key: "auto-immutable:original".to_string(),
            cache: CacheOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_fields_take_defaults() {
        let options: StoreOptions = serde_json::from_value(json!({"cache": {}})).unwrap();
        assert_eq!(options, StoreOptions::default());

        let options: StoreOptions =
            serde_json::from_value(json!({"storage_key": "k", "cache": {"lookup_threshold": 8}})).unwrap();
        assert_eq!(options.storage_key, "k");
        assert_eq!(options.cache.lookup_threshold, 8);
    }
}
