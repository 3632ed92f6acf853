//! Template Cache
//!
//! Advisory key/value store owned by the engine. Writes are dropped while the
//! cache is disabled; reads always count a hit or a miss.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Stored entries
    pub entry_count: usize,
    /// Cache hits
    pub hits: u64,
    /// Cache misses
    pub misses: u64,
    /// Hit rate (0.0 - 1.0)
    pub hit_rate: f64,
}

/// Opt-in key/value cache
#[derive(Debug, Clone, Default)]
pub struct TemplateCache {
    enabled: bool,
    entries: HashMap<String, serde_json::Value>,
    hits: u64,
    misses: u64,
}

impl TemplateCache {
    /// Creates a cache, enabled or not
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    /// Returns whether writes are accepted
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turns writes on or off. Existing entries are kept.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Stores a value. No-op while disabled.
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        if !self.enabled {
            return;
        }
        self.entries.insert(key.into(), value);
    }

    /// Reads a value, counting a hit or a miss.
    ///
    /// A disabled cache always misses.
    pub fn get(&mut self, key: &str) -> Option<serde_json::Value> {
        let found = if self.enabled {
            self.entries.get(key).cloned()
        } else {
            None
        };

        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    /// Drops one entry. No-op while disabled.
    pub fn remove(&mut self, key: &str) -> bool {
        self.enabled && self.entries.remove(key).is_some()
    }

    /// Drops every entry. No-op while disabled.
    pub fn clear(&mut self) {
        if self.enabled {
            self.entries.clear();
        }
    }

    /// Drops entries and counters regardless of the enabled flag
    pub fn reset(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Gets cache statistics
    pub fn stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        CacheStats {
            entry_count: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            hit_rate: if total > 0 {
                self.hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_disabled_cache_drops_writes() {
        let mut cache = TemplateCache::new(false);
        cache.set("a", json!(1));

        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_enabled_cache_put_get() {
        let mut cache = TemplateCache::new(true);
        cache.set("a", json!({ "x": 1 }));

        assert_eq!(cache.get("a"), Some(json!({ "x": 1 })));
        assert_eq!(cache.get("b"), None);

        let stats = cache.stats();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 0.5);
    }

    #[test]
    fn test_clear_only_when_enabled() {
        let mut cache = TemplateCache::new(true);
        cache.set("a", json!(1));
        cache.set_enabled(false);

        cache.clear();
        assert_eq!(cache.len(), 1);
        assert!(!cache.remove("a"));

        cache.set_enabled(true);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reset_clears_counters() {
        let mut cache = TemplateCache::new(true);
        cache.set("a", json!(1));
        cache.get("a");
        cache.get("b");

        cache.reset();
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
