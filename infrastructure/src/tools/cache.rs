//! Short-lived memoization of tool results.
//!
//! Voice queries often repeat within seconds ("price of bitcoin", then "and in
//! euros?"), and the data provider is the slowest hop in a round. The cache
//! keeps provider output for a short TTL, keyed by tool name plus the
//! canonical form of the arguments.
//!
//! Backed by `moka::sync::Cache`: expired entries are never returned and the
//! entry count is bounded.

use cryptovox_domain::CacheKey;
use moka::sync::Cache;
use serde_json::Value;
use std::time::Duration;
use tracing::trace;

/// Thread-safe TTL cache shared by every query of a service instance.
pub struct ResultCache {
    ttl: Duration,
    entries: Cache<CacheKey, String>,
}

impl ResultCache {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(15);
    pub const DEFAULT_MAX_ENTRIES: usize = 1024;

    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            entries: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(max_entries.max(1) as u64)
                .build(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a fresh entry.
    pub fn get(&self, tool_name: &str, arguments: &Value) -> Option<String> {
        let key = CacheKey::new(tool_name, arguments);
        let hit = self.entries.get(&key);
        trace!(key = %key, hit = hit.is_some(), "Cache lookup");
        hit
    }

    /// Store a provider result, replacing any previous entry for the key.
    pub fn put(&self, tool_name: &str, arguments: &Value, value: impl Into<String>) {
        self.entries
            .insert(CacheKey::new(tool_name, arguments), value.into());
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL, Self::DEFAULT_MAX_ENTRIES)
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hit_within_ttl() {
        let cache = ResultCache::new(Duration::from_secs(15), 16);
        let args = json!({ "ids": "bitcoin" });
        cache.put("get_simple_price", &args, r#"{"bitcoin":{"usd":67000}}"#);

        assert_eq!(
            cache.get("get_simple_price", &args).as_deref(),
            Some(r#"{"bitcoin":{"usd":67000}}"#)
        );
    }

    #[test]
    fn test_miss_after_ttl() {
        let cache = ResultCache::new(Duration::from_millis(50), 16);
        let args = json!({ "ids": "bitcoin" });
        cache.put("get_simple_price", &args, "v1");

        std::thread::sleep(Duration::from_millis(120));
        assert!(cache.get("get_simple_price", &args).is_none());

        cache.put("get_simple_price", &args, "v2");
        assert_eq!(cache.get("get_simple_price", &args).as_deref(), Some("v2"));
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let cache = ResultCache::default();
        let args = json!({ "ids": "bitcoin" });
        cache.put("get_simple_price", &args, "v1");
        cache.put("get_simple_price", &args, "v2");

        assert_eq!(cache.get("get_simple_price", &args).as_deref(), Some("v2"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_key_order_shares_entry() {
        let cache = ResultCache::default();
        let a: Value = serde_json::from_str(r#"{"ids":"bitcoin","vs_currencies":"usd"}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"vs_currencies":"usd","ids":"bitcoin"}"#).unwrap();

        cache.put("get_simple_price", &a, "67000");
        assert_eq!(cache.get("get_simple_price", &b).as_deref(), Some("67000"));
        assert!(cache.get("get_coins_markets", &b).is_none());
    }

    #[test]
    fn test_capacity_is_bounded() {
        let cache = ResultCache::new(Duration::from_secs(15), 2);
        for n in 0..10 {
            cache.put("t", &json!({ "n": n }), n.to_string());
        }
        assert!(cache.len() <= 2);
    }

    #[test]
    fn test_clear() {
        let cache = ResultCache::default();
        cache.put("t", &json!({}), "x");
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("t", &json!({})).is_none());
        assert_eq!(cache.ttl(), Duration::from_secs(15));
    }
}
