use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::Value;

#[derive(Debug, Clone)]
struct Entry {
    method: String,
    response: Value,
    stored_at: Instant,
}

/// Single-slot cache for blockhash lookups, which every wallet page fires on load.
#[derive(Debug)]
pub struct ResponseCache {
    methods: Vec<String>,
    ttl: Duration,
    entry: Mutex<Option<Entry>>,
}

impl ResponseCache {
    pub fn new(methods: Vec<String>, ttl: Duration) -> Self {
        Self {
            methods,
            ttl,
            entry: Mutex::new(None),
        }
    }

    pub fn is_cacheable(&self, method: &str) -> bool {
        !self.ttl.is_zero() && self.methods.iter().any(|cached| cached == method)
    }

    /// Returns the stored response re-addressed to `id`, if it is for `method` and younger than the TTL.
    pub fn get(&self, method: &str, id: Option<&Value>, now: Instant) -> Option<Value> {
        let entry = self.entry.lock();
        let entry = entry.as_ref()?;
        if entry.method != method || now.saturating_duration_since(entry.stored_at) >= self.ttl {
            return None;
        }

        let mut response = entry.response.clone();
        if let Some(object) = response.as_object_mut() {
            object.insert("id".to_string(), id.cloned().unwrap_or(Value::Null));
        }
        Some(response)
    }

    /// Keeps only successful JSON-RPC answers.
    pub fn put(&self, method: &str, response: &Value, now: Instant) {
        if !self.is_cacheable(method)
            || response.get("error").is_some()
            || response.get("result").is_none()
        {
            return;
        }
        *self.entry.lock() = Some(Entry {
            method: method.to_string(),
            response: response.clone(),
            stored_at: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use serde_json::json;

    use super::ResponseCache;

    fn cache() -> ResponseCache {
        ResponseCache::new(
            vec!["getLatestBlockhash".to_string(), "getRecentBlockhash".to_string()],
            Duration::from_secs(10),
        )
    }

    fn blockhash_response(id: u64) -> serde_json::Value {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": { "context": { "slot": 1 }, "value": { "blockhash": "abc", "lastValidBlockHeight": 9 } }
        })
    }

    #[test]
    fn hit_rewrites_the_request_id() {
        let cache = cache();
        let now = Instant::now();
        cache.put("getLatestBlockhash", &blockhash_response(1), now);

        let hit = cache
            .get("getLatestBlockhash", Some(&json!("client-7")), now + Duration::from_secs(3))
            .expect("entry is fresh");

        assert_eq!(hit["id"], json!("client-7"));
        assert_eq!(hit["result"], blockhash_response(1)["result"]);
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache = cache();
        let now = Instant::now();
        cache.put("getLatestBlockhash", &blockhash_response(1), now);

        assert!(cache
            .get("getLatestBlockhash", Some(&json!(2)), now + Duration::from_secs(10))
            .is_none());
    }

    #[test]
    fn single_slot_is_keyed_by_method() {
        let cache = cache();
        let now = Instant::now();
        cache.put("getLatestBlockhash", &blockhash_response(1), now);
        cache.put("getRecentBlockhash", &blockhash_response(2), now);

        assert!(cache.get("getLatestBlockhash", None, now).is_none());
        assert!(cache.get("getRecentBlockhash", None, now).is_some());
    }

    #[test]
    fn ignores_errors_and_other_methods() {
        let cache = cache();
        let now = Instant::now();
        cache.put(
            "getLatestBlockhash",
            &json!({ "jsonrpc": "2.0", "id": 1, "error": { "code": -32005, "message": "busy" } }),
            now,
        );
        cache.put("getBalance", &json!({ "jsonrpc": "2.0", "id": 1, "result": 5 }), now);

        assert!(cache.get("getLatestBlockhash", None, now).is_none());
        assert!(cache.get("getBalance", None, now).is_none());
        assert!(!cache.is_cacheable("getBalance"));
    }

    #[test]
    fn zero_ttl_disables_caching() {
        let cache = ResponseCache::new(vec!["getLatestBlockhash".to_string()], Duration::ZERO);
        assert!(!cache.is_cacheable("getLatestBlockhash"));
    }
}
