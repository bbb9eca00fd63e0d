use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Cache lifetime for API responses.
pub const CACHE_TTL: Duration = Duration::from_secs(300);

/// TTL cache for API responses, keyed by operation + arguments.
///
/// Safe for concurrent use; errors are never stored, so failures stay
/// visible immediately while successful polling is bounded.
#[derive(Debug, Default)]
pub struct ApiCache {
    entries: Mutex<HashMap<String, (Instant, serde_json::Value)>>,
}

impl ApiCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some((inserted, value)) if inserted.elapsed() < CACHE_TTL => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: &str, value: serde_json::Value) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(key.to_string(), (Instant::now(), value));
    }

    pub fn clear(&self) {
        self.entries.lock().expect("cache lock poisoned").clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}
