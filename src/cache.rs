//! In-memory response cache.
//!
//! A plain string-keyed map; the search client keys entries by the
//! serialized query. No eviction: a client instance lives as long as its
//! page/process and the entry count tracks distinct queries.

use std::collections::HashMap;

/// String-keyed in-memory cache.
#[derive(Debug, Default)]
pub struct Cache<V> {
    entries: HashMap<String, V>,
}

impl<V> Cache<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: V) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_has() {
        let mut cache: Cache<u32> = Cache::new();
        assert!(!cache.has("a"));
        cache.set("a", 1);
        assert!(cache.has("a"));
        assert_eq!(cache.get("a"), Some(&1));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_set_overwrites() {
        let mut cache: Cache<u32> = Cache::new();
        cache.set("a", 1);
        cache.set("a", 2);
        assert_eq!(cache.get("a"), Some(&2));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_delete_and_clear() {
        let mut cache: Cache<&str> = Cache::new();
        cache.set("a", "x");
        cache.set("b", "y");

        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        assert_eq!(cache.size(), 1);

        cache.clear();
        assert_eq!(cache.size(), 0);
        assert!(cache.get("b").is_none());
    }
}
