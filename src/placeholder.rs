//! Placeholder store for large binary answers.
//!
//! The agent never sees a base64 payload directly. Tools store the payload here
//! and hand the model a short `BASE64_KEY:<uuid>` token instead; the normalizer
//! swaps the token back for the payload right before submission.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Prefix of every placeholder key.
pub const PLACEHOLDER_PREFIX: &str = "BASE64_KEY:";

#[derive(Debug, Clone)]
struct Entry {
    payload: String,
    stored_at: DateTime<Utc>,
}

/// Shared key -> payload map with optional age-based eviction.
#[derive(Debug, Default)]
pub struct PlaceholderStore {
    entries: RwLock<HashMap<String, Entry>>,
    ttl: Option<Duration>,
}

impl PlaceholderStore {
    /// Create a store that keeps payloads for the life of the process.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that drops payloads older than `seconds`.
    pub fn with_ttl_seconds(seconds: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Some(Duration::seconds(seconds as i64)),
        }
    }

    /// Store a payload and return its freshly generated key.
    pub fn insert(&self, payload: String) -> String {
        self.evict_expired();

        let key = format!("{}{}", PLACEHOLDER_PREFIX, Uuid::new_v4());
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key.clone(),
            Entry {
                payload,
                stored_at: Utc::now(),
            },
        );
        debug!("Stored placeholder {} ({} entries)", key, entries.len());
        key
    }

    /// Look up a payload by its full key. Expired entries are treated as absent.
    pub fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        if self.is_expired(entry, Utc::now()) {
            return None;
        }
        Some(entry.payload.clone())
    }

    /// Remove expired entries, returning how many were dropped.
    pub fn evict_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let now = Utc::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        match self.ttl {
            Some(ttl) => now - entry.stored_at >= ttl,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let store = PlaceholderStore::new();
        let key = store.insert("aGVsbG8=".to_string());

        assert!(key.starts_with(PLACEHOLDER_PREFIX));
        assert_eq!(store.get(&key).as_deref(), Some("aGVsbG8="));
        assert_eq!(store.len(), 1);
        assert!(store.get("BASE64_KEY:missing").is_none());
    }

    #[test]
    fn test_keys_are_unique() {
        let store = PlaceholderStore::new();
        let a = store.insert("a".to_string());
        let b = store.insert("a".to_string());
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let store = PlaceholderStore::with_ttl_seconds(0);
        let key = store.insert("payload".to_string());

        assert!(store.get(&key).is_none());
        assert_eq!(store.evict_expired(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_no_ttl_never_evicts() {
        let store = PlaceholderStore::new();
        store.insert("payload".to_string());
        assert_eq!(store.evict_expired(), 0);
        assert_eq!(store.len(), 1);
    }
}
