//! Extraction result caching.
//!
//! Claim extraction costs a reasoning-service round trip, so results are
//! memoized by a content hash of the input text. The cache is an explicit,
//! injectable component rather than a module-level singleton; tests
//! substitute short TTLs to exercise expiry.

use crate::types::Claim;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Derive the cache key for an input text: SHA-256, hex-encoded.
pub fn cache_key(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Key-value store for extraction results with duration-based staleness.
pub trait VerificationCache: Send + Sync {
    /// Return the live entry for `key`, if any.
    fn get(&self, key: &str) -> Option<Vec<Claim>>;

    /// Store `claims` under `key`, replacing any previous entry.
    fn set(&self, key: &str, claims: Vec<Claim>);

    /// Drop all entries.
    fn clear(&self);
}

struct CacheEntry {
    claims: Vec<Claim>,
    expires_at: Instant,
}

/// In-memory TTL cache, the default implementation.
pub struct InMemoryCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of entries currently stored, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VerificationCache for InMemoryCache {
    fn get(&self, key: &str) -> Option<Vec<Claim>> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.claims.clone()),
            Some(_) => {
                // Stale entry; drop it so the next set starts fresh.
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, claims: Vec<Claim>) {
        let entry = CacheEntry {
            claims,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().unwrap().insert(key.to_string(), entry);
    }

    fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}
