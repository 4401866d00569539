use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use crate::consistency::NliPrediction;

/// Thread-safe LRU cache of classifier predictions.
///
/// Keys are SHA-256 digests of the ordered pair, so the order of the two
/// sentences matters.
#[derive(Clone)]
pub struct PredictionCache {
    cache: Arc<Mutex<LruCache<String, NliPrediction>>>,
}

impl PredictionCache {
    /// Returns `None` for a zero capacity, which disables caching.
    pub fn new(capacity: usize) -> Option<Self> {
        let capacity = NonZeroUsize::new(capacity)?;
        Some(Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        })
    }

    pub fn get(&self, key: &str) -> Option<NliPrediction> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(key).copied()
    }

    pub fn put(&self, key: String, prediction: NliPrediction) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.put(key, prediction);
    }

    pub fn len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stable hex key for an ordered sentence pair.
    pub fn generate_key(premise: &str, hypothesis: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(premise.as_bytes());
        hasher.update([0x1f]);
        hasher.update(hypothesis.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}
