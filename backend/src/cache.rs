use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Memoized public responses, owned by [`crate::AppState`].
///
/// Entries expire after `ttl` and the map never holds more than `capacity`
/// entries; the oldest goes first. Every successful mutation calls
/// [`ResponseCache::invalidate`], which also bumps the generation so reads
/// computed before the mutation are not stored afterwards.
pub struct ResponseCache {
    ttl: Duration,
    capacity: usize,
    inner: RwLock<Entries>,
}

#[derive(Default)]
struct Entries {
    generation: u64,
    map: HashMap<String, (Instant, Value)>,
}

impl ResponseCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            inner: RwLock::new(Entries::default()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let inner = self.inner.read().ok()?;
        let (stored, value) = inner.map.get(key)?;
        (stored.elapsed() < self.ttl).then(|| value.clone())
    }

    /// Token to pass to [`ResponseCache::insert`]; take it before computing the value.
    pub fn generation(&self) -> u64 {
        self.inner.read().map(|inner| inner.generation).unwrap_or(0)
    }

    /// Stores `value` unless the cache was invalidated since `generation` was taken.
    pub fn insert(&self, key: impl Into<String>, value: Value, generation: u64) {
        if self.ttl.is_zero() || self.capacity == 0 {
            return;
        }
        let Ok(mut inner) = self.inner.write() else {
            return;
        };
        if inner.generation != generation {
            return;
        }
        inner.map.retain(|_, (stored, _)| stored.elapsed() < self.ttl);
        let key = key.into();
        while inner.map.len() >= self.capacity && !inner.map.contains_key(&key) {
            let oldest = inner
                .map
                .iter()
                .min_by_key(|(_, (stored, _))| *stored)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(oldest) => inner.map.remove(&oldest),
                None => break,
            };
        }
        inner.map.insert(key, (Instant::now(), value));
    }

    pub fn invalidate(&self) {
        if let Ok(mut inner) = self.inner.write() {
            inner.generation = inner.generation.wrapping_add(1);
            inner.map.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
