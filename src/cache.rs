//! Memoized request results keyed by normalized request parameters

use dashmap::DashMap;
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::summary::AggregateFn;

/// Normalized request key.
///
/// Sample ids are sorted on construction, so the same sample set in any
/// request order maps to the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    accession: String,
    padding: u32,
    samples: Vec<String>,
    agg: Option<AggregateFn>,
}

impl CacheKey {
    pub fn new(
        accession: &str,
        padding: u32,
        samples: &[String],
        agg: Option<AggregateFn>,
    ) -> Self {
        let mut samples = samples.to_vec();
        samples.sort();
        Self {
            accession: accession.to_string(),
            padding,
            samples,
            agg,
        }
    }

    /// Sample ids in canonical (sorted) order.
    pub fn samples(&self) -> &[String] {
        &self.samples
    }
}

/// Concurrent result cache with at most one computation in flight per key.
///
/// The first caller for a key runs `compute` while holding the entry's slot
/// lock; callers arriving meanwhile block on that lock and then share the
/// stored value. A failed computation leaves the slot empty, so errors are
/// never cached and the next caller retries.
pub struct ResultCache<V> {
    slots: DashMap<CacheKey, Arc<Mutex<Option<Arc<V>>>>>,
}

impl<V> ResultCache<V> {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Return the cached value for `key`, computing it if absent.
    pub fn memoize<F>(&self, key: CacheKey, compute: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Result<V>,
    {
        let slot = self
            .slots
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();
        // the shard guard is released here; only the slot lock is held
        // while computing
        let mut guard = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(value) = guard.as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(compute()?);
        *guard = Some(Arc::clone(&value));
        Ok(value)
    }

    /// Number of keys ever inserted, cached or in flight.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every entry, e.g. after the sample registry changes.
    pub fn clear(&self) {
        self.slots.clear();
    }
}

impl<V> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
