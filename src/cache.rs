//! Memoization for expensive collaborators
//!
//! Provides LRU caching for:
//! - Loaded datasets, keyed by source (file path or URL) and column renames
//! - Trained models, keyed by dataset fingerprint, label column and training params
//!
//! Caches are plain values handed to whoever needs them; there is no
//! process-global state.
use crate::classifier::{LogisticModel, TrainParams};
use crate::dataset::{is_remote, ColumnRenames, Dataset};
use crate::error::Result;
use lru::LruCache;
use parking_lot::RwLock;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Generic, thread-safe LRU cache wrapper. Clones share storage.
pub struct ThreadSafeCache<K, V> {
    cache: Arc<RwLock<LruCache<K, V>>>,
}

impl<K, V> ThreadSafeCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a new LRU cache with specified capacity (0 is treated as 1).
    pub fn new_lru(capacity: usize) -> Self {
        let capacity_nz = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(RwLock::new(LruCache::new(capacity_nz))),
        }
    }

    /// Get a value without promoting it. Uses read lock.
    pub fn get(&self, key: &K) -> Option<V> {
        self.cache.read().peek(key).cloned()
    }

    pub fn put(&self, key: K, value: V) {
        self.cache.write().put(key, value);
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.cache.write().pop(key)
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cache.read().cap().get()
    }

    /// Returns the cached value, or runs `loader` and caches its result.
    ///
    /// The loader runs outside the lock; a failing loader caches nothing.
    pub fn get_or_try_insert_with<F>(&self, key: K, loader: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(hit) = self.cache.write().get(&key) {
            return Ok(hit.clone());
        }
        let value = loader()?;
        self.put(key, value.clone());
        Ok(value)
    }
}

impl<K, V> Clone for ThreadSafeCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

/// Identity of a dataset load.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetKey {
    /// URLs verbatim; files by canonical path when they resolve.
    pub source: String,
    pub renames: Vec<(String, String)>,
}

impl DatasetKey {
    pub fn new(location: &str, renames: &ColumnRenames) -> Self {
        let source = if is_remote(location) {
            location.trim().to_string()
        } else {
            std::fs::canonicalize(location)
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|_| location.to_string())
        };
        let mut renames: Vec<(String, String)> = renames.iter().map(|(a, b)| (a.clone(), b.clone())).collect();
        renames.sort();
        Self { source, renames }
    }
}

/// Cache for loaded datasets
pub type DatasetCache = ThreadSafeCache<DatasetKey, Arc<Dataset>>;

impl DatasetCache {
    pub const DEFAULT_CAPACITY: usize = 4;

    pub fn new(capacity: usize) -> Self {
        Self::new_lru(capacity)
    }

    pub fn load(&self, location: &str, renames: &ColumnRenames) -> Result<Arc<Dataset>> {
        let key = DatasetKey::new(location, renames);
        self.get_or_try_insert_with(key, || {
            debug!(location, "dataset cache miss");
            Dataset::load(location, renames).map(Arc::new)
        })
    }
}

/// Identity of a training run. Floats are keyed by their bit patterns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelKey {
    pub fingerprint: String,
    pub label_column: String,
    pub epochs: usize,
    pub learning_rate_bits: u64,
    pub c_bits: u64,
}

impl ModelKey {
    pub fn new(dataset: &Dataset, label_column: &str, params: &TrainParams) -> Self {
        Self {
            fingerprint: dataset.fingerprint(),
            label_column: label_column.to_string(),
            epochs: params.epochs,
            learning_rate_bits: params.learning_rate.to_bits(),
            c_bits: params.c.to_bits(),
        }
    }
}

/// Cache for trained models
pub type ModelCache = ThreadSafeCache<ModelKey, Arc<LogisticModel>>;

impl ModelCache {
    pub const DEFAULT_CAPACITY: usize = 2;

    pub fn new(capacity: usize) -> Self {
        Self::new_lru(capacity)
    }

    pub fn train(&self, dataset: &Dataset, label_column: &str, params: &TrainParams) -> Result<Arc<LogisticModel>> {
        let key = ModelKey::new(dataset, label_column, params);
        self.get_or_try_insert_with(key, || {
            debug!(label = label_column, "model cache miss");
            LogisticModel::train(dataset, label_column, params).map(Arc::new)
        })
    }
}
