//! Process-lifetime response cache.
//!
//! Values are type-erased so one cache serves every cacheable request type;
//! readers name the type they expect and get `Internal` on a mismatch.
//! Entries never expire. Commands remove stale keys explicitly.
//!
//! Every key carries a generation that `remove` bumps. A reader that missed
//! takes the generation before running the query and stores its result with
//! [`ResponseCache::insert_if_current`], which drops the value when the key
//! was invalidated in between. A read that raced a write therefore never
//! outlives the write's invalidation.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Result, ToDoError};

type Entry = Arc<dyn Any + Send + Sync>;

/// Invalidation count for one key, taken before a cache miss is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

#[derive(Default)]
struct Slots {
    entries: HashMap<String, Entry>,
    generations: HashMap<String, u64>,
}

impl Slots {
    fn generation(&self, key: &str) -> u64 {
        self.generations.get(key).copied().unwrap_or(0)
    }
}

#[derive(Default)]
pub struct ResponseCache {
    slots: RwLock<Slots>,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("len", &self.len())
            .finish()
    }
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key`, returning a clone of the cached value.
    pub fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let slots = self.slots.read();
        let Some(entry) = slots.entries.get(key) else {
            return Ok(None);
        };
        entry
            .downcast_ref::<T>()
            .cloned()
            .map(Some)
            .ok_or_else(|| {
                ToDoError::Internal(format!("cached value for {key} has an unexpected type"))
            })
    }

    pub fn insert<T>(&self, key: String, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.slots.write().entries.insert(key, Arc::new(value));
    }

    pub fn generation(&self, key: &str) -> Generation {
        Generation(self.slots.read().generation(key))
    }

    /// Store `value` unless `key` was removed after `seen` was taken.
    /// Returns whether the value was stored.
    pub fn insert_if_current<T>(&self, key: String, seen: Generation, value: T) -> bool
    where
        T: Send + Sync + 'static,
    {
        let mut slots = self.slots.write();
        if slots.generation(&key) != seen.0 {
            return false;
        }
        slots.entries.insert(key, Arc::new(value));
        true
    }

    /// Drop `key` and bump its generation, whether or not it was cached.
    pub fn remove(&self, key: &str) -> bool {
        let mut slots = self.slots.write();
        *slots.generations.entry(key.to_string()).or_insert(0) += 1;
        slots.entries.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.read().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().entries.is_empty()
    }
}
