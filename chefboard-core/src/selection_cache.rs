//! Memoization of grocery list results keyed by the selected recipe set.
//!
//! The key is the sorted, comma-joined list of recipe IDs, so selection order
//! does not matter but adding or removing a recipe does. Each entry also
//! records a fingerprint of the selected recipes' ingredient data; a key match
//! with a different fingerprint is treated as a miss, so editing a recipe's
//! ingredients never serves a stale list.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::types::{AggregatedIngredient, Recipe};

/// Identity of a recipe selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionKey {
    /// Sorted, comma-joined recipe IDs.
    pub key: String,
    /// SHA-256 over every selected recipe's ingredient data, in key order.
    pub fingerprint: String,
}

impl SelectionKey {
    pub fn from_recipes(recipes: &[Recipe]) -> Self {
        let mut sorted: Vec<&Recipe> = recipes.iter().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));

        let key = sorted
            .iter()
            .map(|r| r.id.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let mut hasher = Sha256::new();
        for recipe in &sorted {
            // serde_json output is stable for a given value.
            let ingredients = serde_json::to_string(&(
                &recipe.ingredients,
                &recipe.structured_ingredients,
            ))
            .unwrap_or_default();
            hasher.update(recipe.id.as_bytes());
            hasher.update([0]);
            hasher.update(ingredients.as_bytes());
            hasher.update([0]);
        }

        Self {
            key,
            fingerprint: hex::encode(hasher.finalize()),
        }
    }
}

/// Sorted, comma-joined recipe IDs.
pub fn selection_key(recipes: &[Recipe]) -> String {
    SelectionKey::from_recipes(recipes).key
}

/// A cached result for one selection. Replaced wholesale, never patched.
#[derive(Debug, Clone)]
pub struct SelectionCacheEntry<T = Vec<AggregatedIngredient>> {
    pub selection_key: String,
    pub fingerprint: String,
    pub items: T,
    pub generated_at: DateTime<Utc>,
}

/// Storage for selection results.
///
/// Implementations decide how many selections they remember; callers only rely
/// on `get` returning an entry previously passed to `set` for the same key, or
/// nothing.
pub trait SelectionCache<T = Vec<AggregatedIngredient>>: Send + Sync {
    fn get(&self, selection_key: &str) -> Option<SelectionCacheEntry<T>>;

    fn set(&self, entry: SelectionCacheEntry<T>);

    fn clear(&self);
}

/// Remembers only the most recent selection.
#[derive(Debug)]
pub struct SingleSlotCache<T = Vec<AggregatedIngredient>> {
    slot: RwLock<Option<SelectionCacheEntry<T>>>,
}

impl<T> Default for SingleSlotCache<T> {
    fn default() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }
}

impl<T: Clone + Send + Sync> SelectionCache<T> for SingleSlotCache<T> {
    fn get(&self, selection_key: &str) -> Option<SelectionCacheEntry<T>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|entry| entry.selection_key == selection_key)
            .cloned()
    }

    fn set(&self, entry: SelectionCacheEntry<T>) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(entry);
    }

    fn clear(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Result of a memoized lookup.
#[derive(Debug, Clone)]
pub struct Memoized<T> {
    pub items: T,
    pub cache_hit: bool,
}

/// Runs a computation at most once per selection.
///
/// Concurrent calls for the same selection share one computation. A
/// computation that finishes after a different selection was requested does
/// not write to the cache.
pub struct SelectionMemo<T = Vec<AggregatedIngredient>> {
    cache: Arc<dyn SelectionCache<T>>,
    latest_key: Mutex<Option<String>>,
    in_flight: tokio::sync::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<T: Clone + Send + Sync + 'static> SelectionMemo<T> {
    pub fn new(cache: Arc<dyn SelectionCache<T>>) -> Self {
        Self {
            cache,
            latest_key: Mutex::new(None),
            in_flight: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn single_slot() -> Self {
        Self::new(Arc::new(SingleSlotCache::default()))
    }

    /// Return the cached result for this selection, or run `compute` and cache
    /// its output.
    ///
    /// If `compute` fails the cache is left untouched and the error is
    /// returned.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        recipes: &[Recipe],
        compute: F,
    ) -> Result<Memoized<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = SelectionKey::from_recipes(recipes);
        self.set_latest(&key.key);

        if let Some(items) = self.lookup(&key) {
            tracing::debug!(selection = %key.key, "Selection cache hit");
            return Ok(Memoized {
                items,
                cache_hit: true,
            });
        }

        let gate = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.entry(key.key.clone()).or_default().clone()
        };
        let _guard = gate.lock().await;

        // Another caller may have finished this selection while we waited.
        if let Some(items) = self.lookup(&key) {
            tracing::debug!(selection = %key.key, "Selection computed by concurrent caller");
            return Ok(Memoized {
                items,
                cache_hit: true,
            });
        }

        tracing::debug!(selection = %key.key, "Selection cache miss, computing");
        let result = compute().await;

        // The entry is in place before the gate is released.
        if let Ok(items) = &result {
            if self.is_latest(&key.key) {
                self.cache.set(SelectionCacheEntry {
                    selection_key: key.key.clone(),
                    fingerprint: key.fingerprint.clone(),
                    items: items.clone(),
                    generated_at: Utc::now(),
                });
            } else {
                tracing::debug!(selection = %key.key, "Discarding result for superseded selection");
            }
        }

        {
            let mut in_flight = self.in_flight.lock().await;
            if in_flight
                .get(&key.key)
                .is_some_and(|current| Arc::ptr_eq(current, &gate))
            {
                in_flight.remove(&key.key);
            }
        }

        Ok(Memoized {
            items: result?,
            cache_hit: false,
        })
    }

    /// Drop whatever is cached.
    pub fn clear(&self) {
        self.cache.clear();
    }

    fn lookup(&self, key: &SelectionKey) -> Option<T> {
        let entry = self.cache.get(&key.key)?;
        if entry.fingerprint != key.fingerprint {
            tracing::debug!(selection = %key.key, "Recipe contents changed, ignoring cached entry");
            return None;
        }
        Some(entry.items)
    }

    fn set_latest(&self, key: &str) {
        *self.latest_key.lock().unwrap_or_else(PoisonError::into_inner) = Some(key.to_string());
    }

    fn is_latest(&self, key: &str) -> bool {
        self.latest_key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            == Some(key)
    }
}
