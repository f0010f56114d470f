//! Memoization of decoded values, keyed by `(path, type, tags)`.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::reload::CoreReloadListener;
use crate::tag::Tags;

#[derive(PartialEq, Eq, Hash)]
struct CacheKey {
    path: String,
    type_id: TypeId,
    tags: Tags,
}

/// The cache map behind the `Gestalt` facade.
///
/// Reads share the lock; inserts take it exclusively. Registered as a
/// core-reload listener, so the map clears before a new generation is
/// published — a reader that beats the swap may still hit a value from
/// the old generation, which is consistent with the tree it read.
#[derive(Default)]
pub(crate) struct CacheState {
    map: RwLock<HashMap<CacheKey, Arc<dyn Any + Send + Sync>>>,
}

impl CacheState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get<T: Clone + Send + Sync + 'static>(
        &self,
        path: &str,
        tags: &Tags,
    ) -> Option<T> {
        let key = CacheKey {
            path: path.to_string(),
            type_id: TypeId::of::<T>(),
            tags: tags.clone(),
        };
        let map = self.map.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&key)
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    pub(crate) fn insert<T: Clone + Send + Sync + 'static>(
        &self,
        path: &str,
        tags: &Tags,
        value: T,
    ) {
        let key = CacheKey {
            path: path.to_string(),
            type_id: TypeId::of::<T>(),
            tags: tags.clone(),
        };
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(key, Arc::new(value));
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl CoreReloadListener for CacheState {
    fn on_core_reload(&self) {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
