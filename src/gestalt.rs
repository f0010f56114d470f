//! The user-facing facade: a core wrapped in the read cache.

use std::sync::Arc;

use uuid::Uuid;

use crate::cache::CacheState;
use crate::core::GestaltCore;
use crate::error::GestaltError;
use crate::reflect::ConfigType;
use crate::reload::CoreReloadListener;
use crate::tag::Tags;

/// A built configuration instance.
///
/// Created by [`GestaltBuilder`](crate::builder::GestaltBuilder); holds
/// the merged tree, answers typed reads, and memoizes results until the
/// next reload. Instances are self-contained: two `Gestalt`s share
/// nothing.
///
/// # Examples
///
/// ```
/// use gestalt::builder::GestaltBuilder;
/// use gestalt::source::MapSource;
///
/// # fn main() -> Result<(), gestalt::GestaltError> {
/// let gestalt = GestaltBuilder::new()
///     .add_source(MapSource::new("defaults", [("db.port", "5432")]))
///     .build()?;
/// gestalt.load_configs()?;
///
/// let port: u16 = gestalt.get_config("db.port")?;
/// assert_eq!(port, 5432);
/// # Ok(())
/// # }
/// ```
pub struct Gestalt {
    core: GestaltCore,
    cache: Option<Arc<CacheState>>,
}

impl Gestalt {
    pub(crate) fn new(core: GestaltCore, use_cache: bool) -> Self {
        let cache = use_cache.then(|| {
            let cache = Arc::new(CacheState::new());
            core.add_core_reload_listener(Arc::clone(&cache) as Arc<dyn CoreReloadListener>);
            cache
        });
        Self { core, cache }
    }

    /// Load every source and publish a new generation.
    ///
    /// # Errors
    ///
    /// See [`GestaltCore::load_configs`].
    pub fn load_configs(&self) -> Result<(), GestaltError> {
        self.core.load_configs()
    }

    /// Re-load a single source by id and publish a new generation.
    ///
    /// # Errors
    ///
    /// See [`GestaltCore::reload_source`].
    pub fn reload_source(&self, source_id: Uuid) -> Result<(), GestaltError> {
        self.core.reload_source(source_id)
    }

    /// Register a listener told about every future generation build.
    pub fn add_core_reload_listener(&self, listener: Arc<dyn CoreReloadListener>) {
        self.core.add_core_reload_listener(listener);
    }

    /// Generation id of the published tree; zero before the first load.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.core.generation()
    }

    /// The underlying core, for reads that must bypass the cache.
    #[must_use]
    pub fn core(&self) -> &GestaltCore {
        &self.core
    }

    /// Read a required value at `path`.
    ///
    /// # Errors
    ///
    /// See [`GestaltCore::get_config`].
    pub fn get_config<T>(&self, path: &str) -> Result<T, GestaltError>
    where
        T: ConfigType + Clone + Send + Sync,
    {
        self.get_config_with_tags(path, &Tags::new())
    }

    /// Read a required value, namespacing the cache entry by `tags`.
    ///
    /// # Errors
    ///
    /// See [`GestaltCore::get_config`].
    pub fn get_config_with_tags<T>(&self, path: &str, tags: &Tags) -> Result<T, GestaltError>
    where
        T: ConfigType + Clone + Send + Sync,
    {
        let Some(cache) = &self.cache else {
            return self.core.get_config(path);
        };
        if let Some(hit) = cache.get::<T>(path, tags) {
            return Ok(hit);
        }
        let value = self.core.get_config::<T>(path)?;
        if self.core.cacheable(path) {
            cache.insert(path, tags, value.clone());
        }
        Ok(value)
    }

    /// Read an optional value: absence is `None`, corrupt data fails.
    ///
    /// # Errors
    ///
    /// See [`GestaltCore::get_config_optional`].
    pub fn get_config_optional<T>(&self, path: &str) -> Result<Option<T>, GestaltError>
    where
        T: ConfigType + Clone + Send + Sync,
    {
        self.get_config_optional_with_tags(path, &Tags::new())
    }

    /// Tag-namespaced variant of
    /// [`get_config_optional`](Self::get_config_optional).
    ///
    /// # Errors
    ///
    /// See [`GestaltCore::get_config_optional`].
    pub fn get_config_optional_with_tags<T>(
        &self,
        path: &str,
        tags: &Tags,
    ) -> Result<Option<T>, GestaltError>
    where
        T: ConfigType + Clone + Send + Sync,
    {
        let Some(cache) = &self.cache else {
            return self.core.get_config_optional(path);
        };
        if let Some(hit) = cache.get::<Option<T>>(path, tags) {
            return Ok(hit);
        }
        let value = self.core.get_config_optional::<T>(path)?;
        if self.core.cacheable(path) {
            cache.insert(path, tags, value.clone());
        }
        Ok(value)
    }

    /// Read with a fallback: absence yields `default`, corrupt data
    /// fails.
    ///
    /// # Errors
    ///
    /// See [`GestaltCore::get_config_or`].
    pub fn get_config_or<T>(&self, path: &str, default: T) -> Result<T, GestaltError>
    where
        T: ConfigType + Clone + Send + Sync,
    {
        Ok(self
            .get_config_optional_with_tags(path, &Tags::new())?
            .unwrap_or(default))
    }
}
