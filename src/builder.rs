//! Explicit-registration builder for [`Gestalt`] instances.
//!
//! There is no runtime discovery: everything a `Gestalt` uses — sources,
//! decoders, loaders, processors, mappers, transforms — is registered
//! here. Empty decoder, loader, and mapper sets fall back to the bundled
//! defaults; an empty source set fails the build.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::config::GestaltConfig;
use crate::decoder::{default_decoders, Decoder, DecoderRegistry};
use crate::error::{GestaltError, ValidationLevel};
use crate::gestalt::Gestalt;
use crate::lexer::PathLexer;
use crate::loader::{default_loaders, ConfigLoader, ConfigLoaderRegistry};
use crate::path::{PathMapper, SnakeCasePathMapper, StandardPathMapper};
use crate::processor::{PostProcessor, SubstitutionProcessor, TemporarySecretProcessor, Transform};
use crate::reload::CoreReloadListener;
use crate::secret::SecretChecker;
use crate::source::ConfigSource;

/// Assembles a [`Gestalt`].
///
/// # Examples
///
/// ```
/// use gestalt::builder::GestaltBuilder;
/// use gestalt::source::MapSource;
///
/// # fn main() -> Result<(), gestalt::GestaltError> {
/// let gestalt = GestaltBuilder::new()
///     .add_source(MapSource::new("defaults", [("app.name", "demo")]))
///     .treat_warnings_as_errors(true)
///     .build()?;
/// gestalt.load_configs()?;
/// # Ok(())
/// # }
/// ```
pub struct GestaltBuilder {
    sources: Vec<Arc<dyn ConfigSource>>,
    decoders: Vec<Arc<dyn Decoder>>,
    loaders: Vec<Arc<dyn ConfigLoader>>,
    processors: Vec<Arc<dyn PostProcessor>>,
    path_mappers: Vec<Arc<dyn PathMapper>>,
    transforms: Vec<Arc<dyn Transform>>,
    listeners: Vec<Arc<dyn CoreReloadListener>>,
    secret_rules: Vec<(SecretChecker, usize)>,
    config: GestaltConfig,
    lexer: PathLexer,
    use_cache_decorator: bool,
}

impl GestaltBuilder {
    /// A builder with no registrations and default policies.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            decoders: Vec::new(),
            loaders: Vec::new(),
            processors: Vec::new(),
            path_mappers: Vec::new(),
            transforms: Vec::new(),
            listeners: Vec::new(),
            secret_rules: Vec::new(),
            config: GestaltConfig::default(),
            lexer: PathLexer::new(),
            use_cache_decorator: true,
        }
    }

    /// Add a configuration source. Merge order follows registration
    /// order, later sources winning conflicts.
    #[must_use]
    pub fn add_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Add already-shared sources, preserving order.
    #[must_use]
    pub fn add_sources(mut self, sources: Vec<Arc<dyn ConfigSource>>) -> Self {
        self.sources.extend(sources);
        self
    }

    /// Add a decoder. Registering any decoder suppresses the automatic
    /// defaults; combine with [`add_default_decoders`](Self::add_default_decoders).
    #[must_use]
    pub fn add_decoder(mut self, decoder: impl Decoder + 'static) -> Self {
        self.decoders.push(Arc::new(decoder));
        self
    }

    /// Add the bundled decoder set.
    #[must_use]
    pub fn add_default_decoders(mut self) -> Self {
        self.decoders.extend(default_decoders());
        self
    }

    /// Add a config loader.
    #[must_use]
    pub fn add_config_loader(mut self, loader: impl ConfigLoader + 'static) -> Self {
        self.loaders.push(Arc::new(loader));
        self
    }

    /// Add the bundled loader set.
    #[must_use]
    pub fn add_default_config_loaders(mut self) -> Self {
        self.loaders.extend(default_loaders());
        self
    }

    /// Add a post-processor. When none are registered, the substitution
    /// engine is installed automatically at build time.
    #[must_use]
    pub fn add_post_processor(mut self, processor: impl PostProcessor + 'static) -> Self {
        self.processors.push(Arc::new(processor));
        self
    }

    /// Add a path mapper, tried in registration order.
    #[must_use]
    pub fn add_path_mapper(mut self, mapper: impl PathMapper + 'static) -> Self {
        self.path_mappers.push(Arc::new(mapper));
        self
    }

    /// Add the bundled mappers: standard, then snake-case.
    #[must_use]
    pub fn add_default_path_mappers(mut self) -> Self {
        self.path_mappers.push(Arc::new(StandardPathMapper));
        self.path_mappers.push(Arc::new(SnakeCasePathMapper));
        self
    }

    /// Add a substitution transform. User transforms are consulted
    /// before the bundled ones, so a name collision overrides.
    #[must_use]
    pub fn add_transform(mut self, transform: impl Transform + 'static) -> Self {
        self.transforms.push(Arc::new(transform));
        self
    }

    /// Register a listener told about every generation build.
    #[must_use]
    pub fn add_core_reload_listener(mut self, listener: Arc<dyn CoreReloadListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Wrap leaves matching `rule` in access-counted secrets readable
    /// `access_count` times.
    #[must_use]
    pub fn add_temporary_secret(mut self, rule: SecretChecker, access_count: usize) -> Self {
        self.secret_rules.push((rule, access_count));
        self
    }

    /// Replace the path lexer (and so the path delimiter).
    #[must_use]
    pub fn set_lexer(mut self, lexer: PathLexer) -> Self {
        self.lexer = lexer;
        self
    }

    /// Wrap the core in the read cache (on by default).
    #[must_use]
    pub fn use_cache_decorator(mut self, use_cache: bool) -> Self {
        self.use_cache_decorator = use_cache;
        self
    }

    /// Replace the whole policy block at once.
    #[must_use]
    pub fn set_config(mut self, config: GestaltConfig) -> Self {
        self.config = config;
        self
    }

    /// Promote WARN results on reads to failures.
    #[must_use]
    pub fn treat_warnings_as_errors(mut self, enabled: bool) -> Self {
        self.config.treat_warnings_as_errors = enabled;
        self
    }

    /// Fail reads over sparse arrays with absent slots.
    #[must_use]
    pub fn treat_missing_array_index_as_error(mut self, enabled: bool) -> Self {
        self.config.treat_missing_array_index_as_error = enabled;
        self
    }

    /// Fail object decoding on absent non-optional fields.
    #[must_use]
    pub fn treat_missing_values_as_errors(mut self, enabled: bool) -> Self {
        self.config.treat_missing_values_as_errors = enabled;
        self
    }

    /// Fail object decoding when a non-optional field decodes to nothing.
    #[must_use]
    pub fn treat_null_values_in_class_as_errors(mut self, enabled: bool) -> Self {
        self.config.treat_null_values_in_class_as_errors = enabled;
        self
    }

    /// Level recorded for misses a default or optional makes acceptable.
    #[must_use]
    pub fn log_level_for_missing_values_when_default_or_optional(
        mut self,
        level: ValidationLevel,
    ) -> Self {
        self.config.log_level_for_missing_values_when_default_or_optional = level;
        self
    }

    /// chrono format for `DateTime<Utc>` decoding.
    #[must_use]
    pub fn date_decoder_format(mut self, format: impl Into<String>) -> Self {
        self.config.date_decoder_format = Some(format.into());
        self
    }

    /// chrono format for `NaiveDateTime` decoding.
    #[must_use]
    pub fn local_date_time_format(mut self, format: impl Into<String>) -> Self {
        self.config.local_date_time_format = format.into();
        self
    }

    /// chrono format for `NaiveDate` decoding.
    #[must_use]
    pub fn local_date_format(mut self, format: impl Into<String>) -> Self {
        self.config.local_date_format = format.into();
        self
    }

    /// Token opening a substitution expression.
    #[must_use]
    pub fn substitution_opening_token(mut self, token: impl Into<String>) -> Self {
        self.config.substitution_opening_token = token.into();
        self
    }

    /// Token closing a substitution expression.
    #[must_use]
    pub fn substitution_closing_token(mut self, token: impl Into<String>) -> Self {
        self.config.substitution_closing_token = token.into();
        self
    }

    /// Grammar for the substitution expression interior.
    #[must_use]
    pub fn substitution_regex(mut self, regex: impl Into<String>) -> Self {
        self.config.substitution_regex = regex.into();
        self
    }

    /// Bound on substitution re-scan passes.
    #[must_use]
    pub fn max_substitution_nested_depth(mut self, depth: usize) -> Self {
        self.config.max_substitution_nested_depth = depth;
        self
    }

    /// Build the configured [`Gestalt`].
    ///
    /// # Errors
    ///
    /// Returns [`GestaltError::Build`] when no sources are registered,
    /// when the substitution settings are invalid, or when the decoder or
    /// mapper sets end up empty.
    pub fn build(mut self) -> Result<Gestalt, GestaltError> {
        if self.sources.is_empty() {
            return Err(GestaltError::Build(
                "at least one config source is required".into(),
            ));
        }
        let mut seen_ids = HashSet::new();
        self.sources.retain(|source| {
            let fresh = seen_ids.insert(source.id());
            if !fresh {
                warn!(source = %source.name(), "dropping config source added twice");
            }
            fresh
        });

        if self.decoders.is_empty() {
            self.decoders = default_decoders();
        }
        if self.loaders.is_empty() {
            self.loaders = default_loaders();
        }
        if self.path_mappers.is_empty() {
            self = self.add_default_path_mappers();
        }
        if self.processors.is_empty() {
            let mut transforms = self.transforms.clone();
            transforms.extend(SubstitutionProcessor::default_transforms());
            self.processors
                .push(Arc::new(SubstitutionProcessor::new(&self.config, transforms)?));
        }
        if !self.secret_rules.is_empty() {
            self.processors
                .push(Arc::new(TemporarySecretProcessor::new(self.secret_rules)));
        }

        let registry = DecoderRegistry::new(self.decoders, self.lexer, self.path_mappers)?;
        let core = crate::core::GestaltCore::new(
            self.sources,
            ConfigLoaderRegistry::new(self.loaders),
            registry,
            self.processors,
            self.config,
        );
        for listener in self.listeners {
            core.add_core_reload_listener(listener);
        }
        Ok(Gestalt::new(core, self.use_cache_decorator))
    }
}

impl Default for GestaltBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::GestaltBuilder;
    use crate::error::GestaltError;
    use crate::source::MapSource;

    #[test]
    fn build_requires_a_source() {
        let result = GestaltBuilder::new().build();
        assert!(matches!(result, Err(GestaltError::Build(_))));
    }

    #[test]
    fn build_installs_defaults() {
        let gestalt = GestaltBuilder::new()
            .add_source(MapSource::new("m", [("a", "1")]))
            .build()
            .unwrap();
        gestalt.load_configs().unwrap();
        assert_eq!(gestalt.get_config::<i64>("a").unwrap(), 1);
    }

    #[test]
    fn bad_substitution_settings_fail_the_build() {
        let result = GestaltBuilder::new()
            .add_source(MapSource::new("m", [("a", "1")]))
            .substitution_regex("(")
            .build();
        assert!(matches!(result, Err(GestaltError::Build(_))));
    }
}
