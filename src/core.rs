//! The orchestrator: load, merge, post-process, publish, decode.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::GestaltConfig;
use crate::decoder::DecoderRegistry;
use crate::error::{ErrorList, GestaltError, ValidationError, ValidationLevel};
use crate::loader::ConfigLoaderRegistry;
use crate::meta::{NO_CACHE, SECRET};
use crate::node::{navigate, ConfigNode, ConfigNodeManager, MapNode};
use crate::processor::{process_tree, PostProcessor};
use crate::reflect::{ConfigType, TypeInfo, TypeKind};
use crate::reload::CoreReloadListener;
use crate::source::ConfigSource;
use crate::validated::Validated;

#[derive(Clone, Copy)]
enum ReadMode {
    /// The caller needs a value; absence fails.
    Required,
    /// Absence is acceptable; only corrupt data fails.
    Tolerant,
}

/// Loads sources into generations and serves typed reads against the
/// current snapshot.
///
/// Reads are lock-free after the snapshot copy; every mutation funnels
/// through [`load_configs`](Self::load_configs) or
/// [`reload_source`](Self::reload_source), which build the next
/// generation off-line, notify reload listeners, and only then publish.
pub struct GestaltCore {
    sources: Vec<Arc<dyn ConfigSource>>,
    loaders: ConfigLoaderRegistry,
    manager: ConfigNodeManager,
    registry: DecoderRegistry,
    processors: Vec<Arc<dyn PostProcessor>>,
    listeners: Mutex<Vec<Arc<dyn CoreReloadListener>>>,
    config: GestaltConfig,
}

fn log_accepted(error: &ValidationError) {
    match error.level() {
        ValidationLevel::Warn => warn!(%error, "configuration warning"),
        _ => debug!(%error, "configuration note"),
    }
}

impl GestaltCore {
    pub(crate) fn new(
        sources: Vec<Arc<dyn ConfigSource>>,
        loaders: ConfigLoaderRegistry,
        registry: DecoderRegistry,
        processors: Vec<Arc<dyn PostProcessor>>,
        config: GestaltConfig,
    ) -> Self {
        Self {
            sources,
            loaders,
            manager: ConfigNodeManager::new(),
            registry,
            processors,
            listeners: Mutex::new(Vec::new()),
            config,
        }
    }

    /// The active policy flags and formats.
    #[must_use]
    pub fn config(&self) -> &GestaltConfig {
        &self.config
    }

    /// Generation id of the published tree; zero before the first load.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.manager.generation()
    }

    /// Register a listener for future generation builds.
    pub fn add_core_reload_listener(&self, listener: Arc<dyn CoreReloadListener>) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Load every source and publish the first (or next) generation.
    ///
    /// # Errors
    ///
    /// Returns [`GestaltError::SourceLoad`] when a source cannot produce
    /// its fragment, [`GestaltError::Build`] when no loader accepts a
    /// source's format, and [`GestaltError::PostProcessing`] when merging
    /// or post-processing records an ERROR-level failure.
    pub fn load_configs(&self) -> Result<(), GestaltError> {
        for source in &self.sources {
            self.load_fragment(source.as_ref())?;
        }
        self.rebuild()
    }

    /// Re-ask one source for its contribution and rebuild.
    ///
    /// The fragment replaces the slice this source contributed before;
    /// the re-merge keeps the original source order, so a reloaded early
    /// source cannot jump over later ones.
    ///
    /// # Errors
    ///
    /// As [`load_configs`](Self::load_configs), plus
    /// [`GestaltError::Build`] when no source has the given id.
    pub fn reload_source(&self, source_id: Uuid) -> Result<(), GestaltError> {
        let source = self
            .sources
            .iter()
            .find(|source| source.id() == source_id)
            .cloned()
            .ok_or_else(|| GestaltError::Build(format!("no source with id {source_id}")))?;
        self.load_fragment(source.as_ref())?;
        self.rebuild()
    }

    fn load_fragment(&self, source: &dyn ConfigSource) -> Result<(), GestaltError> {
        let format = source.format();
        let loader = self.loaders.loader_for(&format).ok_or_else(|| {
            GestaltError::Build(format!(
                "no config loader accepts format '{format}' from source '{}'",
                source.name()
            ))
        })?;
        debug!(source = %source.name(), loader = loader.name(), "loading configuration source");
        let (node, errors) = loader.load(source, self.registry.lexer()).into_parts();
        let failed = errors
            .iter()
            .any(|error| error.level() == ValidationLevel::Error);
        match (node, failed) {
            (Some(node), false) => {
                errors.iter().for_each(log_accepted);
                self.manager.set_fragment(source.id(), node);
                Ok(())
            }
            _ => Err(GestaltError::SourceLoad {
                source_name: source.name(),
                message: ErrorList::new(errors).to_string(),
            }),
        }
    }

    fn rebuild(&self) -> Result<(), GestaltError> {
        let (staged, mut errors) = self.manager.stage().into_parts();
        let staged = staged.unwrap_or_else(|| ConfigNode::Map(MapNode::new()));
        let (processed, processor_errors) = process_tree(
            &staged,
            &self.processors,
            self.registry.lexer(),
            &self.config,
        )
        .into_parts();
        errors.extend(processor_errors);

        if errors
            .iter()
            .any(|error| error.level() == ValidationLevel::Error)
        {
            return Err(GestaltError::PostProcessing(ErrorList::new(errors)));
        }
        errors.iter().for_each(log_accepted);

        // Listeners (the cache among them) run before the swap, so no
        // stale entry can outlive the generation it came from.
        self.notify_core_reload();
        let generation = self.manager.publish(processed.unwrap_or(staged));
        debug!(generation, "published configuration generation");
        Ok(())
    }

    fn notify_core_reload(&self) {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener.on_core_reload();
        }
    }

    /// Navigate and decode `path` as `T` against the current snapshot.
    fn decode_path<T: ConfigType>(&self, path: &str) -> Result<Validated<T>, GestaltError> {
        let Some((root, _generation)) = self.manager.snapshot() else {
            return Err(GestaltError::NotLoaded);
        };
        let (tokens, token_errors) = self.registry.lexer().scan(path).into_parts();
        let Some(tokens) = tokens else {
            return Ok(Validated::from_errors(token_errors));
        };
        let (found, nav_errors) = navigate(&root, &tokens, path).into_parts();
        match found {
            Some(node) => Ok(self.registry.decode::<T>(path, node, &self.config)),
            None => {
                // An optional target absorbs the miss as `None`.
                if let TypeKind::Optional(shape) = TypeInfo::of::<T>().kind() {
                    if let Ok(none) = (shape.none)().downcast::<T>() {
                        let level = self
                            .config
                            .log_level_for_missing_values_when_default_or_optional;
                        let downgraded = nav_errors
                            .into_iter()
                            .map(|error| match error {
                                ValidationError::NoResultsFoundForNode { path, missing, .. } => {
                                    ValidationError::NoResultsFoundForNode {
                                        path,
                                        missing,
                                        level,
                                    }
                                }
                                other => other,
                            })
                            .collect();
                        return Ok(Validated::of(Some(*none), downgraded));
                    }
                }
                Ok(Validated::from_errors(nav_errors))
            }
        }
    }

    fn is_fatal(&self, level: ValidationLevel, mode: ReadMode) -> bool {
        if self.config.treat_warnings_as_errors {
            return level > ValidationLevel::Debug;
        }
        match level {
            ValidationLevel::Error => true,
            ValidationLevel::MissingValue => matches!(mode, ReadMode::Required),
            _ => false,
        }
    }

    fn evaluate<T>(
        &self,
        path: &str,
        validated: Validated<T>,
        mode: ReadMode,
    ) -> Result<(Option<T>, Vec<ValidationError>), GestaltError> {
        let (value, errors) = validated.into_parts();
        if errors
            .iter()
            .any(|error| self.is_fatal(error.level(), mode))
        {
            return Err(GestaltError::Decoding {
                path: path.to_string(),
                errors: ErrorList::new(errors),
            });
        }
        errors.iter().for_each(log_accepted);
        Ok((value, errors))
    }

    /// Read a required value at `path`.
    ///
    /// # Errors
    ///
    /// [`GestaltError::Decoding`] when the read fails the error policy,
    /// [`GestaltError::MissingConfig`] when nothing is found, and
    /// [`GestaltError::NotLoaded`] before the first load.
    pub fn get_config<T: ConfigType>(&self, path: &str) -> Result<T, GestaltError> {
        let validated = self.decode_path::<T>(path)?;
        let (value, errors) = self.evaluate(path, validated, ReadMode::Required)?;
        value.ok_or_else(|| GestaltError::MissingConfig {
            path: path.to_string(),
            errors: ErrorList::new(errors),
        })
    }

    /// Read an optional value: absence is `None`, corrupt data still
    /// fails.
    ///
    /// # Errors
    ///
    /// [`GestaltError::Decoding`] on ERROR-level results and
    /// [`GestaltError::NotLoaded`] before the first load.
    pub fn get_config_optional<T: ConfigType>(
        &self,
        path: &str,
    ) -> Result<Option<T>, GestaltError> {
        let validated = self.decode_path::<T>(path)?;
        let (value, _) = self.evaluate(path, validated, ReadMode::Tolerant)?;
        Ok(value)
    }

    /// Read with a fallback: absence yields `default`, corrupt data
    /// still fails.
    ///
    /// # Errors
    ///
    /// As [`get_config_optional`](Self::get_config_optional).
    pub fn get_config_or<T: ConfigType>(
        &self,
        path: &str,
        default: T,
    ) -> Result<T, GestaltError> {
        Ok(self.get_config_optional(path)?.unwrap_or(default))
    }

    /// Whether values under `path` may be memoized: nodes whose rolled-up
    /// metadata marks them secret or no-cache must be re-read every time.
    pub(crate) fn cacheable(&self, path: &str) -> bool {
        let Some((root, _)) = self.manager.snapshot() else {
            return false;
        };
        let Some(tokens) = self.registry.lexer().scan(path).into_value() else {
            return false;
        };
        let Some(node) = navigate(&root, &tokens, path).into_value() else {
            return true;
        };
        let metadata = node.metadata();
        !metadata.has_flag(NO_CACHE) && !metadata.has_flag(SECRET)
    }
}
