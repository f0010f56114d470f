//! The decoder registry: type-and-priority dispatch plus mapper-driven
//! navigation.

use std::any::Any;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::GestaltConfig;
use crate::error::{GestaltError, ValidationError};
use crate::lexer::PathLexer;
use crate::node::{navigate, ConfigNode};
use crate::path::PathMapper;
use crate::reflect::{ConfigType, TypeInfo};
use crate::validated::Validated;

use super::{key_path, Decoder, DecoderContext, Priority};

/// Selects decoders by type and priority and navigates between nodes.
pub struct DecoderRegistry {
    decoders: Vec<Arc<dyn Decoder>>,
    lexer: PathLexer,
    path_mappers: Vec<Arc<dyn PathMapper>>,
}

fn dedupe(decoders: Vec<Arc<dyn Decoder>>) -> Vec<Arc<dyn Decoder>> {
    let mut seen: HashSet<(&'static str, Priority)> = HashSet::new();
    let mut kept = Vec::with_capacity(decoders.len());
    for decoder in decoders {
        if seen.insert((decoder.name(), decoder.priority())) {
            kept.push(decoder);
        } else {
            warn!(
                decoder = decoder.name(),
                priority = ?decoder.priority(),
                "dropping duplicate decoder registration"
            );
        }
    }
    kept
}

impl DecoderRegistry {
    /// Build a registry.
    ///
    /// # Errors
    ///
    /// Returns [`GestaltError::Build`] when the decoder or path-mapper
    /// list is empty.
    pub fn new(
        decoders: Vec<Arc<dyn Decoder>>,
        lexer: PathLexer,
        path_mappers: Vec<Arc<dyn PathMapper>>,
    ) -> Result<Self, GestaltError> {
        if decoders.is_empty() {
            return Err(GestaltError::Build("decoders can not be empty".into()));
        }
        if path_mappers.is_empty() {
            return Err(GestaltError::Build("path mappers can not be empty".into()));
        }
        Ok(Self {
            decoders: dedupe(decoders),
            lexer,
            path_mappers,
        })
    }

    /// The registered decoders, in registration order.
    #[must_use]
    pub fn decoders(&self) -> &[Arc<dyn Decoder>] {
        &self.decoders
    }

    /// Replace the decoder set, deduping by `(name, priority)`.
    pub fn set_decoders(&mut self, decoders: Vec<Arc<dyn Decoder>>) {
        self.decoders = dedupe(decoders);
    }

    /// Append decoders, deduping against the existing set.
    pub fn add_decoders(&mut self, decoders: Vec<Arc<dyn Decoder>>) {
        let mut combined = std::mem::take(&mut self.decoders);
        combined.extend(decoders);
        self.decoders = dedupe(combined);
    }

    /// The lexer shared with the path mappers.
    #[must_use]
    pub fn lexer(&self) -> &PathLexer {
        &self.lexer
    }

    /// Every decoder matching `ty`, best first.
    ///
    /// The sort is stable, so among equal priorities the first-registered
    /// decoder wins; that case is logged once per call.
    #[must_use]
    pub fn decoders_for(&self, ty: &TypeInfo) -> Vec<Arc<dyn Decoder>> {
        let mut matching: Vec<Arc<dyn Decoder>> = self
            .decoders
            .iter()
            .filter(|decoder| decoder.matches(ty))
            .cloned()
            .collect();
        matching.sort_by_key(|decoder| Reverse(decoder.priority()));
        if matching.len() > 1 && matching[0].priority() == matching[1].priority() {
            debug!(
                type_name = ty.name(),
                decoder = matching[0].name(),
                "multiple decoders match at the same priority, using the first registered"
            );
        }
        matching
    }

    /// Decode `node` as the captured type, dispatching to the
    /// best-matching decoder.
    #[must_use]
    pub fn decode_node(
        &self,
        path: &str,
        node: &ConfigNode,
        ty: &TypeInfo,
        config: &GestaltConfig,
    ) -> Validated<Box<dyn Any>> {
        let candidates = self.decoders_for(ty);
        let Some(decoder) = candidates.first() else {
            return Validated::invalid(ValidationError::NoDecoderFor {
                path: path.to_string(),
                type_name: ty.name(),
            });
        };
        let ctx = DecoderContext {
            registry: self,
            config,
        };
        decoder.decode(path, node, ty, &ctx)
    }

    /// Typed wrapper over [`decode_node`](Self::decode_node).
    #[must_use]
    pub fn decode<T: ConfigType>(
        &self,
        path: &str,
        node: &ConfigNode,
        config: &GestaltConfig,
    ) -> Validated<T> {
        let ty = TypeInfo::of::<T>();
        let (value, mut errors) = self.decode_node(path, node, &ty, config).into_parts();
        match value {
            Some(boxed) => match boxed.downcast::<T>() {
                Ok(typed) => Validated::of(Some(*typed), errors),
                Err(_) => {
                    errors.push(ValidationError::InternalDecoderMismatch {
                        path: path.to_string(),
                        decoder: "registry".to_string(),
                        type_name: ty.name(),
                    });
                    Validated::from_errors(errors)
                }
            },
            None => Validated::from_errors(errors),
        }
    }

    /// Resolve `segment` under `node`, trying each path mapper in order.
    ///
    /// The first mapper that both tokenizes the segment and navigates to
    /// a node wins; when every mapper fails, all of their errors are
    /// concatenated.
    #[must_use]
    pub fn next_node<'n>(
        &self,
        path: &str,
        segment: &str,
        node: &'n ConfigNode,
    ) -> Validated<&'n ConfigNode> {
        let mut all_errors = Vec::new();
        let rendered = key_path(path, segment);
        for mapper in &self.path_mappers {
            let (tokens, mapper_errors) = mapper.map(path, segment, &self.lexer).into_parts();
            all_errors.extend(mapper_errors);
            if let Some(tokens) = tokens {
                let found = navigate(node, &tokens, &rendered);
                if found.has_results() {
                    return found;
                }
                all_errors.extend(found.into_parts().1);
            }
        }
        Validated::from_errors(all_errors)
    }
}
