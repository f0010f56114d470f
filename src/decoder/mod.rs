//! Decoder dispatch: the registry picks a decoder by type and priority;
//! decoders turn node fragments into typed values.
//!
//! Composite decoders never call each other directly. Everything routes
//! back through [`DecoderRegistry::decode_node`], so a user-registered
//! override at a higher priority wins at any depth of a decode.

mod array;
mod enums;
mod leaf;
mod map;
mod number;
mod object;
mod optional;
mod registry;
mod time;

pub use array::ArrayDecoder;
pub use enums::EnumDecoder;
pub use leaf::{BoolDecoder, CharDecoder, PathDecoder, StringDecoder, Utf8PathDecoder, UuidDecoder};
pub use map::MapDecoder;
pub use number::NumberDecoder;
pub use object::ObjectDecoder;
pub use optional::OptionalDecoder;
pub use registry::DecoderRegistry;
pub use time::{DateDecoder, DateTimeDecoder, DurationDecoder, LocalDateTimeDecoder};

use std::any::Any;
use std::sync::Arc;

use crate::config::GestaltConfig;
use crate::node::ConfigNode;
use crate::reflect::TypeInfo;
use crate::validated::Validated;

/// Selection order when several decoders match a type. Higher wins;
/// first-added wins ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Last resort.
    Lowest,
    /// Below the bundled decoders.
    Low,
    /// Every bundled decoder.
    Medium,
    /// Overrides the bundled decoders.
    High,
    /// Overrides everything.
    VeryHigh,
}

/// Everything a decoder may consult besides its arguments.
///
/// Decoders are pure functions of `(path, node, type, context)`; the
/// context carries no mutable state.
pub struct DecoderContext<'a> {
    /// Registry for recursive dispatch.
    pub registry: &'a DecoderRegistry,
    /// Policy flags and formats.
    pub config: &'a GestaltConfig,
}

/// Turns a node fragment into a typed (erased) value.
pub trait Decoder: Send + Sync {
    /// Decoder name, used for dedupe and diagnostics.
    fn name(&self) -> &'static str;

    /// Where this decoder sorts when several match.
    fn priority(&self) -> Priority {
        Priority::Medium
    }

    /// Whether this decoder can produce the captured type.
    fn matches(&self, ty: &TypeInfo) -> bool;

    /// Decode `node` at `path` into the captured type.
    fn decode(
        &self,
        path: &str,
        node: &ConfigNode,
        ty: &TypeInfo,
        ctx: &DecoderContext<'_>,
    ) -> Validated<Box<dyn Any>>;
}

/// Extend `path` with an object key.
pub(crate) fn key_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Extend `path` with an array index.
pub(crate) fn index_path(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

/// The full bundled decoder set, all at Medium priority.
#[must_use]
pub fn default_decoders() -> Vec<Arc<dyn Decoder>> {
    vec![
        Arc::new(NumberDecoder::<i8>::new()),
        Arc::new(NumberDecoder::<i16>::new()),
        Arc::new(NumberDecoder::<i32>::new()),
        Arc::new(NumberDecoder::<i64>::new()),
        Arc::new(NumberDecoder::<u8>::new()),
        Arc::new(NumberDecoder::<u16>::new()),
        Arc::new(NumberDecoder::<u32>::new()),
        Arc::new(NumberDecoder::<u64>::new()),
        Arc::new(NumberDecoder::<f32>::new()),
        Arc::new(NumberDecoder::<f64>::new()),
        Arc::new(BoolDecoder),
        Arc::new(StringDecoder),
        Arc::new(CharDecoder),
        Arc::new(UuidDecoder),
        Arc::new(PathDecoder),
        Arc::new(Utf8PathDecoder),
        Arc::new(DurationDecoder),
        Arc::new(DateDecoder),
        Arc::new(LocalDateTimeDecoder),
        Arc::new(DateTimeDecoder),
        Arc::new(EnumDecoder),
        Arc::new(ArrayDecoder),
        Arc::new(MapDecoder),
        Arc::new(OptionalDecoder),
        Arc::new(ObjectDecoder),
    ]
}

#[cfg(test)]
mod tests;
