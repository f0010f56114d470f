//! Named lookup strategies for substitution keys.

use std::collections::HashMap;

use crate::lexer::PathLexer;
use crate::node::{navigate, ConfigNode};

/// What a transform may consult to resolve a key.
pub struct TransformContext<'a> {
    /// Root of the staged tree.
    pub root: &'a ConfigNode,
    /// Lexer for tree lookups.
    pub lexer: &'a PathLexer,
}

/// A named strategy resolving a substitution key against a backing store.
///
/// Additional transforms plug in through the builder; expressions select
/// one by prefix, as in `${env:HOME}`.
pub trait Transform: Send + Sync {
    /// Name used as the expression prefix.
    fn name(&self) -> &'static str;

    /// Resolve `key`, or `None` when the store has no entry for it.
    fn get(&self, key: &str, ctx: &TransformContext<'_>) -> Option<String>;
}

/// Resolves keys against the process environment.
pub struct EnvTransform;

impl Transform for EnvTransform {
    fn name(&self) -> &'static str {
        "env"
    }

    fn get(&self, key: &str, _ctx: &TransformContext<'_>) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Resolves keys as paths into the configuration tree itself. This is
/// the default transform when an expression names none.
pub struct NodeTransform;

impl Transform for NodeTransform {
    fn name(&self) -> &'static str {
        "node"
    }

    fn get(&self, key: &str, ctx: &TransformContext<'_>) -> Option<String> {
        let tokens = ctx.lexer.scan(key).into_value()?;
        navigate(ctx.root, &tokens, key)
            .into_value()
            .and_then(ConfigNode::value)
    }
}

/// Resolves keys against a user-supplied map.
pub struct MapTransform {
    name: &'static str,
    entries: HashMap<String, String>,
}

impl MapTransform {
    /// Transform named `map` over the given entries.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self::named("map", entries)
    }

    /// Transform with a custom prefix over the given entries.
    #[must_use]
    pub fn named(
        name: &'static str,
        entries: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            name,
            entries: entries.into_iter().collect(),
        }
    }
}

impl Transform for MapTransform {
    fn name(&self) -> &'static str {
        self.name
    }

    fn get(&self, key: &str, _ctx: &TransformContext<'_>) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Resolves keys as filesystem paths, substituting the file's contents
/// with trailing whitespace removed.
pub struct FileTransform;

impl Transform for FileTransform {
    fn name(&self) -> &'static str {
        "file"
    }

    fn get(&self, key: &str, _ctx: &TransformContext<'_>) -> Option<String> {
        std::fs::read_to_string(key)
            .ok()
            .map(|contents| contents.trim_end().to_string())
    }
}
