//! Loaders turn a source's contribution into a node fragment.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::ValidationError;
use crate::lexer::PathLexer;
use crate::node::{merge, ArrayNode, ConfigNode, LeafNode, MapNode};
use crate::source::{ConfigSource, ENV_VARS_FORMAT, MAP_NODE_FORMAT};
use crate::token::Token;
use crate::validated::Validated;

/// Parses one family of formats into node fragments.
pub trait ConfigLoader: Send + Sync {
    /// Loader name for diagnostics.
    fn name(&self) -> &'static str;

    /// Whether this loader handles `format`.
    fn accepts(&self, format: &str) -> bool;

    /// Load the source's contribution as a single fragment root.
    fn load(&self, source: &dyn ConfigSource, lexer: &PathLexer) -> Validated<ConfigNode>;
}

/// Picks the first registered loader accepting a format.
pub struct ConfigLoaderRegistry {
    loaders: Vec<Arc<dyn ConfigLoader>>,
}

impl ConfigLoaderRegistry {
    /// Registry over the given loaders, in order.
    #[must_use]
    pub fn new(loaders: Vec<Arc<dyn ConfigLoader>>) -> Self {
        Self { loaders }
    }

    /// The loader for `format`, if any accepts it.
    #[must_use]
    pub fn loader_for(&self, format: &str) -> Option<Arc<dyn ConfigLoader>> {
        self.loaders
            .iter()
            .find(|loader| loader.accepts(format))
            .cloned()
    }

    /// Number of registered loaders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    /// Whether no loaders are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

/// The bundled loader set.
#[must_use]
pub fn default_loaders() -> Vec<Arc<dyn ConfigLoader>> {
    vec![
        Arc::new(MapConfigLoader),
        Arc::new(EnvironmentVarsLoader),
        Arc::new(JsonLoader),
    ]
}

/// Wrap a leaf value in the nodes described by a token path, innermost
/// out, producing a single-path fragment that merges into the tree.
fn fragment_for_tokens(tokens: &[Token], value: String) -> ConfigNode {
    let mut node = ConfigNode::Leaf(LeafNode::new(value));
    for token in tokens.iter().rev() {
        node = match token {
            Token::Object(name) => {
                let mut map = MapNode::new();
                map.insert(name.clone(), node);
                ConfigNode::Map(map)
            }
            Token::Array(index) => {
                let mut slots = Vec::new();
                slots.resize_with(index + 1, || None);
                slots[*index] = Some(node);
                ConfigNode::Array(ArrayNode::new(slots))
            }
        };
    }
    node
}

/// Fold key/value pairs into a tree, with each key lexed by `tokenize`.
fn fold_pairs(
    pairs: Vec<(String, String)>,
    tokenize: impl Fn(&str) -> Validated<Vec<Token>>,
) -> Validated<ConfigNode> {
    let mut errors = Vec::new();
    let mut root = ConfigNode::Map(MapNode::new());
    for (key, value) in pairs {
        let (tokens, key_errors) = tokenize(&key).into_parts();
        errors.extend(key_errors);
        let Some(tokens) = tokens else { continue };
        if tokens.is_empty() {
            continue;
        }
        let fragment = fragment_for_tokens(&tokens, value);
        let (merged, merge_errors) = merge(root, fragment, "").into_parts();
        errors.extend(merge_errors);
        root = merged.unwrap_or_else(|| ConfigNode::Map(MapNode::new()));
    }
    Validated::of(Some(root), errors)
}

fn load_list(source: &dyn ConfigSource) -> Result<Vec<(String, String)>, ValidationError> {
    source
        .load_list()
        .map_err(|e| ValidationError::SourceLoadFailure {
            source_name: source.name(),
            message: e.to_string(),
        })
}

/// Loads key/value lists whose keys are dotted paths, such as those from
/// an in-memory map source.
pub struct MapConfigLoader;

impl ConfigLoader for MapConfigLoader {
    fn name(&self) -> &'static str {
        "MapConfigLoader"
    }

    fn accepts(&self, format: &str) -> bool {
        format == MAP_NODE_FORMAT
    }

    fn load(&self, source: &dyn ConfigSource, lexer: &PathLexer) -> Validated<ConfigNode> {
        let pairs = match load_list(source) {
            Ok(pairs) => pairs,
            Err(error) => return Validated::invalid(error),
        };
        fold_pairs(pairs, |key| lexer.scan(key))
    }
}

/// Loads environment-variable lists: `DB_PORT=1` becomes `db.port=1`.
pub struct EnvironmentVarsLoader;

impl ConfigLoader for EnvironmentVarsLoader {
    fn name(&self) -> &'static str {
        "EnvironmentVarsLoader"
    }

    fn accepts(&self, format: &str) -> bool {
        format == ENV_VARS_FORMAT
    }

    fn load(&self, source: &dyn ConfigSource, _lexer: &PathLexer) -> Validated<ConfigNode> {
        let pairs = match load_list(source) {
            Ok(pairs) => pairs,
            Err(error) => return Validated::invalid(error),
        };
        fold_pairs(pairs, |key| {
            let tokens = key
                .split('_')
                .filter(|segment| !segment.is_empty())
                .map(|segment| Token::object(segment.to_ascii_lowercase()))
                .collect();
            Validated::valid(tokens)
        })
    }
}

/// Loads JSON streams.
pub struct JsonLoader;

fn json_to_node(value: JsonValue) -> ConfigNode {
    match value {
        JsonValue::Null => ConfigNode::Leaf(LeafNode::empty()),
        JsonValue::Bool(b) => ConfigNode::leaf(b.to_string()),
        JsonValue::Number(n) => ConfigNode::leaf(n.to_string()),
        JsonValue::String(s) => ConfigNode::leaf(s),
        JsonValue::Array(items) => {
            ConfigNode::Array(ArrayNode::new(items.into_iter().map(|item| Some(json_to_node(item))).collect()))
        }
        JsonValue::Object(entries) => {
            let mut map = MapNode::new();
            for (key, entry) in entries {
                map.insert(key, json_to_node(entry));
            }
            ConfigNode::Map(map)
        }
    }
}

impl ConfigLoader for JsonLoader {
    fn name(&self) -> &'static str {
        "JsonLoader"
    }

    fn accepts(&self, format: &str) -> bool {
        format.eq_ignore_ascii_case("json")
    }

    fn load(&self, source: &dyn ConfigSource, _lexer: &PathLexer) -> Validated<ConfigNode> {
        let bytes = match source.load_stream() {
            Ok(bytes) => bytes,
            Err(e) => {
                return Validated::invalid(ValidationError::SourceLoadFailure {
                    source_name: source.name(),
                    message: e.to_string(),
                });
            }
        };
        match serde_json::from_slice::<JsonValue>(&bytes) {
            Ok(value) => Validated::valid(json_to_node(value)),
            Err(e) => Validated::invalid(ValidationError::SourceLoadFailure {
                source_name: source.name(),
                message: e.to_string(),
            }),
        }
    }
}
