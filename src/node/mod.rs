//! The configuration node tree: leaves, arrays, and case-insensitive maps.

mod manager;
mod merge;
mod navigate;
mod temporary;

pub use manager::ConfigNodeManager;
pub use merge::merge;
pub use navigate::navigate;
pub use temporary::TemporaryValue;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use uncased::{Uncased, UncasedStr};

use crate::meta::{Metadata, SECRET};

/// The three node variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A string value (or the absence of one).
    Leaf,
    /// A sparse, index-addressed sequence.
    Array,
    /// A case-insensitive, name-addressed mapping.
    Map,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Leaf => "leaf",
            Self::Array => "array",
            Self::Map => "map",
        })
    }
}

/// A leaf holding an optional string value plus metadata.
///
/// Leaf values are opaque strings; all typing happens downstream in the
/// decoders. A leaf may instead hold a [`TemporaryValue`], which yields
/// the string a bounded number of times before dropping it.
#[derive(Debug, Clone)]
pub struct LeafNode {
    value: LeafValue,
    metadata: Metadata,
}

#[derive(Debug, Clone)]
enum LeafValue {
    Plain(Option<String>),
    Temporary(Arc<TemporaryValue>),
}

impl LeafNode {
    /// Leaf with a value and no metadata.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: LeafValue::Plain(Some(value.into())),
            metadata: Metadata::new(),
        }
    }

    /// Leaf with no value.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            value: LeafValue::Plain(None),
            metadata: Metadata::new(),
        }
    }

    /// Attach metadata to this leaf.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Leaf whose value may be read `access_count` times before it is
    /// dropped for good.
    #[must_use]
    pub fn temporary(value: impl Into<String>, access_count: usize, metadata: Metadata) -> Self {
        Self {
            value: LeafValue::Temporary(Arc::new(TemporaryValue::new(value.into(), access_count))),
            metadata,
        }
    }

    /// Read the value. Counts against a temporary leaf's budget.
    #[must_use]
    pub fn value(&self) -> Option<String> {
        match &self.value {
            LeafValue::Plain(value) => value.clone(),
            LeafValue::Temporary(cell) => cell.take(),
        }
    }

    /// Read the value without touching a temporary leaf's budget.
    #[must_use]
    pub fn peek(&self) -> Option<String> {
        match &self.value {
            LeafValue::Plain(value) => value.clone(),
            LeafValue::Temporary(cell) => cell.peek(),
        }
    }

    /// This leaf's metadata.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

impl PartialEq for LeafNode {
    fn eq(&self, other: &Self) -> bool {
        self.peek() == other.peek() && self.metadata == other.metadata
    }
}

/// A sparse array node. Slot `i` represents index `i`; absent slots are
/// explicit `None` and the size is max index + 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayNode {
    elements: Vec<Option<ConfigNode>>,
}

impl ArrayNode {
    /// Array from explicit (possibly sparse) slots.
    #[must_use]
    pub fn new(elements: Vec<Option<ConfigNode>>) -> Self {
        Self { elements }
    }

    /// Number of slots, filled or not.
    #[must_use]
    pub fn size(&self) -> usize {
        self.elements.len()
    }

    /// The node at `index`, if the slot is filled.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ConfigNode> {
        self.elements.get(index).and_then(Option::as_ref)
    }

    /// Place `node` at `index`, growing the array as needed.
    pub fn set(&mut self, index: usize, node: ConfigNode) {
        if index >= self.elements.len() {
            self.elements.resize_with(index + 1, || None);
        }
        self.elements[index] = Some(node);
    }

    pub(crate) fn slots(&self) -> &[Option<ConfigNode>] {
        &self.elements
    }

    pub(crate) fn into_slots(self) -> Vec<Option<ConfigNode>> {
        self.elements
    }
}

/// A map node with case-insensitive keys.
///
/// Lookup ignores case; the display case of the first insert is kept for
/// rendering and error messages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapNode {
    entries: HashMap<Uncased<'static>, ConfigNode>,
}

impl MapNode {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    #[must_use]
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Case-insensitive lookup.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        self.entries.get(UncasedStr::new(key))
    }

    /// Insert or replace; a key differing only by case replaces the value
    /// but keeps the original display key.
    pub fn insert(&mut self, key: impl Into<String>, node: ConfigNode) {
        self.entries.insert(Uncased::from(key.into()), node);
    }

    /// Iterate entries with their display keys.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn remove_entry(&mut self, key: &UncasedStr) -> Option<(Uncased<'static>, ConfigNode)> {
        self.entries.remove_entry(key)
    }

    pub(crate) fn entries(self) -> HashMap<Uncased<'static>, ConfigNode> {
        self.entries
    }

    pub(crate) fn insert_raw(&mut self, key: Uncased<'static>, node: ConfigNode) {
        self.entries.insert(key, node);
    }
}

/// A node in the configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigNode {
    /// A string value.
    Leaf(LeafNode),
    /// A sparse sequence.
    Array(ArrayNode),
    /// A case-insensitive mapping.
    Map(MapNode),
}

impl ConfigNode {
    /// Leaf node with a value.
    #[must_use]
    pub fn leaf(value: impl Into<String>) -> Self {
        Self::Leaf(LeafNode::new(value))
    }

    /// Leaf node with no value.
    #[must_use]
    pub fn empty_leaf() -> Self {
        Self::Leaf(LeafNode::empty())
    }

    /// Array node with every slot filled.
    #[must_use]
    pub fn array(elements: impl IntoIterator<Item = ConfigNode>) -> Self {
        Self::Array(ArrayNode::new(elements.into_iter().map(Some).collect()))
    }

    /// Array node from explicit, possibly sparse, slots.
    #[must_use]
    pub fn sparse_array(elements: Vec<Option<ConfigNode>>) -> Self {
        Self::Array(ArrayNode::new(elements))
    }

    /// Map node from key/node pairs.
    #[must_use]
    pub fn map(entries: impl IntoIterator<Item = (&'static str, ConfigNode)>) -> Self {
        let mut map = MapNode::new();
        for (key, node) in entries {
            map.insert(key, node);
        }
        Self::Map(map)
    }

    /// Which variant this node is.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Leaf(_) => NodeKind::Leaf,
            Self::Array(_) => NodeKind::Array,
            Self::Map(_) => NodeKind::Map,
        }
    }

    /// Leaf: 1. Array: slot count. Map: entry count.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Array(array) => array.size(),
            Self::Map(map) => map.size(),
        }
    }

    /// Case-insensitive map lookup; `None` on other variants.
    #[must_use]
    pub fn get_key(&self, key: &str) -> Option<&ConfigNode> {
        match self {
            Self::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Array slot lookup; `None` on other variants or empty slots.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&ConfigNode> {
        match self {
            Self::Array(array) => array.get(index),
            _ => None,
        }
    }

    /// Leaf value; `None` on other variants. Counts against a temporary
    /// leaf's budget.
    #[must_use]
    pub fn value(&self) -> Option<String> {
        match self {
            Self::Leaf(leaf) => leaf.value(),
            _ => None,
        }
    }

    /// Rolled-up metadata for this node.
    ///
    /// A leaf returns its own metadata; containers accumulate their
    /// children's rolling entries.
    #[must_use]
    pub fn metadata(&self) -> Metadata {
        match self {
            Self::Leaf(leaf) => leaf.metadata().clone(),
            Self::Array(array) => {
                let mut rolled = Metadata::new();
                for node in array.slots().iter().flatten() {
                    node.metadata().rollup_into(&mut rolled);
                }
                rolled
            }
            Self::Map(map) => {
                let mut rolled = Metadata::new();
                for (_, node) in map.iter() {
                    node.metadata().rollup_into(&mut rolled);
                }
                rolled
            }
        }
    }
}

impl fmt::Display for ConfigNode {
    /// Structural rendering for logs and debugging. Values of leaves whose
    /// metadata marks them secret are concealed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(leaf) => {
                if leaf.metadata().has_flag(SECRET) {
                    f.write_str("*****")
                } else {
                    match leaf.peek() {
                        Some(value) => write!(f, "{value}"),
                        None => f.write_str("none"),
                    }
                }
            }
            Self::Array(array) => {
                f.write_str("[")?;
                for (i, slot) in array.slots().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match slot {
                        Some(node) => write!(f, "{node}")?,
                        None => f.write_str("none")?,
                    }
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                let mut keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
                keys.sort_unstable();
                f.write_str("{")?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    // Sorted keys came from the map, so the lookup holds.
                    let node = map.get(key).ok_or(fmt::Error)?;
                    write!(f, "{key}={node}")?;
                }
                f.write_str("}")
            }
        }
    }
}
