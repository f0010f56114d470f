//! Recursive merge of two node trees, second argument winning conflicts.

use crate::error::ValidationError;
use crate::validated::Validated;

use super::{ArrayNode, ConfigNode, MapNode};

fn key_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Merge `over` onto `base`.
///
/// Maps union recursively. Arrays merge index-wise: a filled slot in
/// `over` overrides, an empty one preserves `base`. For leaves, `over`
/// wins unless it carries no value. Two different variants record a
/// `MergeConflict` and keep `over`, so one bad fragment degrades a
/// subtree rather than aborting the whole build.
///
/// The operation is associative, with conflicts resolved last-wins.
#[must_use]
pub fn merge(base: ConfigNode, over: ConfigNode, path: &str) -> Validated<ConfigNode> {
    match (base, over) {
        (ConfigNode::Leaf(a), ConfigNode::Leaf(b)) => {
            if b.peek().is_some() || a.peek().is_none() {
                Validated::valid(ConfigNode::Leaf(b))
            } else {
                Validated::valid(ConfigNode::Leaf(a))
            }
        }
        (ConfigNode::Map(a), ConfigNode::Map(b)) => merge_maps(a, b, path),
        (ConfigNode::Array(a), ConfigNode::Array(b)) => Validated::valid(merge_arrays(a, b)),
        (base, over) => {
            let error = ValidationError::MergeConflict {
                path: path.to_string(),
                left: base.kind(),
                right: over.kind(),
            };
            Validated::of(Some(over), vec![error])
        }
    }
}

fn merge_maps(mut base: MapNode, over: MapNode, path: &str) -> Validated<ConfigNode> {
    let mut errors = Vec::new();
    for (key, over_node) in over.entries() {
        match base.remove_entry(&key) {
            Some((existing_key, base_node)) => {
                let child_path = key_path(path, existing_key.as_str());
                let (merged, child_errors) = merge(base_node, over_node, &child_path).into_parts();
                errors.extend(child_errors);
                if let Some(node) = merged {
                    base.insert_raw(existing_key, node);
                }
            }
            None => base.insert_raw(key, over_node),
        }
    }
    Validated::of(Some(ConfigNode::Map(base)), errors)
}

fn merge_arrays(base: ArrayNode, over: ArrayNode) -> ConfigNode {
    let mut slots = base.into_slots();
    let over_slots = over.into_slots();
    if over_slots.len() > slots.len() {
        slots.resize_with(over_slots.len(), || None);
    }
    for (i, slot) in over_slots.into_iter().enumerate() {
        if slot.is_some() {
            slots[i] = slot;
        }
    }
    ConfigNode::Array(ArrayNode::new(slots))
}
