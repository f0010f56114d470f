//! Post-processors rewrite the tree at generation-build time.

mod substitution;
mod temporary;
mod transform;

pub use substitution::SubstitutionProcessor;
pub use temporary::TemporarySecretProcessor;
pub use transform::{EnvTransform, FileTransform, MapTransform, NodeTransform, Transform, TransformContext};

use std::cmp::Reverse;
use std::sync::Arc;

use crate::config::GestaltConfig;
use crate::lexer::PathLexer;
use crate::node::{ArrayNode, ConfigNode, MapNode};
use crate::validated::Validated;

/// What a processor may consult besides the node in hand.
///
/// The staged root is passed as an argument rather than stored in the
/// processor, so processors stay free of generation state.
pub struct ProcessorContext<'a> {
    /// Root of the staged (not yet published) tree.
    pub root: &'a ConfigNode,
    /// Lexer for processors that navigate.
    pub lexer: &'a PathLexer,
    /// Policy flags and substitution settings.
    pub config: &'a GestaltConfig,
}

/// Rewrites a node (usually a leaf) during generation build.
pub trait PostProcessor: Send + Sync {
    /// Processor name for diagnostics.
    fn name(&self) -> &'static str;

    /// Processors run in descending priority order at every node.
    fn priority(&self) -> i32 {
        100
    }

    /// Produce the replacement for `node`, or `node` itself unchanged.
    fn process(
        &self,
        path: &str,
        node: &ConfigNode,
        ctx: &ProcessorContext<'_>,
    ) -> Validated<ConfigNode>;
}

/// Apply `processors` depth-first over the tree rooted at `root`.
///
/// At each node the processors run highest-priority first, each seeing
/// the previous one's output; the walk then descends into the result's
/// children.
#[must_use]
pub fn process_tree(
    root: &ConfigNode,
    processors: &[Arc<dyn PostProcessor>],
    lexer: &PathLexer,
    config: &GestaltConfig,
) -> Validated<ConfigNode> {
    let mut ordered: Vec<Arc<dyn PostProcessor>> = processors.to_vec();
    ordered.sort_by_key(|processor| Reverse(processor.priority()));
    let ctx = ProcessorContext {
        root,
        lexer,
        config,
    };
    walk("", root, &ordered, &ctx)
}

fn walk(
    path: &str,
    node: &ConfigNode,
    processors: &[Arc<dyn PostProcessor>],
    ctx: &ProcessorContext<'_>,
) -> Validated<ConfigNode> {
    let mut errors = Vec::new();
    let mut current = node.clone();
    for processor in processors {
        let (value, processor_errors) = processor.process(path, &current, ctx).into_parts();
        errors.extend(processor_errors);
        if let Some(replacement) = value {
            current = replacement;
        }
    }

    match current {
        ConfigNode::Leaf(leaf) => Validated::of(Some(ConfigNode::Leaf(leaf)), errors),
        ConfigNode::Array(array) => {
            let mut slots = Vec::with_capacity(array.size());
            for (index, slot) in array.into_slots().into_iter().enumerate() {
                match slot {
                    Some(child) => {
                        let child_path = format!("{path}[{index}]");
                        let (value, child_errors) =
                            walk(&child_path, &child, processors, ctx).into_parts();
                        errors.extend(child_errors);
                        slots.push(value);
                    }
                    None => slots.push(None),
                }
            }
            Validated::of(Some(ConfigNode::Array(ArrayNode::new(slots))), errors)
        }
        ConfigNode::Map(map) => {
            let mut rebuilt = MapNode::new();
            for (key, child) in map.entries() {
                let child_path = if path.is_empty() {
                    key.as_str().to_string()
                } else {
                    format!("{path}.{key}")
                };
                let (value, child_errors) = walk(&child_path, &child, processors, ctx).into_parts();
                errors.extend(child_errors);
                if let Some(processed) = value {
                    rebuilt.insert_raw(key, processed);
                }
            }
            Validated::of(Some(ConfigNode::Map(rebuilt)), errors)
        }
    }
}

#[cfg(test)]
mod tests;
