//! Wrapping of secret leaves in access-counted values.

use crate::meta::{MetaValue, SECRET};
use crate::node::{ConfigNode, LeafNode};
use crate::secret::SecretChecker;
use crate::validated::Validated;

use super::{PostProcessor, ProcessorContext};

/// Replaces leaves matching a secret rule with access-counted leaves.
///
/// The wrapped leaf yields its value for the configured number of reads,
/// then permanently yields nothing and drops the plain text. Runs after
/// substitution, so the wrapped value is the fully resolved one.
pub struct TemporarySecretProcessor {
    rules: Vec<(SecretChecker, usize)>,
}

impl TemporarySecretProcessor {
    /// Processor over `(rule, access_count)` pairs; the first matching
    /// rule decides the budget.
    #[must_use]
    pub fn new(rules: Vec<(SecretChecker, usize)>) -> Self {
        Self { rules }
    }
}

impl PostProcessor for TemporarySecretProcessor {
    fn name(&self) -> &'static str {
        "TemporarySecret"
    }

    fn priority(&self) -> i32 {
        200
    }

    fn process(
        &self,
        path: &str,
        node: &ConfigNode,
        _ctx: &ProcessorContext<'_>,
    ) -> Validated<ConfigNode> {
        let ConfigNode::Leaf(leaf) = node else {
            return Validated::valid(node.clone());
        };
        let Some(value) = leaf.peek() else {
            return Validated::valid(node.clone());
        };
        let Some((_, access_count)) = self
            .rules
            .iter()
            .find(|(checker, _)| checker.is_secret(path))
        else {
            return Validated::valid(node.clone());
        };

        let mut metadata = leaf.metadata().clone();
        if !metadata.has_flag(SECRET) {
            metadata.insert(SECRET, MetaValue::Flag(true));
        }
        Validated::valid(ConfigNode::Leaf(LeafNode::temporary(
            value,
            *access_count,
            metadata,
        )))
    }
}
