//! The string substitution engine.
//!
//! Leaves containing `${...}` expressions are rewritten pass by pass:
//! each pass resolves every expression currently present, innermost and
//! leftmost first, and spliced-in text is re-scanned on the next pass.
//! The pass count is bounded, and a key whose expansion reintroduces a
//! key resolved on an earlier pass is a cycle.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use regex::Regex;

use crate::config::GestaltConfig;
use crate::error::{GestaltError, ValidationError, ValidationLevel};
use crate::node::{ConfigNode, LeafNode};
use crate::validated::Validated;

use super::transform::{EnvTransform, FileTransform, NodeTransform, Transform, TransformContext};
use super::{PostProcessor, ProcessorContext};

/// Marker for one `(transform, key)` pair on the expansion path.
type Marker = (String, String);

struct PassOutcome {
    text: String,
    changed: bool,
    cycle: bool,
}

enum Resolution {
    Value(String),
    Unresolved,
    Cycle,
}

/// Rewrites leaf values containing substitution expressions.
///
/// The expression grammar, tokens, and depth bound come from
/// [`GestaltConfig`]; key lookups go through the registered
/// [`Transform`]s, defaulting to the tree-lookup transform when an
/// expression names none.
pub struct SubstitutionProcessor {
    opening: String,
    closing: String,
    pattern: Regex,
    max_depth: usize,
    transforms: Vec<Arc<dyn Transform>>,
}

impl SubstitutionProcessor {
    /// Build the engine from the configured tokens, grammar, and depth.
    ///
    /// # Errors
    ///
    /// Returns [`GestaltError::Build`] when the configured regex does not
    /// compile or lacks the required named group `key`.
    pub fn new(
        config: &GestaltConfig,
        transforms: Vec<Arc<dyn Transform>>,
    ) -> Result<Self, GestaltError> {
        let pattern = Regex::new(&config.substitution_regex).map_err(|e| {
            GestaltError::Build(format!(
                "invalid substitution regex '{}': {e}",
                config.substitution_regex
            ))
        })?;
        if !pattern.capture_names().flatten().any(|name| name == "key") {
            return Err(GestaltError::Build(
                "substitution regex must define a named capture group 'key'".into(),
            ));
        }
        Ok(Self {
            opening: config.substitution_opening_token.clone(),
            closing: config.substitution_closing_token.clone(),
            pattern,
            max_depth: config.max_substitution_nested_depth,
            transforms,
        })
    }

    /// The bundled transform set: `env`, `node`, and `file`.
    #[must_use]
    pub fn default_transforms() -> Vec<Arc<dyn Transform>> {
        vec![
            Arc::new(EnvTransform),
            Arc::new(NodeTransform),
            Arc::new(FileTransform),
        ]
    }

    fn has_expression(&self, text: &str) -> bool {
        text.find(&self.closing)
            .is_some_and(|close| text[..close].contains(&self.opening))
    }

    fn resolve(&self, path: &str, text: String, ctx: &ProcessorContext<'_>) -> Validated<String> {
        let mut errors = Vec::new();
        let mut seen: HashMap<Marker, usize> = HashMap::new();
        let mut missed: HashSet<Marker> = HashSet::new();
        let mut current = text;
        let mut last_changed = false;

        for pass in 0..self.max_depth {
            let outcome = self.resolve_pass(path, &current, pass, &mut seen, &mut missed, ctx, &mut errors);
            current = outcome.text;
            last_changed = outcome.changed;
            if outcome.cycle || !outcome.changed {
                break;
            }
        }

        if last_changed && missed.is_empty() && self.has_expression(&current) {
            errors.push(ValidationError::SubstitutionRecursionLimit {
                path: path.to_string(),
                max_depth: self.max_depth,
            });
        }
        Validated::of(Some(current), errors)
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_pass(
        &self,
        path: &str,
        input: &str,
        pass: usize,
        seen: &mut HashMap<Marker, usize>,
        missed: &mut HashSet<Marker>,
        ctx: &ProcessorContext<'_>,
        errors: &mut Vec<ValidationError>,
    ) -> PassOutcome {
        let mut out = String::new();
        let mut rest = input;
        let mut changed = false;
        loop {
            let Some(close_idx) = rest.find(&self.closing) else {
                out.push_str(rest);
                break;
            };
            // Innermost-leftmost: the nearest opening before the first
            // closing.
            let Some(open_idx) = rest[..close_idx].rfind(&self.opening) else {
                out.push_str(&rest[..close_idx + self.closing.len()]);
                rest = &rest[close_idx + self.closing.len()..];
                continue;
            };
            let body = &rest[open_idx + self.opening.len()..close_idx];
            out.push_str(&rest[..open_idx]);
            rest = &rest[close_idx + self.closing.len()..];

            match self.resolve_expression(path, body, pass, seen, missed, ctx, errors) {
                Resolution::Value(value) => {
                    out.push_str(&value);
                    changed = true;
                }
                Resolution::Unresolved => {
                    out.push_str(&self.opening);
                    out.push_str(body);
                    out.push_str(&self.closing);
                }
                Resolution::Cycle => {
                    out.push_str(&self.opening);
                    out.push_str(body);
                    out.push_str(&self.closing);
                    out.push_str(rest);
                    return PassOutcome {
                        text: out,
                        changed,
                        cycle: true,
                    };
                }
            }
        }
        PassOutcome {
            text: out,
            changed,
            cycle: false,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_expression(
        &self,
        path: &str,
        body: &str,
        pass: usize,
        seen: &mut HashMap<Marker, usize>,
        missed: &mut HashSet<Marker>,
        ctx: &ProcessorContext<'_>,
        errors: &mut Vec<ValidationError>,
    ) -> Resolution {
        let Some(captures) = self.pattern.captures(body) else {
            // The interior does not match the grammar; leave it literal.
            return Resolution::Unresolved;
        };
        let transform_name = captures
            .name("transform")
            .map_or("node", |m| m.as_str());
        let Some(key) = captures.name("key").map(|m| m.as_str()) else {
            return Resolution::Unresolved;
        };
        let default = captures.name("default").map(|m| m.as_str());
        let marker: Marker = (transform_name.to_string(), key.to_string());

        if let Some(&earlier) = seen.get(&marker) {
            if earlier < pass {
                let mut chain: Vec<(&Marker, usize)> = seen.iter().map(|(m, p)| (m, *p)).collect();
                chain.sort_by_key(|(_, p)| *p);
                let mut rendered: Vec<String> = chain
                    .into_iter()
                    .map(|((transform, key), _)| format!("{transform}:{key}"))
                    .collect();
                rendered.push(format!("{transform_name}:{key}"));
                errors.push(ValidationError::SubstitutionCycle {
                    path: path.to_string(),
                    chain: rendered.join(" -> "),
                });
                return Resolution::Cycle;
            }
        }

        let transform_ctx = TransformContext {
            root: ctx.root,
            lexer: ctx.lexer,
        };
        let resolved = self
            .transforms
            .iter()
            .find(|transform| transform.name() == transform_name)
            .and_then(|transform| transform.get(key, &transform_ctx));

        match resolved {
            Some(value) => {
                seen.entry(marker).or_insert(pass);
                Resolution::Value(value)
            }
            None => match default {
                Some(default) => {
                    if missed.insert(marker.clone()) {
                        errors.push(ValidationError::SubstitutionMissingKey {
                            path: path.to_string(),
                            key: key.to_string(),
                            transform: transform_name.to_string(),
                            level: ValidationLevel::MissingOptionalValue,
                        });
                    }
                    seen.entry(marker).or_insert(pass);
                    Resolution::Value(default.to_string())
                }
                None => {
                    if missed.insert(marker) {
                        errors.push(ValidationError::SubstitutionMissingKey {
                            path: path.to_string(),
                            key: key.to_string(),
                            transform: transform_name.to_string(),
                            level: ValidationLevel::MissingValue,
                        });
                    }
                    Resolution::Unresolved
                }
            },
        }
    }
}

impl PostProcessor for SubstitutionProcessor {
    fn name(&self) -> &'static str {
        "Substitution"
    }

    fn priority(&self) -> i32 {
        400
    }

    fn process(
        &self,
        path: &str,
        node: &ConfigNode,
        ctx: &ProcessorContext<'_>,
    ) -> Validated<ConfigNode> {
        let ConfigNode::Leaf(leaf) = node else {
            return Validated::valid(node.clone());
        };
        let Some(text) = leaf.peek() else {
            return Validated::valid(node.clone());
        };
        if !text.contains(&self.opening) {
            return Validated::valid(node.clone());
        }

        let (resolved, errors) = self.resolve(path, text, ctx).into_parts();
        let replacement = match resolved {
            Some(new_text) => {
                ConfigNode::Leaf(LeafNode::new(new_text).with_metadata(leaf.metadata().clone()))
            }
            None => node.clone(),
        };
        Validated::of(Some(replacement), errors)
    }
}
