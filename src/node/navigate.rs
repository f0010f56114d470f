//! Token-driven navigation through a node tree.

use crate::error::{ValidationError, ValidationLevel};
use crate::token::Token;
use crate::validated::Validated;

use super::{ConfigNode, NodeKind};

/// Walk `tokens` down from `root`.
///
/// `path` is the caller's rendering of the full path, used in errors.
/// Absent keys and indices yield `NoResultsFoundForNode` at MISSING_VALUE;
/// a token whose kind does not match the node variant yields
/// `MismatchedPathType`. Navigation never panics and never consumes
/// temporary-leaf budgets.
#[must_use]
pub fn navigate<'a>(
    root: &'a ConfigNode,
    tokens: &[Token],
    path: &str,
) -> Validated<&'a ConfigNode> {
    let mut current = root;
    for token in tokens {
        match token {
            Token::Object(name) => {
                if current.kind() != NodeKind::Map {
                    return Validated::invalid(ValidationError::MismatchedPathType {
                        path: path.to_string(),
                        expected: NodeKind::Map,
                        actual: current.kind(),
                    });
                }
                match current.get_key(name) {
                    Some(next) => current = next,
                    None => {
                        return Validated::invalid(ValidationError::NoResultsFoundForNode {
                            path: path.to_string(),
                            missing: name.clone(),
                            level: ValidationLevel::MissingValue,
                        });
                    }
                }
            }
            Token::Array(index) => {
                if current.kind() != NodeKind::Array {
                    return Validated::invalid(ValidationError::MismatchedPathType {
                        path: path.to_string(),
                        expected: NodeKind::Array,
                        actual: current.kind(),
                    });
                }
                match current.get_index(*index) {
                    Some(next) => current = next,
                    None => {
                        return Validated::invalid(ValidationError::NoResultsFoundForNode {
                            path: path.to_string(),
                            missing: format!("[{index}]"),
                            level: ValidationLevel::MissingValue,
                        });
                    }
                }
            }
        }
    }
    Validated::valid(current)
}
