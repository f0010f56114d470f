//! Leaf decoders for strings, booleans, chars, uuids, and paths.

use std::any::Any;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use uuid::Uuid;

use crate::error::{ValidationError, ValidationLevel};
use crate::node::{ConfigNode, NodeKind};
use crate::reflect::TypeInfo;
use crate::validated::Validated;

use super::{Decoder, DecoderContext};

/// Extract the string value of a leaf, or the error explaining why not.
///
/// Reading the value counts against a temporary leaf's budget, so leaf
/// decoders call this exactly once per decode.
pub(crate) fn require_leaf_value(
    path: &str,
    node: &ConfigNode,
    decoder: &'static str,
) -> Result<String, ValidationError> {
    match node {
        ConfigNode::Leaf(_) => node
            .value()
            .ok_or_else(|| ValidationError::DecodingLeafMissingValue {
                path: path.to_string(),
                decoder,
            }),
        other => Err(ValidationError::DecodingExpectedNodeType {
            path: path.to_string(),
            expected: NodeKind::Leaf,
            actual: other.kind(),
            decoder,
        }),
    }
}

/// Decodes a leaf into a `String`, verbatim.
pub struct StringDecoder;

impl Decoder for StringDecoder {
    fn name(&self) -> &'static str {
        "String"
    }

    fn matches(&self, ty: &TypeInfo) -> bool {
        ty.is::<String>()
    }

    fn decode(
        &self,
        path: &str,
        node: &ConfigNode,
        _ty: &TypeInfo,
        _ctx: &DecoderContext<'_>,
    ) -> Validated<Box<dyn Any>> {
        match require_leaf_value(path, node, self.name()) {
            Ok(value) => Validated::valid(Box::new(value)),
            Err(error) => Validated::invalid(error),
        }
    }
}

/// Decodes `true/false`, `yes/no`, and `1/0`, case-insensitively.
pub struct BoolDecoder;

impl Decoder for BoolDecoder {
    fn name(&self) -> &'static str {
        "Bool"
    }

    fn matches(&self, ty: &TypeInfo) -> bool {
        ty.is::<bool>()
    }

    fn decode(
        &self,
        path: &str,
        node: &ConfigNode,
        _ty: &TypeInfo,
        _ctx: &DecoderContext<'_>,
    ) -> Validated<Box<dyn Any>> {
        let value = match require_leaf_value(path, node, self.name()) {
            Ok(value) => value,
            Err(error) => return Validated::invalid(error),
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Validated::valid(Box::new(true)),
            "false" | "no" | "0" => Validated::valid(Box::new(false)),
            _ => Validated::invalid(ValidationError::DecodingValueParsing {
                path: path.to_string(),
                value,
                decoder: self.name(),
            }),
        }
    }
}

/// Decodes a leaf holding exactly one character.
///
/// A longer value keeps the first character and warns; an empty value is
/// an error with no result.
pub struct CharDecoder;

impl Decoder for CharDecoder {
    fn name(&self) -> &'static str {
        "Char"
    }

    fn matches(&self, ty: &TypeInfo) -> bool {
        ty.is::<char>()
    }

    fn decode(
        &self,
        path: &str,
        node: &ConfigNode,
        _ty: &TypeInfo,
        _ctx: &DecoderContext<'_>,
    ) -> Validated<Box<dyn Any>> {
        let value = match require_leaf_value(path, node, self.name()) {
            Ok(value) => value,
            Err(error) => return Validated::invalid(error),
        };
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(first), None) => Validated::valid(Box::new(first)),
            (Some(first), Some(_)) => Validated::of(
                Some(Box::new(first)),
                vec![ValidationError::DecodingCharWrongSize {
                    path: path.to_string(),
                    value,
                    level: ValidationLevel::Warn,
                }],
            ),
            (None, _) => Validated::invalid(ValidationError::DecodingCharWrongSize {
                path: path.to_string(),
                value,
                level: ValidationLevel::Error,
            }),
        }
    }
}

/// Decodes a UUID in its canonical textual forms.
pub struct UuidDecoder;

impl Decoder for UuidDecoder {
    fn name(&self) -> &'static str {
        "Uuid"
    }

    fn matches(&self, ty: &TypeInfo) -> bool {
        ty.is::<Uuid>()
    }

    fn decode(
        &self,
        path: &str,
        node: &ConfigNode,
        _ty: &TypeInfo,
        _ctx: &DecoderContext<'_>,
    ) -> Validated<Box<dyn Any>> {
        let value = match require_leaf_value(path, node, self.name()) {
            Ok(value) => value,
            Err(error) => return Validated::invalid(error),
        };
        match Uuid::parse_str(value.trim()) {
            Ok(uuid) => Validated::valid(Box::new(uuid)),
            Err(_) => Validated::invalid(ValidationError::DecodingValueParsing {
                path: path.to_string(),
                value,
                decoder: self.name(),
            }),
        }
    }
}

/// Decodes a filesystem path. Any string is a valid `PathBuf`.
pub struct PathDecoder;

impl Decoder for PathDecoder {
    fn name(&self) -> &'static str {
        "Path"
    }

    fn matches(&self, ty: &TypeInfo) -> bool {
        ty.is::<PathBuf>()
    }

    fn decode(
        &self,
        path: &str,
        node: &ConfigNode,
        _ty: &TypeInfo,
        _ctx: &DecoderContext<'_>,
    ) -> Validated<Box<dyn Any>> {
        match require_leaf_value(path, node, self.name()) {
            Ok(value) => Validated::valid(Box::new(PathBuf::from(value))),
            Err(error) => Validated::invalid(error),
        }
    }
}

/// Decodes a UTF-8 filesystem path.
pub struct Utf8PathDecoder;

impl Decoder for Utf8PathDecoder {
    fn name(&self) -> &'static str {
        "Utf8Path"
    }

    fn matches(&self, ty: &TypeInfo) -> bool {
        ty.is::<Utf8PathBuf>()
    }

    fn decode(
        &self,
        path: &str,
        node: &ConfigNode,
        _ty: &TypeInfo,
        _ctx: &DecoderContext<'_>,
    ) -> Validated<Box<dyn Any>> {
        match require_leaf_value(path, node, self.name()) {
            Ok(value) => Validated::valid(Box::new(Utf8PathBuf::from(value))),
            Err(error) => Validated::invalid(error),
        }
    }
}
