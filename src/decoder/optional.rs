//! Optional wrapper decoding.

use std::any::Any;

use crate::error::{ValidationError, ValidationLevel};
use crate::node::ConfigNode;
use crate::reflect::{TypeInfo, TypeKind};
use crate::validated::Validated;

use super::{Decoder, DecoderContext};

/// Decodes `Option`-like wrappers by delegating to the component type.
///
/// A leaf with no value yields `None` plus an accepted-missing error.
/// A present node delegates through the registry; a failed inner decode
/// still yields `None`, with the inner errors preserved so corrupt data
/// keeps failing strict reads.
pub struct OptionalDecoder;

impl Decoder for OptionalDecoder {
    fn name(&self) -> &'static str {
        "Optional"
    }

    fn matches(&self, ty: &TypeInfo) -> bool {
        matches!(ty.kind(), TypeKind::Optional(_))
    }

    fn decode(
        &self,
        path: &str,
        node: &ConfigNode,
        ty: &TypeInfo,
        ctx: &DecoderContext<'_>,
    ) -> Validated<Box<dyn Any>> {
        let TypeKind::Optional(shape) = ty.kind() else {
            return Validated::invalid(ValidationError::NoDecoderFor {
                path: path.to_string(),
                type_name: ty.name(),
            });
        };

        if let ConfigNode::Leaf(leaf) = node {
            if leaf.peek().is_none() {
                return Validated::of(
                    Some((shape.none)()),
                    vec![ValidationError::NoResultsFoundForNode {
                        path: path.to_string(),
                        missing: path.to_string(),
                        level: ValidationLevel::MissingOptionalValue,
                    }],
                );
            }
        }

        let component = (shape.component)();
        let (value, mut errors) = ctx
            .registry
            .decode_node(path, node, &component, ctx.config)
            .into_parts();
        match value {
            Some(inner) => match (shape.some)(inner) {
                Some(wrapped) => Validated::of(Some(wrapped), errors),
                None => {
                    errors.push(ValidationError::InternalDecoderMismatch {
                        path: path.to_string(),
                        decoder: self.name().to_string(),
                        type_name: component.name(),
                    });
                    Validated::from_errors(errors)
                }
            },
            None => Validated::of(Some((shape.none)()), errors),
        }
    }
}
