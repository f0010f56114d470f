//! Sequence decoding from array nodes or comma-separated leaves.

use std::any::Any;

use crate::error::{ValidationError, ValidationLevel};
use crate::node::{ArrayNode, ConfigNode, LeafNode, NodeKind};
use crate::reflect::{ArrayShape, TypeInfo, TypeKind};
use crate::validated::Validated;

use super::{index_path, Decoder, DecoderContext};

/// Decodes any captured sequence type.
///
/// Accepts an array node, or a leaf whose value is split on commas with
/// each element trimmed — so `hosts=a, b ,c` decodes as three entries.
/// Elements decode recursively through the registry as the component
/// type.
pub struct ArrayDecoder;

impl ArrayDecoder {
    fn decode_elements(
        &self,
        path: &str,
        node: &ConfigNode,
        shape: &ArrayShape,
        ctx: &DecoderContext<'_>,
    ) -> Validated<Box<dyn Any>> {
        let component = (shape.component)();
        let mut builder = (shape.builder)();
        let mut errors = Vec::new();
        for index in 0..node.size() {
            let element_path = index_path(path, index);
            match node.get_index(index) {
                Some(element) => {
                    let (value, element_errors) = ctx
                        .registry
                        .decode_node(&element_path, element, &component, ctx.config)
                        .into_parts();
                    errors.extend(element_errors);
                    if let Some(value) = value {
                        if !builder.push(value) {
                            errors.push(ValidationError::InternalDecoderMismatch {
                                path: element_path,
                                decoder: self.name().to_string(),
                                type_name: component.name(),
                            });
                        }
                    }
                }
                None => {
                    let level = if ctx.config.treat_missing_array_index_as_error {
                        ValidationLevel::Error
                    } else {
                        ValidationLevel::Warn
                    };
                    errors.push(ValidationError::ArrayMissingIndex {
                        path: path.to_string(),
                        index,
                        level,
                    });
                }
            }
        }
        Validated::of(Some(builder.finish()), errors)
    }
}

impl Decoder for ArrayDecoder {
    fn name(&self) -> &'static str {
        "Array"
    }

    fn matches(&self, ty: &TypeInfo) -> bool {
        matches!(ty.kind(), TypeKind::Array(_))
    }

    fn decode(
        &self,
        path: &str,
        node: &ConfigNode,
        ty: &TypeInfo,
        ctx: &DecoderContext<'_>,
    ) -> Validated<Box<dyn Any>> {
        let TypeKind::Array(shape) = ty.kind() else {
            return Validated::invalid(ValidationError::NoDecoderFor {
                path: path.to_string(),
                type_name: ty.name(),
            });
        };
        match node {
            ConfigNode::Array(_) => self.decode_elements(path, node, shape, ctx),
            ConfigNode::Leaf(_) => match node.value() {
                Some(value) => {
                    let elements = value
                        .split(',')
                        .map(|item| ConfigNode::Leaf(LeafNode::new(item.trim())))
                        .collect::<Vec<_>>();
                    let expanded = ConfigNode::Array(ArrayNode::new(
                        elements.into_iter().map(Some).collect(),
                    ));
                    self.decode_elements(path, &expanded, shape, ctx)
                }
                None => Validated::invalid(ValidationError::DecodingLeafMissingValue {
                    path: path.to_string(),
                    decoder: self.name(),
                }),
            },
            ConfigNode::Map(_) => Validated::invalid(ValidationError::DecodingExpectedNodeType {
                path: path.to_string(),
                expected: NodeKind::Array,
                actual: NodeKind::Map,
                decoder: self.name(),
            }),
        }
    }
}
