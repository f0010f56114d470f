//! Mapping decoding from map nodes.

use std::any::Any;

use crate::error::ValidationError;
use crate::node::{ConfigNode, NodeKind};
use crate::reflect::{TypeInfo, TypeKind};
use crate::validated::Validated;

use super::{key_path, Decoder, DecoderContext};

/// Decodes any captured string-keyed mapping type.
///
/// Walks the map node's entries, decoding each value recursively as the
/// component type. Output keys use the stored display case.
pub struct MapDecoder;

impl Decoder for MapDecoder {
    fn name(&self) -> &'static str {
        "Map"
    }

    fn matches(&self, ty: &TypeInfo) -> bool {
        matches!(ty.kind(), TypeKind::Map(_))
    }

    fn decode(
        &self,
        path: &str,
        node: &ConfigNode,
        ty: &TypeInfo,
        ctx: &DecoderContext<'_>,
    ) -> Validated<Box<dyn Any>> {
        let TypeKind::Map(shape) = ty.kind() else {
            return Validated::invalid(ValidationError::NoDecoderFor {
                path: path.to_string(),
                type_name: ty.name(),
            });
        };
        let ConfigNode::Map(map) = node else {
            return Validated::invalid(ValidationError::DecodingExpectedNodeType {
                path: path.to_string(),
                expected: NodeKind::Map,
                actual: node.kind(),
                decoder: self.name(),
            });
        };

        let component = (shape.component)();
        let mut builder = (shape.builder)();
        let mut errors = Vec::new();
        for (key, entry) in map.iter() {
            let entry_path = key_path(path, key);
            let (value, entry_errors) = ctx
                .registry
                .decode_node(&entry_path, entry, &component, ctx.config)
                .into_parts();
            errors.extend(entry_errors);
            if let Some(value) = value {
                if !builder.insert(key.to_string(), value) {
                    errors.push(ValidationError::InternalDecoderMismatch {
                        path: entry_path,
                        decoder: self.name().to_string(),
                        type_name: component.name(),
                    });
                }
            }
        }
        Validated::of(Some(builder.finish()), errors)
    }
}
