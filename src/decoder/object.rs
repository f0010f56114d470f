//! Object decoding driven by captured field descriptions.

use std::any::Any;

use tracing::debug;

use crate::error::{ValidationError, ValidationLevel};
use crate::node::{ConfigNode, NodeKind};
use crate::reflect::{FieldBag, TypeInfo, TypeKind};
use crate::validated::Validated;

use super::{key_path, Decoder, DecoderContext};

/// Decodes any captured object type field by field.
///
/// Each field is resolved with the registry's path mappers (so a
/// camelCase field finds a snake_case key), then decoded recursively as
/// the field's captured type. Optional fields absorb misses as `None`;
/// required misses are recorded at a level driven by
/// `treat_missing_values_as_errors`.
pub struct ObjectDecoder;

impl ObjectDecoder {
    fn record_missing_field(
        path: &str,
        field: &'static str,
        nav_errors: Vec<ValidationError>,
        errors: &mut Vec<ValidationError>,
        ctx: &DecoderContext<'_>,
    ) {
        if ctx.config.treat_missing_values_as_errors {
            errors.extend(nav_errors);
        } else {
            // The miss is tolerated when a default or optional read covers
            // it, so record it at the configured accepted-missing level.
            debug!(path, field, "missing value for object field");
            let level = ctx
                .config
                .log_level_for_missing_values_when_default_or_optional;
            errors.push(ValidationError::NoResultsFoundForNode {
                path: key_path(path, field),
                missing: field.to_string(),
                level,
            });
        }
    }
}

impl Decoder for ObjectDecoder {
    fn name(&self) -> &'static str {
        "Object"
    }

    fn matches(&self, ty: &TypeInfo) -> bool {
        matches!(ty.kind(), TypeKind::Object(_))
    }

    fn decode(
        &self,
        path: &str,
        node: &ConfigNode,
        ty: &TypeInfo,
        ctx: &DecoderContext<'_>,
    ) -> Validated<Box<dyn Any>> {
        let TypeKind::Object(shape) = ty.kind() else {
            return Validated::invalid(ValidationError::NoDecoderFor {
                path: path.to_string(),
                type_name: ty.name(),
            });
        };
        if node.kind() != NodeKind::Map {
            return Validated::invalid(ValidationError::DecodingExpectedNodeType {
                path: path.to_string(),
                expected: NodeKind::Map,
                actual: node.kind(),
                decoder: self.name(),
            });
        }

        let mut bag = FieldBag::new();
        let mut errors = Vec::new();
        for field in shape.fields {
            let field_info = (field.capture)();
            let field_path = key_path(path, field.name);
            let (found, nav_errors) = ctx.registry.next_node(path, field.name, node).into_parts();
            match found {
                Some(child) => {
                    let (value, decode_errors) = ctx
                        .registry
                        .decode_node(&field_path, child, &field_info, ctx.config)
                        .into_parts();
                    errors.extend(decode_errors);
                    match value {
                        Some(value) => bag.put(field.name, value),
                        None => {
                            let level = if ctx.config.treat_null_values_in_class_as_errors {
                                ValidationLevel::Error
                            } else {
                                ValidationLevel::Warn
                            };
                            errors.push(ValidationError::ObjectFieldNull {
                                path: path.to_string(),
                                field: field.name,
                                level,
                            });
                        }
                    }
                }
                None => {
                    if let TypeKind::Optional(optional) = field_info.kind() {
                        bag.put(field.name, (optional.none)());
                        debug!(path, field = field.name, "optional object field missing");
                        errors.push(ValidationError::NoResultsFoundForNode {
                            path: field_path,
                            missing: field.name.to_string(),
                            level: ctx
                                .config
                                .log_level_for_missing_values_when_default_or_optional,
                        });
                    } else {
                        Self::record_missing_field(path, field.name, nav_errors, &mut errors, ctx);
                    }
                }
            }
        }

        match (shape.assemble)(&mut bag) {
            Some(object) => Validated::of(Some(object), errors),
            None => {
                if errors.is_empty() {
                    errors.push(ValidationError::InternalDecoderMismatch {
                        path: path.to_string(),
                        decoder: self.name().to_string(),
                        type_name: ty.name(),
                    });
                }
                Validated::from_errors(errors)
            }
        }
    }
}
