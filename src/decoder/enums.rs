//! Enum decoding by case-insensitive variant name.

use std::any::Any;

use crate::error::ValidationError;
use crate::node::ConfigNode;
use crate::reflect::{TypeInfo, TypeKind};
use crate::validated::Validated;

use super::leaf::require_leaf_value;
use super::{Decoder, DecoderContext};

/// Decodes any captured enum by matching the leaf value against the
/// variant names, ignoring case.
pub struct EnumDecoder;

impl Decoder for EnumDecoder {
    fn name(&self) -> &'static str {
        "Enum"
    }

    fn matches(&self, ty: &TypeInfo) -> bool {
        matches!(ty.kind(), TypeKind::Enum(_))
    }

    fn decode(
        &self,
        path: &str,
        node: &ConfigNode,
        ty: &TypeInfo,
        _ctx: &DecoderContext<'_>,
    ) -> Validated<Box<dyn Any>> {
        let TypeKind::Enum(shape) = ty.kind() else {
            return Validated::invalid(ValidationError::NoDecoderFor {
                path: path.to_string(),
                type_name: ty.name(),
            });
        };
        let value = match require_leaf_value(path, node, self.name()) {
            Ok(value) => value,
            Err(error) => return Validated::invalid(error),
        };
        let wanted = value.trim();
        match shape
            .variants
            .iter()
            .position(|variant| variant.eq_ignore_ascii_case(wanted))
        {
            Some(index) => Validated::valid((shape.construct)(index)),
            None => Validated::invalid(ValidationError::DecodingEnumValueNotFound {
                path: path.to_string(),
                value,
                type_name: ty.name(),
            }),
        }
    }
}
