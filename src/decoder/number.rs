//! Numeric leaf decoders with overflow detection.

use std::any::Any;
use std::marker::PhantomData;
use std::num::IntErrorKind;

use crate::error::ValidationError;
use crate::node::ConfigNode;
use crate::reflect::{ConfigType, TypeInfo};
use crate::validated::Validated;

use super::leaf::require_leaf_value;
use super::{Decoder, DecoderContext};

pub(crate) enum NumberError {
    /// The text is not a number at all.
    Syntax,
    /// The text is a number but does not fit the target type.
    Range,
}

/// Numeric types the generic [`NumberDecoder`] can produce.
pub(crate) trait DecodableNumber: ConfigType + Send + Sync {
    const NAME: &'static str;

    fn parse(text: &str) -> Result<Self, NumberError>;
}

macro_rules! integer_number {
    ($($ty:ty => $name:literal),+ $(,)?) => {
        $(
            impl DecodableNumber for $ty {
                const NAME: &'static str = $name;

                fn parse(text: &str) -> Result<Self, NumberError> {
                    text.parse::<$ty>().map_err(|e| match e.kind() {
                        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                            NumberError::Range
                        }
                        _ => NumberError::Syntax,
                    })
                }
            }
        )+
    };
}

integer_number!(
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
);

macro_rules! float_number {
    ($($ty:ty => $name:literal),+ $(,)?) => {
        $(
            impl DecodableNumber for $ty {
                const NAME: &'static str = $name;

                fn parse(text: &str) -> Result<Self, NumberError> {
                    let parsed = text.parse::<$ty>().map_err(|_| NumberError::Syntax)?;
                    // Finite input text overflowing to infinity is a range
                    // failure, not a syntax one.
                    if parsed.is_infinite() && !text.trim().trim_start_matches(['+', '-']).eq_ignore_ascii_case("inf")
                        && !text.trim().trim_start_matches(['+', '-']).eq_ignore_ascii_case("infinity")
                    {
                        return Err(NumberError::Range);
                    }
                    Ok(parsed)
                }
            }
        )+
    };
}

float_number!(f32 => "f32", f64 => "f64");

/// Decodes an integer or float leaf, distinguishing unparsable text from
/// out-of-range values.
pub struct NumberDecoder<T> {
    _marker: PhantomData<T>,
}

impl<T> NumberDecoder<T> {
    /// Decoder for one numeric type.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for NumberDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DecodableNumber + Any> Decoder for NumberDecoder<T> {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn matches(&self, ty: &TypeInfo) -> bool {
        ty.is::<T>()
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
        match T::parse(value.trim()) {
            Ok(number) => Validated::valid(Box::new(number)),
            Err(NumberError::Syntax) => {
                Validated::invalid(ValidationError::DecodingNumberParsing {
                    path: path.to_string(),
                    value,
                    decoder: self.name(),
                })
            }
            Err(NumberError::Range) => Validated::invalid(ValidationError::DecodingNumberRange {
                path: path.to_string(),
                value,
                decoder: self.name(),
            }),
        }
    }
}
