//! Runtime type capture for decoder dispatch.
//!
//! Rust has no runtime reflection, so every decodable type describes
//! itself: its identity, and for composites the component captures plus
//! type-erased assembly hooks. Scalars, `Vec`, `Option`, and the std maps
//! come with blanket descriptions; object types supply a hand-written one
//! (field list plus an assembly function) via [`ConfigType`].

mod impls;

pub use impls::{
    make_btree_map_builder, make_hash_map_builder, make_vec_builder, none_of, wrap_some,
};

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Trait implemented by every type the decoder pipeline can produce.
pub trait ConfigType: Any + Sized {
    /// Describe this type to the decoder registry.
    fn capture() -> TypeInfo;
}

/// Runtime description of a decodable type.
#[derive(Clone)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    kind: TypeKind,
}

impl TypeInfo {
    /// The capture for `T`.
    #[must_use]
    pub fn of<T: ConfigType>() -> Self {
        T::capture()
    }

    /// A scalar (leaf-decoded) type.
    #[must_use]
    pub fn scalar<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind: TypeKind::Scalar,
        }
    }

    /// A sequence type assembled from decoded components.
    #[must_use]
    pub fn array<T: Any>(shape: ArrayShape) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind: TypeKind::Array(shape),
        }
    }

    /// A string-keyed mapping type.
    #[must_use]
    pub fn mapping<T: Any>(shape: MapShape) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind: TypeKind::Map(shape),
        }
    }

    /// An optional wrapper around another capture.
    #[must_use]
    pub fn optional<T: Any>(shape: OptionalShape) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind: TypeKind::Optional(shape),
        }
    }

    /// A unit-variant enumeration matched by variant name.
    #[must_use]
    pub fn enumeration<T: Any>(shape: EnumShape) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind: TypeKind::Enum(shape),
        }
    }

    /// An object (struct) described field by field.
    #[must_use]
    pub fn object<T: Any>(shape: ObjectShape) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            kind: TypeKind::Object(shape),
        }
    }

    /// Whether this capture describes `T` exactly.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// The described type's `TypeId`.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The described type's name, for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Structural kind of the described type.
    #[must_use]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo").field("name", &self.name).finish()
    }
}

/// Structural kind of a capture, with the erased assembly hooks the
/// composite decoders need.
#[derive(Clone)]
pub enum TypeKind {
    /// Decoded from a single leaf value.
    Scalar,
    /// A sequence of components.
    Array(ArrayShape),
    /// A string-keyed mapping of components.
    Map(MapShape),
    /// `Option`-like wrapper.
    Optional(OptionalShape),
    /// Unit-variant enum matched by name.
    Enum(EnumShape),
    /// Struct with named fields.
    Object(ObjectShape),
}

/// Shape of a sequence type.
#[derive(Clone, Copy)]
pub struct ArrayShape {
    /// Capture of the component type.
    pub component: fn() -> TypeInfo,
    /// Fresh type-erased builder for the sequence.
    pub builder: fn() -> Box<dyn SequenceBuilder>,
}

/// Shape of a string-keyed mapping type.
#[derive(Clone, Copy)]
pub struct MapShape {
    /// Capture of the value component type.
    pub component: fn() -> TypeInfo,
    /// Fresh type-erased builder for the mapping.
    pub builder: fn() -> Box<dyn MappingBuilder>,
}

/// Shape of an optional wrapper.
#[derive(Clone, Copy)]
pub struct OptionalShape {
    /// Capture of the wrapped type.
    pub component: fn() -> TypeInfo,
    /// Re-wrap a decoded component as `Some`; `None` if the component is
    /// of the wrong runtime type.
    pub some: fn(Box<dyn Any>) -> Option<Box<dyn Any>>,
    /// The `None` value of the wrapper.
    pub none: fn() -> Box<dyn Any>,
}

/// Shape of a unit-variant enum.
#[derive(Clone, Copy)]
pub struct EnumShape {
    /// Variant names, in declaration order.
    pub variants: &'static [&'static str],
    /// Construct the variant at the given index.
    pub construct: fn(usize) -> Box<dyn Any>,
}

/// Shape of an object type.
#[derive(Clone, Copy)]
pub struct ObjectShape {
    /// Declared fields, in declaration order.
    pub fields: &'static [ObjectField],
    /// Assemble the object from the decoded field bag; `None` when a
    /// required field is absent.
    pub assemble: fn(&mut FieldBag) -> Option<Box<dyn Any>>,
}

/// One declared field of an object type.
#[derive(Clone, Copy)]
pub struct ObjectField {
    /// Field name as declared on the type.
    pub name: &'static str,
    /// Capture of the field's type.
    pub capture: fn() -> TypeInfo,
}

impl ObjectField {
    /// Describe a field.
    #[must_use]
    pub const fn new(name: &'static str, capture: fn() -> TypeInfo) -> Self {
        Self { name, capture }
    }
}

/// Builds a sequence from type-erased components.
pub trait SequenceBuilder {
    /// Append a component; `false` if it is of the wrong runtime type.
    fn push(&mut self, value: Box<dyn Any>) -> bool;
    /// Finish, yielding the erased sequence.
    fn finish(self: Box<Self>) -> Box<dyn Any>;
}

/// Builds a string-keyed mapping from type-erased components.
pub trait MappingBuilder {
    /// Insert an entry; `false` if the value is of the wrong runtime type.
    fn insert(&mut self, key: String, value: Box<dyn Any>) -> bool;
    /// Finish, yielding the erased mapping.
    fn finish(self: Box<Self>) -> Box<dyn Any>;
}

/// Decoded field values handed to an object's assembly function.
#[derive(Default)]
pub struct FieldBag {
    values: HashMap<&'static str, Box<dyn Any>>,
}

impl FieldBag {
    /// Empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a decoded field value.
    pub fn put(&mut self, name: &'static str, value: Box<dyn Any>) {
        self.values.insert(name, value);
    }

    /// Whether a value was stored for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Remove and downcast the value stored for `name`.
    #[must_use]
    pub fn take<T: Any>(&mut self, name: &str) -> Option<T> {
        let value = self.values.remove(name)?;
        value.downcast::<T>().ok().map(|boxed| *boxed)
    }
}

#[cfg(test)]
mod tests;
