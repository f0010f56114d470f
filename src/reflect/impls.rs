//! Blanket [`ConfigType`] descriptions for scalars and std containers.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use super::{
    ArrayShape, ConfigType, MapShape, MappingBuilder, OptionalShape, SequenceBuilder, TypeInfo,
};

macro_rules! scalar_config_type {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ConfigType for $ty {
                fn capture() -> TypeInfo {
                    TypeInfo::scalar::<$ty>()
                }
            }
        )+
    };
}

scalar_config_type!(
    bool, char, String, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, Uuid, Duration, NaiveDate,
    NaiveDateTime, PathBuf, Utf8PathBuf,
);

impl ConfigType for DateTime<Utc> {
    fn capture() -> TypeInfo {
        TypeInfo::scalar::<Self>()
    }
}

struct VecBuilder<T> {
    items: Vec<T>,
}

impl<T: Any> SequenceBuilder for VecBuilder<T> {
    fn push(&mut self, value: Box<dyn Any>) -> bool {
        match value.downcast::<T>() {
            Ok(item) => {
                self.items.push(*item);
                true
            }
            Err(_) => false,
        }
    }

    fn finish(self: Box<Self>) -> Box<dyn Any> {
        Box::new(self.items)
    }
}

/// Fresh erased builder producing a `Vec<T>`.
#[must_use]
pub fn make_vec_builder<T: Any>() -> Box<dyn SequenceBuilder> {
    Box::new(VecBuilder::<T> { items: Vec::new() })
}

struct HashMapBuilder<V> {
    entries: HashMap<String, V>,
}

impl<V: Any> MappingBuilder for HashMapBuilder<V> {
    fn insert(&mut self, key: String, value: Box<dyn Any>) -> bool {
        match value.downcast::<V>() {
            Ok(item) => {
                self.entries.insert(key, *item);
                true
            }
            Err(_) => false,
        }
    }

    fn finish(self: Box<Self>) -> Box<dyn Any> {
        Box::new(self.entries)
    }
}

/// Fresh erased builder producing a `HashMap<String, V>`.
#[must_use]
pub fn make_hash_map_builder<V: Any>() -> Box<dyn MappingBuilder> {
    Box::new(HashMapBuilder::<V> {
        entries: HashMap::new(),
    })
}

struct BTreeMapBuilder<V> {
    entries: BTreeMap<String, V>,
}

impl<V: Any> MappingBuilder for BTreeMapBuilder<V> {
    fn insert(&mut self, key: String, value: Box<dyn Any>) -> bool {
        match value.downcast::<V>() {
            Ok(item) => {
                self.entries.insert(key, *item);
                true
            }
            Err(_) => false,
        }
    }

    fn finish(self: Box<Self>) -> Box<dyn Any> {
        Box::new(self.entries)
    }
}

/// Fresh erased builder producing a `BTreeMap<String, V>`.
#[must_use]
pub fn make_btree_map_builder<V: Any>() -> Box<dyn MappingBuilder> {
    Box::new(BTreeMapBuilder::<V> {
        entries: BTreeMap::new(),
    })
}

/// Re-wrap an erased `T` as an erased `Some(T)`.
#[must_use]
pub fn wrap_some<T: Any>(value: Box<dyn Any>) -> Option<Box<dyn Any>> {
    value
        .downcast::<T>()
        .ok()
        .map(|inner| Box::new(Some(*inner)) as Box<dyn Any>)
}

/// The erased `None` of `Option<T>`.
#[must_use]
pub fn none_of<T: Any>() -> Box<dyn Any> {
    Box::new(None::<T>)
}

impl<T: ConfigType> ConfigType for Vec<T> {
    fn capture() -> TypeInfo {
        TypeInfo::array::<Self>(ArrayShape {
            component: T::capture,
            builder: make_vec_builder::<T>,
        })
    }
}

impl<T: ConfigType> ConfigType for Option<T> {
    fn capture() -> TypeInfo {
        TypeInfo::optional::<Self>(OptionalShape {
            component: T::capture,
            some: wrap_some::<T>,
            none: none_of::<T>,
        })
    }
}

impl<V: ConfigType> ConfigType for HashMap<String, V> {
    fn capture() -> TypeInfo {
        TypeInfo::mapping::<Self>(MapShape {
            component: V::capture,
            builder: make_hash_map_builder::<V>,
        })
    }
}

impl<V: ConfigType> ConfigType for BTreeMap<String, V> {
    fn capture() -> TypeInfo {
        TypeInfo::mapping::<Self>(MapShape {
            component: V::capture,
            builder: make_btree_map_builder::<V>,
        })
    }
}
