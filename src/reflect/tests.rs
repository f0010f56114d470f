//! Unit tests for type captures and the erased builders.

use std::any::Any;
use std::collections::HashMap;

use super::{ConfigType, EnumShape, FieldBag, ObjectField, ObjectShape, TypeInfo, TypeKind};

#[test]
fn scalar_capture_identifies_the_type() {
    let info = TypeInfo::of::<u16>();
    assert!(info.is::<u16>());
    assert!(!info.is::<u32>());
    assert!(matches!(info.kind(), TypeKind::Scalar));
}

#[test]
fn vec_capture_knows_its_component() {
    let info = TypeInfo::of::<Vec<i64>>();
    let TypeKind::Array(shape) = info.kind() else {
        panic!("expected an array capture");
    };
    assert!((shape.component)().is::<i64>());

    let mut builder = (shape.builder)();
    assert!(builder.push(Box::new(1_i64)));
    assert!(!builder.push(Box::new("wrong type")));
    let finished = builder.finish();
    assert_eq!(*finished.downcast::<Vec<i64>>().unwrap(), vec![1]);
}

#[test]
fn option_capture_wraps_and_defaults() {
    let info = TypeInfo::of::<Option<String>>();
    let TypeKind::Optional(shape) = info.kind() else {
        panic!("expected an optional capture");
    };
    let wrapped = (shape.some)(Box::new(String::from("x"))).unwrap();
    assert_eq!(
        *wrapped.downcast::<Option<String>>().unwrap(),
        Some("x".into())
    );
    let none = (shape.none)();
    assert_eq!(*none.downcast::<Option<String>>().unwrap(), None);
}

#[test]
fn map_capture_builds_string_keyed_maps() {
    let info = TypeInfo::of::<HashMap<String, bool>>();
    let TypeKind::Map(shape) = info.kind() else {
        panic!("expected a map capture");
    };
    let mut builder = (shape.builder)();
    assert!(builder.insert("on".into(), Box::new(true)));
    let map = builder.finish().downcast::<HashMap<String, bool>>().unwrap();
    assert_eq!(map.get("on"), Some(&true));
}

#[derive(Debug, PartialEq)]
enum Mode {
    Active,
    Standby,
}

impl ConfigType for Mode {
    fn capture() -> TypeInfo {
        TypeInfo::enumeration::<Self>(EnumShape {
            variants: &["Active", "Standby"],
            construct: |index| match index {
                0 => Box::new(Mode::Active),
                _ => Box::new(Mode::Standby),
            },
        })
    }
}

#[test]
fn enum_capture_constructs_by_index() {
    let info = TypeInfo::of::<Mode>();
    let TypeKind::Enum(shape) = info.kind() else {
        panic!("expected an enum capture");
    };
    assert_eq!(shape.variants, &["Active", "Standby"]);
    let value = (shape.construct)(1);
    assert_eq!(*value.downcast::<Mode>().unwrap(), Mode::Standby);
}

#[derive(Debug, PartialEq)]
struct DbInfo {
    port: u16,
    host: Option<String>,
}

impl ConfigType for DbInfo {
    fn capture() -> TypeInfo {
        const FIELDS: &[ObjectField] = &[
            ObjectField::new("port", TypeInfo::of::<u16>),
            ObjectField::new("host", TypeInfo::of::<Option<String>>),
        ];
        TypeInfo::object::<Self>(ObjectShape {
            fields: FIELDS,
            assemble: |bag| {
                Some(Box::new(DbInfo {
                    port: bag.take::<u16>("port")?,
                    host: bag.take::<Option<String>>("host").unwrap_or(None),
                }) as Box<dyn Any>)
            },
        })
    }
}

#[test]
fn object_capture_assembles_from_a_field_bag() {
    let info = TypeInfo::of::<DbInfo>();
    let TypeKind::Object(shape) = info.kind() else {
        panic!("expected an object capture");
    };

    let mut bag = FieldBag::new();
    bag.put("port", Box::new(5432_u16));
    bag.put("host", Box::new(Some(String::from("db.internal"))));
    let assembled = (shape.assemble)(&mut bag).unwrap();
    assert_eq!(
        *assembled.downcast::<DbInfo>().unwrap(),
        DbInfo {
            port: 5432,
            host: Some("db.internal".into())
        }
    );

    // A required field left out of the bag aborts assembly.
    let mut missing = FieldBag::new();
    assert!((shape.assemble)(&mut missing).is_none());
}
