//! Unit tests for decoder dispatch and the bundled decoders.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;

use super::{default_decoders, Decoder, DecoderContext, DecoderRegistry, Priority};
use crate::config::GestaltConfig;
use crate::error::{ValidationError, ValidationLevel};
use crate::lexer::PathLexer;
use crate::node::ConfigNode;
use crate::path::{SnakeCasePathMapper, StandardPathMapper};
use crate::reflect::{ConfigType, EnumShape, ObjectField, ObjectShape, TypeInfo};
use crate::validated::Validated;

fn registry() -> DecoderRegistry {
    DecoderRegistry::new(
        default_decoders(),
        PathLexer::new(),
        vec![Arc::new(StandardPathMapper), Arc::new(SnakeCasePathMapper)],
    )
    .expect("default registry builds")
}

fn config() -> GestaltConfig {
    GestaltConfig::default()
}

#[test]
fn char_too_long_keeps_first_and_warns() {
    let result = registry().decode::<char>("db.port", &ConfigNode::leaf("aaa"), &config());
    assert_eq!(result.value(), Some(&'a'));
    assert_eq!(result.errors().len(), 1);
    assert!(matches!(
        &result.errors()[0],
        ValidationError::DecodingCharWrongSize { level: ValidationLevel::Warn, .. }
    ));
    assert!(result.errors()[0].to_string().contains("received the wrong size"));
}

#[test]
fn char_empty_is_an_error_with_no_result() {
    let result = registry().decode::<char>("db.port", &ConfigNode::leaf(""), &config());
    assert!(!result.has_results());
    assert_eq!(result.errors().len(), 1);
    assert!(matches!(
        &result.errors()[0],
        ValidationError::DecodingCharWrongSize { level: ValidationLevel::Error, .. }
    ));
}

#[test]
fn comma_separated_leaf_decodes_as_array() {
    let result = registry().decode::<Vec<i64>>("xs", &ConfigNode::leaf("1, 2 ,3"), &config());
    assert!(!result.has_errors());
    assert_eq!(result.into_value().unwrap(), vec![1, 2, 3]);
}

#[test]
fn array_node_decodes_element_wise() {
    let node = ConfigNode::array([
        ConfigNode::leaf("10"),
        ConfigNode::leaf("20"),
        ConfigNode::leaf("30"),
    ]);
    let result = registry().decode::<Vec<u8>>("xs", &node, &config());
    assert_eq!(result.into_value().unwrap(), vec![10, 20, 30]);
}

#[test]
fn sparse_array_records_missing_index() {
    let node = ConfigNode::sparse_array(vec![Some(ConfigNode::leaf("1")), None, Some(ConfigNode::leaf("3"))]);
    let result = registry().decode::<Vec<i32>>("xs", &node, &config());
    assert_eq!(result.value(), Some(&vec![1, 3]));
    assert!(matches!(
        &result.errors()[0],
        ValidationError::ArrayMissingIndex { index: 1, level: ValidationLevel::Warn, .. }
    ));

    let mut strict = config();
    strict.treat_missing_array_index_as_error = true;
    let result = registry().decode::<Vec<i32>>("xs", &node, &strict);
    assert!(matches!(
        &result.errors()[0],
        ValidationError::ArrayMissingIndex { level: ValidationLevel::Error, .. }
    ));
}

#[test]
fn duration_from_integer_is_milliseconds() {
    let result = registry().decode::<Duration>("timeout", &ConfigNode::leaf("500"), &config());
    assert_eq!(result.into_value().unwrap(), Duration::from_millis(500));
}

#[rstest]
#[case("PT1M30S", Duration::from_secs(90))]
#[case("PT0.5S", Duration::from_millis(500))]
#[case("P1DT1H", Duration::from_secs(90_000))]
#[case("pt2h", Duration::from_secs(7200))]
fn duration_iso_patterns(#[case] text: &str, #[case] expected: Duration) {
    let result = registry().decode::<Duration>("timeout", &ConfigNode::leaf(text), &config());
    assert_eq!(result.into_value(), Some(expected));
}

#[test]
fn duration_rejects_garbage() {
    let result = registry().decode::<Duration>("timeout", &ConfigNode::leaf("soon"), &config());
    assert!(matches!(
        &result.errors()[0],
        ValidationError::DecodingNumberParsing { .. }
    ));
}

#[test]
fn integer_overflow_is_a_range_error() {
    let result = registry().decode::<u8>("n", &ConfigNode::leaf("300"), &config());
    assert!(!result.has_results());
    assert!(matches!(
        &result.errors()[0],
        ValidationError::DecodingNumberRange { .. }
    ));
}

#[rstest]
#[case("true", true)]
#[case("YES", true)]
#[case("1", true)]
#[case("False", false)]
#[case("no", false)]
#[case("0", false)]
fn bool_spellings(#[case] text: &str, #[case] expected: bool) {
    let result = registry().decode::<bool>("flag", &ConfigNode::leaf(text), &config());
    assert_eq!(result.into_value(), Some(expected));
}

#[derive(Debug, Clone, PartialEq)]
enum LogFormat {
    Plain,
    Json,
}

impl ConfigType for LogFormat {
    fn capture() -> TypeInfo {
        TypeInfo::enumeration::<Self>(EnumShape {
            variants: &["Plain", "Json"],
            construct: |index| match index {
                0 => Box::new(LogFormat::Plain),
                _ => Box::new(LogFormat::Json),
            },
        })
    }
}

#[test]
fn enum_matches_variant_name_case_insensitively() {
    let result = registry().decode::<LogFormat>("format", &ConfigNode::leaf("json"), &config());
    assert_eq!(result.into_value(), Some(LogFormat::Json));

    let result = registry().decode::<LogFormat>("format", &ConfigNode::leaf("xml"), &config());
    assert!(matches!(
        &result.errors()[0],
        ValidationError::DecodingEnumValueNotFound { .. }
    ));
}

#[test]
fn map_decoder_walks_entries() {
    let node = ConfigNode::map([
        ("alpha", ConfigNode::leaf("1")),
        ("beta", ConfigNode::leaf("2")),
    ]);
    let result = registry().decode::<HashMap<String, i32>>("weights", &node, &config());
    let map = result.into_value().unwrap();
    assert_eq!(map.get("alpha"), Some(&1));
    assert_eq!(map.get("beta"), Some(&2));
}

#[derive(Debug, PartialEq)]
struct PoolSettings {
    size: u32,
    label: Option<String>,
    max_retries: i64,
}

impl ConfigType for PoolSettings {
    fn capture() -> TypeInfo {
        const FIELDS: &[ObjectField] = &[
            ObjectField::new("size", TypeInfo::of::<u32>),
            ObjectField::new("label", TypeInfo::of::<Option<String>>),
            ObjectField::new("maxRetries", TypeInfo::of::<i64>),
        ];
        TypeInfo::object::<Self>(ObjectShape {
            fields: FIELDS,
            assemble: |bag| {
                Some(Box::new(PoolSettings {
                    size: bag.take::<u32>("size")?,
                    label: bag.take::<Option<String>>("label").unwrap_or(None),
                    max_retries: bag.take::<i64>("maxRetries")?,
                }) as Box<dyn Any>)
            },
        })
    }
}

#[test]
fn object_decodes_fields_through_path_mappers() {
    // The camelCase field finds the snake_case key via the mapper chain.
    let node = ConfigNode::map([
        ("size", ConfigNode::leaf("8")),
        ("max_retries", ConfigNode::leaf("3")),
    ]);
    let result = registry().decode::<PoolSettings>("pool", &node, &config());
    let settings = result.into_value().unwrap();
    assert_eq!(settings.size, 8);
    assert_eq!(settings.label, None);
    assert_eq!(settings.max_retries, 3);
}

#[test]
fn object_missing_required_field_yields_no_result() {
    let node = ConfigNode::map([("size", ConfigNode::leaf("8"))]);
    let result = registry().decode::<PoolSettings>("pool", &node, &config());
    assert!(!result.has_results());
    // Default policy keeps the miss at the accepted level so defaults can
    // still cover it.
    assert!(result
        .errors()
        .iter()
        .all(|error| error.level() <= ValidationLevel::MissingOptionalValue));

    let mut strict = config();
    strict.treat_missing_values_as_errors = true;
    let result = registry().decode::<PoolSettings>("pool", &node, &strict);
    assert!(result
        .errors()
        .iter()
        .any(|error| error.level() == ValidationLevel::MissingValue));
}

#[test]
fn optional_decodes_present_value() {
    let result = registry().decode::<Option<u16>>("port", &ConfigNode::leaf("80"), &config());
    assert_eq!(result.into_value(), Some(Some(80)));
}

#[test]
fn optional_empty_leaf_is_none_with_optional_level() {
    let result = registry().decode::<Option<u16>>("port", &ConfigNode::empty_leaf(), &config());
    assert_eq!(result.value(), Some(&None));
    assert!(matches!(
        &result.errors()[0],
        ValidationError::NoResultsFoundForNode { level: ValidationLevel::MissingOptionalValue, .. }
    ));
}

struct FixedStringDecoder;

impl Decoder for FixedStringDecoder {
    fn name(&self) -> &'static str {
        "FixedString"
    }

    fn priority(&self) -> Priority {
        Priority::High
    }

    fn matches(&self, ty: &TypeInfo) -> bool {
        ty.is::<String>()
    }

    fn decode(
        &self,
        _path: &str,
        _node: &ConfigNode,
        _ty: &TypeInfo,
        _ctx: &DecoderContext<'_>,
    ) -> Validated<Box<dyn Any>> {
        Validated::valid(Box::new(String::from("override")))
    }
}

#[test]
fn higher_priority_decoder_wins() {
    let mut registry = registry();
    registry.add_decoders(vec![Arc::new(FixedStringDecoder)]);
    let result = registry.decode::<String>("any", &ConfigNode::leaf("original"), &config());
    assert_eq!(result.into_value().as_deref(), Some("override"));
}

#[test]
fn override_applies_recursively_through_composites() {
    let mut registry = registry();
    registry.add_decoders(vec![Arc::new(FixedStringDecoder)]);
    let node = ConfigNode::array([ConfigNode::leaf("a"), ConfigNode::leaf("b")]);
    let result = registry.decode::<Vec<String>>("xs", &node, &config());
    assert_eq!(
        result.into_value().unwrap(),
        vec!["override".to_string(), "override".to_string()]
    );
}

#[test]
fn unknown_type_reports_no_decoder() {
    struct Opaque;
    impl ConfigType for Opaque {
        fn capture() -> TypeInfo {
            TypeInfo::scalar::<Self>()
        }
    }
    let result = registry().decode::<Opaque>("x", &ConfigNode::leaf("1"), &config());
    assert!(matches!(
        &result.errors()[0],
        ValidationError::NoDecoderFor { .. }
    ));
}

#[test]
fn set_decoders_dedupes_by_name_and_priority() {
    let mut registry = registry();
    let count = registry.decoders().len();
    registry.set_decoders(default_decoders().into_iter().chain(default_decoders()).collect());
    assert_eq!(registry.decoders().len(), count);
}

#[test]
fn next_node_falls_through_the_mapper_chain() {
    let registry = registry();
    let node = ConfigNode::map([("max_retries", ConfigNode::leaf("3"))]);
    let found = registry.next_node("pool", "maxRetries", &node);
    assert!(found.has_results());

    let missing = registry.next_node("pool", "maxBackoff", &node);
    assert!(!missing.has_results());
    // Both mappers' misses are concatenated.
    assert!(missing.errors().len() >= 2);
}
