//! Unit tests for the processor chain, substitution, and temporary
//! secrets.

use std::sync::Arc;

use crate::config::GestaltConfig;
use crate::error::{ValidationError, ValidationLevel};
use crate::lexer::PathLexer;
use crate::node::ConfigNode;
use crate::secret::SecretChecker;
use crate::validated::Validated;

use super::{
    process_tree, MapTransform, PostProcessor, ProcessorContext, SubstitutionProcessor,
    TemporarySecretProcessor,
};

fn substitution(config: &GestaltConfig) -> Arc<dyn PostProcessor> {
    Arc::new(
        SubstitutionProcessor::new(config, SubstitutionProcessor::default_transforms())
            .expect("default substitution settings are valid"),
    )
}

fn run(tree: &ConfigNode, processors: &[Arc<dyn PostProcessor>]) -> Validated<ConfigNode> {
    let config = GestaltConfig::default();
    process_tree(tree, processors, &PathLexer::new(), &config)
}

fn leaf_at<'t>(tree: &'t ConfigNode, key: &str) -> Option<String> {
    tree.get_key(key).and_then(ConfigNode::value)
}

#[test]
fn env_substitution_with_default_falls_back() {
    let config = GestaltConfig::default();
    let tree = ConfigNode::map([(
        "home",
        ConfigNode::leaf("${env:GESTALT_TEST_UNSET_HOME:=/tmp}"),
    )]);
    let result = run(&tree, &[substitution(&config)]);
    assert!(matches!(
        &result.errors()[0],
        ValidationError::SubstitutionMissingKey { level: ValidationLevel::MissingOptionalValue, .. }
    ));
    let tree = result.into_value().unwrap();
    assert_eq!(leaf_at(&tree, "home").as_deref(), Some("/tmp"));
}

#[test]
fn env_substitution_reads_the_environment() {
    std::env::set_var("GESTALT_TEST_REGION", "eu-west-1");
    let config = GestaltConfig::default();
    let tree = ConfigNode::map([("region", ConfigNode::leaf("${env:GESTALT_TEST_REGION}"))]);
    let result = run(&tree, &[substitution(&config)]);
    assert!(!result.has_errors());
    let tree = result.into_value().unwrap();
    assert_eq!(leaf_at(&tree, "region").as_deref(), Some("eu-west-1"));
}

#[test]
fn node_transform_is_the_default() {
    let config = GestaltConfig::default();
    let tree = ConfigNode::map([
        ("host", ConfigNode::leaf("db.internal")),
        ("url", ConfigNode::leaf("https://${host}/api")),
    ]);
    let result = run(&tree, &[substitution(&config)]);
    assert!(!result.has_errors());
    let tree = result.into_value().unwrap();
    assert_eq!(
        leaf_at(&tree, "url").as_deref(),
        Some("https://db.internal/api")
    );
}

#[test]
fn nested_substitution_resolves_across_passes() {
    let config = GestaltConfig::default();
    let tree = ConfigNode::map([
        ("a", ConfigNode::leaf("${b}")),
        ("b", ConfigNode::leaf("${c}")),
        ("c", ConfigNode::leaf("x")),
    ]);
    let result = run(&tree, &[substitution(&config)]);
    assert!(!result.has_errors());
    let tree = result.into_value().unwrap();
    assert_eq!(leaf_at(&tree, "a").as_deref(), Some("x"));
    assert_eq!(leaf_at(&tree, "b").as_deref(), Some("x"));
}

#[test]
fn inner_expression_resolves_before_outer() {
    let config = GestaltConfig::default();
    let tree = ConfigNode::map([
        ("suffix", ConfigNode::leaf("host")),
        ("db", ConfigNode::map([("host", ConfigNode::leaf("db.internal"))])),
        ("target", ConfigNode::leaf("${db.${suffix}}")),
    ]);
    let result = run(&tree, &[substitution(&config)]);
    let tree = result.into_value().unwrap();
    assert_eq!(leaf_at(&tree, "target").as_deref(), Some("db.internal"));
}

#[test]
fn substitution_cycle_is_detected() {
    let config = GestaltConfig::default();
    let tree = ConfigNode::map([
        ("a", ConfigNode::leaf("${b}")),
        ("b", ConfigNode::leaf("${a}")),
    ]);
    let result = run(&tree, &[substitution(&config)]);
    assert!(result
        .errors()
        .iter()
        .any(|error| matches!(error, ValidationError::SubstitutionCycle { .. })));
}

#[test]
fn repeated_key_in_one_leaf_is_not_a_cycle() {
    let config = GestaltConfig::default();
    let tree = ConfigNode::map([
        ("name", ConfigNode::leaf("gestalt")),
        ("banner", ConfigNode::leaf("${name} ${name}")),
    ]);
    let result = run(&tree, &[substitution(&config)]);
    assert!(!result.has_errors());
    let tree = result.into_value().unwrap();
    assert_eq!(leaf_at(&tree, "banner").as_deref(), Some("gestalt gestalt"));
}

#[test]
fn recursion_limit_bounds_expansion() {
    let mut config = GestaltConfig::default();
    config.max_substitution_nested_depth = 2;
    let tree = ConfigNode::map([
        ("a", ConfigNode::leaf("${b}")),
        ("b", ConfigNode::leaf("${c}")),
        ("c", ConfigNode::leaf("${d}")),
        ("d", ConfigNode::leaf("deep")),
    ]);
    let result = run(&tree, &[substitution(&config)]);
    assert!(result
        .errors()
        .iter()
        .any(|error| matches!(error, ValidationError::SubstitutionRecursionLimit { .. })));
}

#[test]
fn missing_key_without_default_is_left_unresolved() {
    let config = GestaltConfig::default();
    let tree = ConfigNode::map([("value", ConfigNode::leaf("${nowhere}"))]);
    let result = run(&tree, &[substitution(&config)]);
    assert!(matches!(
        &result.errors()[0],
        ValidationError::SubstitutionMissingKey { level: ValidationLevel::MissingValue, .. }
    ));
    let tree = result.into_value().unwrap();
    assert_eq!(leaf_at(&tree, "value").as_deref(), Some("${nowhere}"));
}

#[test]
fn map_transform_resolves_registered_entries() {
    let config = GestaltConfig::default();
    let mut transforms = SubstitutionProcessor::default_transforms();
    transforms.push(Arc::new(MapTransform::new([(
        "version".to_string(),
        "1.2.3".to_string(),
    )])));
    let processor: Arc<dyn PostProcessor> =
        Arc::new(SubstitutionProcessor::new(&config, transforms).unwrap());
    let tree = ConfigNode::map([("release", ConfigNode::leaf("v${map:version}"))]);
    let result = run(&tree, &[processor]);
    let tree = result.into_value().unwrap();
    assert_eq!(leaf_at(&tree, "release").as_deref(), Some("v1.2.3"));
}

#[test]
fn custom_tokens_and_regex_are_honoured() {
    let mut config = GestaltConfig::default();
    config.substitution_opening_token = "#{".to_string();
    let tree = ConfigNode::map([
        ("host", ConfigNode::leaf("db.internal")),
        ("url", ConfigNode::leaf("#{host}")),
    ]);
    let result = run(&tree, &[substitution(&config)]);
    let tree = result.into_value().unwrap();
    assert_eq!(leaf_at(&tree, "url").as_deref(), Some("db.internal"));
}

#[test]
fn bad_substitution_regex_fails_the_build() {
    let mut config = GestaltConfig::default();
    config.substitution_regex = "(".to_string();
    assert!(SubstitutionProcessor::new(&config, Vec::new()).is_err());

    config.substitution_regex = "^(?P<nokey>.*)$".to_string();
    assert!(SubstitutionProcessor::new(&config, Vec::new()).is_err());
}

#[test]
fn temporary_secret_wraps_matching_leaves() {
    let checker = SecretChecker::new(["password"]).unwrap();
    let processor: Arc<dyn PostProcessor> =
        Arc::new(TemporarySecretProcessor::new(vec![(checker, 2)]));
    let tree = ConfigNode::map([
        ("password", ConfigNode::leaf("hunter2")),
        ("port", ConfigNode::leaf("5432")),
    ]);
    let processed = run(&tree, &[processor]).into_value().unwrap();

    let secret = processed.get_key("password").unwrap();
    assert_eq!(secret.value().as_deref(), Some("hunter2"));
    assert_eq!(secret.value().as_deref(), Some("hunter2"));
    assert_eq!(secret.value(), None);

    // Untouched leaves stay plain.
    let port = processed.get_key("port").unwrap();
    assert_eq!(port.value().as_deref(), Some("5432"));
    assert_eq!(port.value().as_deref(), Some("5432"));
    assert_eq!(port.value().as_deref(), Some("5432"));
}

#[test]
fn substitution_runs_before_secret_wrapping() {
    let config = GestaltConfig::default();
    let checker = SecretChecker::new(["token"]).unwrap();
    let wrap: Arc<dyn PostProcessor> = Arc::new(TemporarySecretProcessor::new(vec![(checker, 1)]));
    let tree = ConfigNode::map([
        ("raw", ConfigNode::leaf("s3cret")),
        ("token", ConfigNode::leaf("${raw}")),
    ]);
    // Registration order is irrelevant; priority decides.
    let processed = run(&tree, &[wrap, substitution(&config)]).into_value().unwrap();
    let token = processed.get_key("token").unwrap();
    assert_eq!(token.value().as_deref(), Some("s3cret"));
    assert_eq!(token.value(), None);
}

struct UppercaseProcessor;

impl PostProcessor for UppercaseProcessor {
    fn name(&self) -> &'static str {
        "Uppercase"
    }

    fn process(
        &self,
        _path: &str,
        node: &ConfigNode,
        _ctx: &ProcessorContext<'_>,
    ) -> Validated<ConfigNode> {
        match node.value() {
            Some(value) => Validated::valid(ConfigNode::leaf(value.to_uppercase())),
            None => Validated::valid(node.clone()),
        }
    }
}

#[test]
fn processors_rewrite_depth_first() {
    let tree = ConfigNode::map([(
        "outer",
        ConfigNode::map([("inner", ConfigNode::leaf("abc"))]),
    )]);
    let processed = run(&tree, &[Arc::new(UppercaseProcessor)]).into_value().unwrap();
    let inner = processed
        .get_key("outer")
        .and_then(|outer| outer.get_key("inner"))
        .and_then(ConfigNode::value);
    assert_eq!(inner.as_deref(), Some("ABC"));
}
