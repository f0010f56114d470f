//! Tunables shared by the decoders, the post-processors, and the core.

use crate::error::ValidationLevel;

/// Default grammar for the text between substitution tokens:
/// `(transform:)?key(:=default)?`, with named capture groups `transform`,
/// `key`, and `default`. Keys may not contain `:` or `=`, which keeps the
/// optional groups unambiguous.
pub const DEFAULT_SUBSTITUTION_REGEX: &str =
    r"^(?:(?P<transform>\w+):)?(?P<key>[^:=]+)(?::=(?P<default>.*))?$";

/// Policy flags and formats, set through the builder and read everywhere.
///
/// One instance is shared across the registry, decoders, and processors
/// for the lifetime of a `Gestalt`.
#[derive(Debug, Clone)]
pub struct GestaltConfig {
    /// Promote any WARN on a read to a failure.
    pub treat_warnings_as_errors: bool,
    /// Fail reads over sparse arrays with absent slots.
    pub treat_missing_array_index_as_error: bool,
    /// Fail object decoding when a non-optional field is absent.
    pub treat_missing_values_as_errors: bool,
    /// Fail object decoding when a non-optional field decodes to nothing.
    pub treat_null_values_in_class_as_errors: bool,
    /// Level recorded (and logged) for misses that a default or optional
    /// wrapper makes acceptable.
    pub log_level_for_missing_values_when_default_or_optional: ValidationLevel,
    /// chrono format for `DateTime<Utc>`; `None` uses RFC 3339.
    pub date_decoder_format: Option<String>,
    /// chrono format for `NaiveDateTime`.
    pub local_date_time_format: String,
    /// chrono format for `NaiveDate`.
    pub local_date_format: String,
    /// Token opening a substitution expression.
    pub substitution_opening_token: String,
    /// Token closing a substitution expression.
    pub substitution_closing_token: String,
    /// Grammar for the text between the tokens; must expose the named
    /// groups `transform`, `key`, and `default`.
    pub substitution_regex: String,
    /// Bound on substitution re-scan passes.
    pub max_substitution_nested_depth: usize,
}

impl Default for GestaltConfig {
    fn default() -> Self {
        Self {
            treat_warnings_as_errors: false,
            treat_missing_array_index_as_error: false,
            treat_missing_values_as_errors: false,
            treat_null_values_in_class_as_errors: true,
            log_level_for_missing_values_when_default_or_optional: ValidationLevel::Debug,
            date_decoder_format: None,
            local_date_time_format: "%Y-%m-%dT%H:%M:%S".to_string(),
            local_date_format: "%Y-%m-%d".to_string(),
            substitution_opening_token: "${".to_string(),
            substitution_closing_token: "}".to_string(),
            substitution_regex: DEFAULT_SUBSTITUTION_REGEX.to_string(),
            max_substitution_nested_depth: 5,
        }
    }
}
