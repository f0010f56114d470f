//! Non-fatal validation errors accumulated through the decode pipeline.

use thiserror::Error;

use crate::node::NodeKind;

/// Severity attached to a [`ValidationError`].
///
/// Ordered by severity, so `max` over a set of errors yields the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationLevel {
    /// Diagnostic only; never fails a call.
    Debug,
    /// A value was absent where an optional or default made that fine.
    MissingOptionalValue,
    /// A required value was absent.
    MissingValue,
    /// Suspicious but recoverable; fails a call only in strict mode.
    Warn,
    /// Unrecoverable for the node in question.
    Error,
}

/// One thing that went wrong while tokenizing, navigating, merging,
/// post-processing, or decoding.
///
/// Errors accumulate in a [`Validated`](crate::Validated) rather than
/// aborting, so a single read can report everything wrong beneath a path.
/// Variants that occur at more than one severity carry their level.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// A path segment did not lex into tokens.
    #[error("unable to tokenize segment '{segment}' for path '{path}'")]
    FailedToTokenize {
        /// Segment that failed to lex.
        segment: String,
        /// Full path the segment came from.
        path: String,
    },

    /// Navigation found nothing at a key or index.
    #[error("no results found for path '{path}' while looking up '{missing}'")]
    NoResultsFoundForNode {
        /// Path navigated so far.
        path: String,
        /// Key or index that was absent.
        missing: String,
        /// Severity, driven by whether a default or optional is in play.
        level: ValidationLevel,
    },

    /// Navigation hit a node whose variant does not match the token kind.
    #[error("mismatched node on path '{path}': expected a {expected} node, found a {actual} node")]
    MismatchedPathType {
        /// Path of the offending node.
        path: String,
        /// Variant the token called for.
        expected: NodeKind,
        /// Variant actually present.
        actual: NodeKind,
    },

    /// A decoder was handed a node variant it cannot decode.
    #[error("decoder {decoder} expected a {expected} node on path '{path}', found a {actual} node")]
    DecodingExpectedNodeType {
        /// Path of the offending node.
        path: String,
        /// Variant the decoder works on.
        expected: NodeKind,
        /// Variant actually present.
        actual: NodeKind,
        /// Name of the decoder that gave up.
        decoder: &'static str,
    },

    /// A leaf decoder was handed a leaf with no value.
    #[error("decoder {decoder} found a leaf with no value on path '{path}'")]
    DecodingLeafMissingValue {
        /// Path of the empty leaf.
        path: String,
        /// Name of the decoder that gave up.
        decoder: &'static str,
    },

    /// A leaf value failed to parse as a number.
    #[error("unable to parse '{value}' as a number on path '{path}' during {decoder} decoding")]
    DecodingNumberParsing {
        /// Path of the leaf.
        path: String,
        /// Offending text.
        value: String,
        /// Name of the decoder.
        decoder: &'static str,
    },

    /// A leaf value failed to parse as the decoder's target type.
    #[error("unable to parse '{value}' on path '{path}' during {decoder} decoding")]
    DecodingValueParsing {
        /// Path of the leaf.
        path: String,
        /// Offending text.
        value: String,
        /// Name of the decoder.
        decoder: &'static str,
    },

    /// A numeric leaf parsed but does not fit in the target type.
    #[error("number '{value}' does not fit the target type on path '{path}' during {decoder} decoding")]
    DecodingNumberRange {
        /// Path of the leaf.
        path: String,
        /// Offending text.
        value: String,
        /// Name of the decoder.
        decoder: &'static str,
    },

    /// A char leaf was not exactly one character.
    ///
    /// Too long keeps the first character at WARN; empty is an ERROR with
    /// no result.
    #[error("char on path '{path}' received the wrong size: '{value}'")]
    DecodingCharWrongSize {
        /// Path of the leaf.
        path: String,
        /// Offending text.
        value: String,
        /// WARN with a partial result, or ERROR with none.
        level: ValidationLevel,
    },

    /// No enum variant matched the leaf value.
    #[error("no variant of {type_name} matches '{value}' on path '{path}'")]
    DecodingEnumValueNotFound {
        /// Path of the leaf.
        path: String,
        /// Offending text.
        value: String,
        /// Enum type being decoded.
        type_name: &'static str,
    },

    /// A sparse array slot was absent while decoding.
    #[error("array on path '{path}' is missing index {index}")]
    ArrayMissingIndex {
        /// Path of the array node.
        path: String,
        /// Absent slot.
        index: usize,
        /// ERROR when `treat_missing_array_index_as_error` is set.
        level: ValidationLevel,
    },

    /// An object field decoded to nothing.
    #[error("field '{field}' of object on path '{path}' decoded to no value")]
    ObjectFieldNull {
        /// Path of the object node.
        path: String,
        /// Field that produced nothing.
        field: &'static str,
        /// ERROR when `treat_null_values_in_class_as_errors` is set.
        level: ValidationLevel,
    },

    /// A substitution key was not found by its transform.
    #[error("substitution key '{key}' via transform '{transform}' was not found on path '{path}'")]
    SubstitutionMissingKey {
        /// Path of the leaf being rewritten.
        path: String,
        /// Key that missed.
        key: String,
        /// Transform consulted.
        transform: String,
        /// MISSING_OPTIONAL_VALUE when a default covered the miss.
        level: ValidationLevel,
    },

    /// Substitution did not settle within the configured depth.
    #[error("substitution on path '{path}' exceeded the max nested depth of {max_depth}")]
    SubstitutionRecursionLimit {
        /// Path of the leaf being rewritten.
        path: String,
        /// Configured bound.
        max_depth: usize,
    },

    /// A substitution expansion revisited a key already on its path.
    #[error("substitution cycle detected on path '{path}': {chain}")]
    SubstitutionCycle {
        /// Path of the leaf being rewritten.
        path: String,
        /// The keys participating in the cycle.
        chain: String,
    },

    /// No registered decoder matches the requested type.
    #[error("no decoder found for type {type_name} on path '{path}'")]
    NoDecoderFor {
        /// Path being decoded.
        path: String,
        /// Requested type.
        type_name: &'static str,
    },

    /// A decoder produced a value of the wrong runtime type.
    #[error("decoder {decoder} produced an unexpected type for {type_name} on path '{path}'")]
    InternalDecoderMismatch {
        /// Path being decoded.
        path: String,
        /// Decoder that misbehaved.
        decoder: String,
        /// Type the caller asked for.
        type_name: &'static str,
    },

    /// Two nodes of different variants met during a merge.
    #[error("unable to merge a {left} node with a {right} node on path '{path}'")]
    MergeConflict {
        /// Path where the variants collided.
        path: String,
        /// Variant already in the tree.
        left: NodeKind,
        /// Variant of the overriding fragment.
        right: NodeKind,
    },

    /// A source failed to produce its contribution.
    #[error("failed to load source '{source_name}': {message}")]
    SourceLoadFailure {
        /// Source name.
        source_name: String,
        /// What went wrong.
        message: String,
    },
}

impl ValidationError {
    /// Severity of this error.
    #[must_use]
    pub fn level(&self) -> ValidationLevel {
        match self {
            Self::FailedToTokenize { .. }
            | Self::MismatchedPathType { .. }
            | Self::DecodingExpectedNodeType { .. }
            | Self::DecodingNumberParsing { .. }
            | Self::DecodingValueParsing { .. }
            | Self::DecodingNumberRange { .. }
            | Self::DecodingEnumValueNotFound { .. }
            | Self::SubstitutionRecursionLimit { .. }
            | Self::SubstitutionCycle { .. }
            | Self::NoDecoderFor { .. }
            | Self::InternalDecoderMismatch { .. }
            | Self::MergeConflict { .. }
            | Self::SourceLoadFailure { .. } => ValidationLevel::Error,
            Self::DecodingLeafMissingValue { .. } => ValidationLevel::MissingValue,
            Self::NoResultsFoundForNode { level, .. }
            | Self::DecodingCharWrongSize { level, .. }
            | Self::ArrayMissingIndex { level, .. }
            | Self::ObjectFieldNull { level, .. }
            | Self::SubstitutionMissingKey { level, .. } => *level,
        }
    }
}
