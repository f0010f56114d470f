//! The fatal error channel surfaced by the top-level API.

use std::fmt;

use thiserror::Error;

use super::ValidationError;

/// Numbered list of validation errors, one per line.
///
/// Display mirrors an aggregated error report:
///
/// ```text
/// 1: no results found for path 'db' while looking up 'port'
/// 2: unable to parse 'abc' as a number on path 'db.port' during i64 decoding
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorList(Vec<ValidationError>);

impl ErrorList {
    /// Wrap a set of validation errors.
    #[must_use]
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }

    /// Iterate over the contained errors.
    #[must_use = "iterators should be consumed to inspect errors"]
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// Number of errors in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {e}", i + 1)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for ErrorList {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Errors that end a call instead of accumulating.
///
/// Everything below the top-level API flows through
/// [`Validated`](crate::Validated); only the user-facing entry points
/// translate a failed policy check or an unbuildable configuration into
/// this type.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GestaltError {
    /// The configuration cannot be constructed at all.
    #[error("failed to build configuration: {0}")]
    Build(String),

    /// A source failed to produce bytes or key/value pairs.
    #[error("failed to load source '{source_name}': {message}")]
    SourceLoad {
        /// Source name.
        source_name: String,
        /// What went wrong.
        message: String,
    },

    /// Post-processing a freshly built generation failed.
    #[error("post-processing the configuration tree failed:\n{0}")]
    PostProcessing(ErrorList),

    /// A typed read failed the active error policy.
    #[error("failed to decode configuration on path '{path}':\n{errors}")]
    Decoding {
        /// Path that was read.
        path: String,
        /// Everything that went wrong beneath it.
        errors: ErrorList,
    },

    /// A required path had no value and no default was supplied.
    #[error("no configuration found on path '{path}':\n{errors}")]
    MissingConfig {
        /// Path that was read.
        path: String,
        /// The misses that led here.
        errors: ErrorList,
    },

    /// No configuration has been loaded yet.
    #[error("no configuration loaded; call load_configs first")]
    NotLoaded,
}
