//! Accumulating result container threaded through the decode pipeline.
//!
//! Unlike `Result`, a [`Validated`] can carry a value *and* a list of
//! non-fatal validation errors at the same time, so partial results (for
//! example a truncated char, or an array with one bad element) survive to
//! the caller together with everything that went wrong along the way.

use crate::error::ValidationError;

/// A value, a set of validation errors, or both.
///
/// Invariant: a `Validated` without a value always carries at least one
/// error; a `Validated` with a value may still carry warnings. No
/// combinator is allowed to drop errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T> {
    value: Option<T>,
    errors: Vec<ValidationError>,
}

impl<T> Validated<T> {
    /// A result with a value and no errors.
    #[must_use]
    pub fn valid(value: T) -> Self {
        Self {
            value: Some(value),
            errors: Vec::new(),
        }
    }

    /// A result with no value and a single error.
    #[must_use]
    pub fn invalid(error: ValidationError) -> Self {
        Self {
            value: None,
            errors: vec![error],
        }
    }

    /// A result with no value and the given errors.
    #[must_use]
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        debug_assert!(!errors.is_empty(), "a value-less Validated needs an error");
        Self {
            value: None,
            errors,
        }
    }

    /// Combine an optional value with a set of accumulated errors.
    #[must_use]
    pub fn of(value: Option<T>, errors: Vec<ValidationError>) -> Self {
        debug_assert!(
            value.is_some() || !errors.is_empty(),
            "a value-less Validated needs an error"
        );
        Self { value, errors }
    }

    /// Whether a value is present.
    #[must_use]
    pub fn has_results(&self) -> bool {
        self.value.is_some()
    }

    /// Whether any errors were accumulated.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Borrow the value, if present.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Borrow the accumulated errors.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Take the value, discarding the error list.
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Split into the optional value and the error list.
    #[must_use]
    pub fn into_parts(self) -> (Option<T>, Vec<ValidationError>) {
        (self.value, self.errors)
    }

    /// Append a single error, keeping any value.
    pub fn push_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Append errors from another source, keeping any value.
    pub fn merge_errors(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        self.errors.extend(errors);
    }

    /// Map the value, preserving accumulated errors.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Validated<U> {
        Validated {
            value: self.value.map(f),
            errors: self.errors,
        }
    }

    /// Chain a fallible continuation, unioning both error sets.
    ///
    /// When no value is present the continuation does not run and the
    /// existing errors carry through unchanged.
    #[must_use]
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Validated<U>) -> Validated<U> {
        match self.value {
            Some(value) => {
                let mut next = f(value);
                let mut errors = self.errors;
                errors.append(&mut next.errors);
                Validated {
                    value: next.value,
                    errors,
                }
            }
            None => Validated {
                value: None,
                errors: self.errors,
            },
        }
    }

    /// Merge many results into one: the union of every error set, with a
    /// combined value only when every input carried one.
    #[must_use]
    pub fn merge_all(items: impl IntoIterator<Item = Validated<T>>) -> Validated<Vec<T>> {
        let mut values = Vec::new();
        let mut errors = Vec::new();
        let mut complete = true;
        for item in items {
            match item.value {
                Some(v) => values.push(v),
                None => complete = false,
            }
            errors.extend(item.errors);
        }
        Validated {
            value: complete.then_some(values),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Validated;
    use crate::error::{ValidationError, ValidationLevel};

    fn missing(path: &str) -> ValidationError {
        ValidationError::NoResultsFoundForNode {
            path: path.into(),
            missing: "key".into(),
            level: ValidationLevel::MissingValue,
        }
    }

    #[test]
    fn map_preserves_errors() {
        let mut v = Validated::valid(2);
        v.push_error(missing("a"));
        let mapped = v.map(|n| n * 2);
        assert_eq!(mapped.value(), Some(&4));
        assert_eq!(mapped.errors().len(), 1);
    }

    #[test]
    fn and_then_unions_both_error_sets() {
        let mut first = Validated::valid(1);
        first.push_error(missing("a"));
        let chained = first.and_then(|n| {
            let mut next = Validated::valid(n + 1);
            next.push_error(missing("b"));
            next
        });
        assert_eq!(chained.value(), Some(&2));
        assert_eq!(chained.errors().len(), 2);
    }

    #[test]
    fn and_then_skips_continuation_without_value() {
        let start: Validated<i32> = Validated::invalid(missing("a"));
        let chained = start.and_then(|_| Validated::valid(9));
        assert!(!chained.has_results());
        assert_eq!(chained.errors().len(), 1);
    }

    #[test]
    fn merge_all_requires_every_value() {
        let merged = Validated::merge_all(vec![
            Validated::valid(1),
            Validated::of(Some(2), vec![missing("x")]),
        ]);
        assert_eq!(merged.value(), Some(&vec![1, 2]));
        assert_eq!(merged.errors().len(), 1);

        let partial = Validated::merge_all(vec![Validated::valid(1), Validated::invalid(missing("y"))]);
        assert!(!partial.has_results());
        assert_eq!(partial.errors().len(), 1);
    }
}
