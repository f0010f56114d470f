//! Regex rules deciding which paths hold secrets.

use regex::Regex;

use crate::error::GestaltError;

/// A set of regexes matched against node paths.
///
/// A path matching any rule is treated as a secret by the processors
/// that consult the checker.
pub struct SecretChecker {
    patterns: Vec<Regex>,
}

impl SecretChecker {
    /// Compile a rule set.
    ///
    /// # Errors
    ///
    /// Returns [`GestaltError::Build`] when a pattern does not compile.
    pub fn new<I, S>(patterns: I) -> Result<Self, GestaltError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            compiled.push(Regex::new(pattern).map_err(|e| {
                GestaltError::Build(format!("invalid secret rule '{pattern}': {e}"))
            })?);
        }
        Ok(Self { patterns: compiled })
    }

    /// Whether `path` matches any rule.
    #[must_use]
    pub fn is_secret(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(path))
    }
}
