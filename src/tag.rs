//! Opaque key/value selectors attached to a config read.

use std::collections::BTreeMap;
use std::fmt;

/// An ordered set of `(key, value)` selectors.
///
/// Tags namespace cache entries, so the same path can be read with
/// different tag sets without the results colliding.
///
/// # Examples
///
/// ```
/// use gestalt::tag::Tags;
///
/// let tags = Tags::of([("environment", "dev")]);
/// assert_eq!(tags.to_string(), "environment=dev");
/// assert_ne!(tags, Tags::default());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Tags {
    entries: BTreeMap<String, String>,
}

impl Tags {
    /// The empty tag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags from key/value pairs. Later duplicates of a key win.
    #[must_use]
    pub fn of<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Convenience for the common `environment` selector.
    #[must_use]
    pub fn environment(name: impl Into<String>) -> Self {
        Self::of([("environment", name.into())])
    }

    /// Whether no tags are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of a tag, if set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
