//! Metadata attached to leaf nodes, with container rollup.

use std::collections::BTreeMap;

/// Well-known key marking a value as secret. Never rolls up.
pub const SECRET: &str = "secret";

/// Well-known key excluding a value from the read cache.
pub const NO_CACHE: &str = "noCache";

/// A single metadata value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    /// A boolean marker, such as `secret`.
    Flag(bool),
    /// Free-form text, such as a source annotation.
    Text(String),
}

/// Metadata entries keyed by kind.
///
/// Leaves own their metadata; containers see a *rollup* of their children,
/// computed on demand. Keys marked non-rolling (currently [`SECRET`]) stay
/// on the leaf: a map holding one secret leaf is not itself secret.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: BTreeMap<String, Vec<MetaValue>>,
}

impl Metadata {
    /// Empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata with a single `Flag(true)` entry under `key`.
    #[must_use]
    pub fn flag(key: impl Into<String>) -> Self {
        let mut metadata = Self::new();
        metadata.insert(key, MetaValue::Flag(true));
        metadata
    }

    /// Whether any entries are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a value under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: MetaValue) {
        self.entries.entry(key.into()).or_default().push(value);
    }

    /// Values stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> &[MetaValue] {
        self.entries.get(key).map_or(&[], Vec::as_slice)
    }

    /// Whether `key` holds a `Flag(true)` value.
    #[must_use]
    pub fn has_flag(&self, key: &str) -> bool {
        self.get(key)
            .iter()
            .any(|value| matches!(value, MetaValue::Flag(true)))
    }

    /// Whether entries under `key` propagate to containers.
    #[must_use]
    pub fn is_rolling(key: &str) -> bool {
        key != SECRET
    }

    /// Merge this metadata into a container-level view, skipping
    /// non-rolling keys.
    pub fn rollup_into(&self, target: &mut Metadata) {
        for (key, values) in &self.entries {
            if !Self::is_rolling(key) {
                continue;
            }
            target
                .entries
                .entry(key.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MetaValue, Metadata, NO_CACHE, SECRET};

    #[test]
    fn secret_does_not_roll_up() {
        let mut leaf = Metadata::flag(SECRET);
        leaf.insert(NO_CACHE, MetaValue::Flag(true));

        let mut container = Metadata::new();
        leaf.rollup_into(&mut container);

        assert!(!container.has_flag(SECRET));
        assert!(container.has_flag(NO_CACHE));
    }

    #[test]
    fn rollup_accumulates_values() {
        let first = Metadata::flag(NO_CACHE);
        let mut second = Metadata::new();
        second.insert(NO_CACHE, MetaValue::Text("from file".into()));

        let mut container = Metadata::new();
        first.rollup_into(&mut container);
        second.rollup_into(&mut container);

        assert_eq!(container.get(NO_CACHE).len(), 2);
    }
}
