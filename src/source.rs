//! Where configuration comes from.
//!
//! A source produces either raw bytes (a stream) or a flat key/value
//! list; its `format` selects the loader that turns the contribution
//! into a node fragment. Identity is the stable [`Uuid`] returned by
//! [`ConfigSource::id`], which reloads use to replace exactly the slice
//! a source contributed.

use camino::Utf8PathBuf;
use uuid::Uuid;

use crate::error::GestaltError;

/// Format name of [`EnvironmentSource`].
pub const ENV_VARS_FORMAT: &str = "envVars";

/// Format name of [`MapSource`].
pub const MAP_NODE_FORMAT: &str = "mapNode";

/// One provider of configuration.
pub trait ConfigSource: Send + Sync {
    /// Human-readable name for errors and logs.
    fn name(&self) -> String;

    /// Stable identity; reloads replace the fragment with this id.
    fn id(&self) -> Uuid;

    /// Format tag used to select a loader.
    fn format(&self) -> String;

    /// Whether this source produces bytes.
    fn has_stream(&self) -> bool {
        false
    }

    /// The source's bytes.
    ///
    /// # Errors
    ///
    /// Returns [`GestaltError::SourceLoad`] when the source has no stream
    /// or reading it fails.
    fn load_stream(&self) -> Result<Vec<u8>, GestaltError> {
        Err(GestaltError::SourceLoad {
            source_name: self.name(),
            message: "source does not provide a stream".into(),
        })
    }

    /// Whether this source produces a key/value list.
    fn has_list(&self) -> bool {
        false
    }

    /// The source's key/value pairs.
    ///
    /// # Errors
    ///
    /// Returns [`GestaltError::SourceLoad`] when the source has no list
    /// or producing it fails.
    fn load_list(&self) -> Result<Vec<(String, String)>, GestaltError> {
        Err(GestaltError::SourceLoad {
            source_name: self.name(),
            message: "source does not provide a key/value list".into(),
        })
    }
}

/// The process environment as a key/value list.
pub struct EnvironmentSource {
    id: Uuid,
}

impl EnvironmentSource {
    /// Source over the current process environment.
    #[must_use]
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }
}

impl Default for EnvironmentSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for EnvironmentSource {
    fn name(&self) -> String {
        ENV_VARS_FORMAT.to_string()
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn format(&self) -> String {
        ENV_VARS_FORMAT.to_string()
    }

    fn has_list(&self) -> bool {
        true
    }

    fn load_list(&self) -> Result<Vec<(String, String)>, GestaltError> {
        Ok(std::env::vars().collect())
    }
}

/// An in-memory key/value list with dotted-path keys.
pub struct MapSource {
    id: Uuid,
    name: String,
    entries: Vec<(String, String)>,
}

impl MapSource {
    /// Source over the given pairs.
    #[must_use]
    pub fn new<K, V>(name: impl Into<String>, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ConfigSource for MapSource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn format(&self) -> String {
        MAP_NODE_FORMAT.to_string()
    }

    fn has_list(&self) -> bool {
        true
    }

    fn load_list(&self) -> Result<Vec<(String, String)>, GestaltError> {
        Ok(self.entries.clone())
    }
}

/// An in-memory document with an explicit format.
pub struct StringSource {
    id: Uuid,
    text: String,
    format: String,
}

impl StringSource {
    /// Source over `text`, parsed by the loader accepting `format`.
    #[must_use]
    pub fn new(text: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            format: format.into(),
        }
    }
}

impl ConfigSource for StringSource {
    fn name(&self) -> String {
        format!("String source format: {}", self.format)
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn format(&self) -> String {
        self.format.clone()
    }

    fn has_stream(&self) -> bool {
        true
    }

    fn load_stream(&self) -> Result<Vec<u8>, GestaltError> {
        Ok(self.text.clone().into_bytes())
    }
}

/// A file on disk; the extension selects the loader.
pub struct FileSource {
    id: Uuid,
    path: Utf8PathBuf,
}

impl FileSource {
    /// Source over the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
        }
    }
}

impl ConfigSource for FileSource {
    fn name(&self) -> String {
        format!("File source: {}", self.path)
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn format(&self) -> String {
        self.path.extension().unwrap_or_default().to_string()
    }

    fn has_stream(&self) -> bool {
        true
    }

    fn load_stream(&self) -> Result<Vec<u8>, GestaltError> {
        std::fs::read(self.path.as_std_path()).map_err(|e| GestaltError::SourceLoad {
            source_name: self.name(),
            message: e.to_string(),
        })
    }
}
