//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::Error;

/// Tunables for the tree engine, read from JSON.
///
/// ```rust
/// use janosh_core::Config;
///
/// let config = Config::from_json_str(r#"{"pack_on_remove": false}"#).unwrap();
/// assert!(!config.pack_on_remove);
/// assert!(config.auto_create_root);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Re-index arrays after an element is removed.
    pub pack_on_remove: bool,
    /// Create an empty root object before the first mutation.
    pub auto_create_root: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pack_on_remove: true,
            auto_create_root: true,
        }
    }
}

impl Config {
    pub fn from_json_str(s: &str) -> Result<Self, Error> {
        serde_json::from_str(s).map_err(|e| Error::Config {
            message: e.to_string(),
        })
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::from_json_str(&text)
    }
}
