//! Configuration for tree models and node factories.
//!
//! Loaded from TOML; every field has a default, so an empty document is a
//! valid configuration.
//!
//! ```
//! use treeview::TreeViewConfig;
//!
//! let config = TreeViewConfig::from_toml_str(r#"
//!     [expander]
//!     thread_name_prefix = "Expand"
//!
//!     [factory]
//!     preferred = ["Directory"]
//! "#).unwrap();
//!
//! assert_eq!(config.expander.thread_name_prefix, "Expand");
//! assert_eq!(config.dispatcher.thread_name, "treeview-dispatch");
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use treeview_core::{DEFAULT_DISPATCH_THREAD, DispatcherConfig};

use crate::error::ConfigError;

/// Default prefix of expander thread names.
pub const DEFAULT_EXPANDER_PREFIX: &str = "Node expander";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeViewConfig {
    pub expander: ExpanderConfig,
    pub dispatcher: DispatchSettings,
    pub factory: FactoryConfig,
}

impl TreeViewConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_toml_str(&text)
    }
}

/// Background expansion settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpanderConfig {
    /// Expander threads are named `"<prefix>: <node name>"`.
    pub thread_name_prefix: String,
    /// Stack size of expander threads in bytes; 0 uses the platform default.
    pub stack_size: usize,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            thread_name_prefix: DEFAULT_EXPANDER_PREFIX.to_string(),
            stack_size: 0,
        }
    }
}

impl ExpanderConfig {
    pub(crate) fn thread_name(&self, node_name: &str) -> String {
        format!("{}: {}", self.thread_name_prefix, node_name)
    }
}

/// Event-dispatch thread settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    pub thread_name: String,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_DISPATCH_THREAD.to_string(),
        }
    }
}

impl From<&DispatchSettings> for DispatcherConfig {
    fn from(settings: &DispatchSettings) -> Self {
        DispatcherConfig::with_name(settings.thread_name.clone())
    }
}

/// Node factory settings, by node type name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Record a builder trace on each created node.
    pub debug: bool,
    /// Types whose builders move to the head of the list, first listed first.
    pub preferred: Vec<String>,
    /// Types whose builders move to the tail of the list.
    pub deprecated: Vec<String>,
    /// Types never produced.
    pub shunned: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = TreeViewConfig::from_toml_str("").unwrap();
        assert_eq!(config, TreeViewConfig::default());
        assert_eq!(config.expander.thread_name("data"), "Node expander: data");
    }

    #[test]
    fn test_full_config() {
        let config = TreeViewConfig::from_toml_str(
            r#"
            [expander]
            thread_name_prefix = "Exp"
            stack_size = 65536

            [dispatcher]
            thread_name = "ui"

            [factory]
            debug = true
            preferred = ["Directory"]
            deprecated = ["File"]
            shunned = ["Error"]
            "#,
        )
        .unwrap();

        assert_eq!(config.expander.stack_size, 65536);
        assert_eq!(DispatcherConfig::from(&config.dispatcher).thread_name, "ui");
        assert!(config.factory.debug);
        assert_eq!(config.factory.preferred, ["Directory"]);
        assert_eq!(config.factory.shunned, ["Error"]);
    }

    #[test]
    fn test_invalid_config() {
        let err = TreeViewConfig::from_toml_str("[expander]\nstack_size = \"big\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("treeview.toml");
        let mut config = TreeViewConfig::default();
        config.factory.preferred.push("Directory".to_string());
        std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

        assert_eq!(TreeViewConfig::from_file(&path).unwrap(), config);

        let missing = TreeViewConfig::from_file(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
