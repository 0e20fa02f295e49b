//! Symbol-name configuration and plugin manifests.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ConfigError, PluginError};

/// Default symbol names of the plugin contract.
pub mod defaults {
    /// Exported `extern "C" fn() -> *mut T`.
    pub const FACTORY_SYMBOL: &str = "create_plugin";
    /// Exported `extern "C" fn(*mut T)`.
    pub const DESTRUCTOR_SYMBOL: &str = "delete_plugin";
}

/// Environment variable names.
pub mod env_vars {
    /// Log filter directives for the `dynaplug` binary.
    pub const LOG: &str = "DYNAPLUG_LOG";
    /// Emit JSON log lines when set to `true`.
    pub const LOG_JSON: &str = "DYNAPLUG_LOG_JSON";
}

/// Names of the factory/destructor pair a library must export.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SymbolNames {
    #[serde(default = "default_factory")]
    pub factory: String,
    #[serde(default = "default_destructor")]
    pub destructor: String,
}

fn default_factory() -> String {
    defaults::FACTORY_SYMBOL.to_string()
}

fn default_destructor() -> String {
    defaults::DESTRUCTOR_SYMBOL.to_string()
}

impl Default for SymbolNames {
    fn default() -> Self {
        Self {
            factory: default_factory(),
            destructor: default_destructor(),
        }
    }
}

impl SymbolNames {
    pub fn new(factory: impl Into<String>, destructor: impl Into<String>) -> Self {
        Self {
            factory: factory.into(),
            destructor: destructor.into(),
        }
    }

    pub fn with_factory(mut self, factory: impl Into<String>) -> Self {
        self.factory = factory.into();
        self
    }

    pub fn with_destructor(mut self, destructor: impl Into<String>) -> Self {
        self.destructor = destructor.into();
        self
    }

    /// Reject names that cannot be resolved, or a pair naming the same symbol twice.
    pub fn validate(&self) -> Result<(), PluginError> {
        validate_symbol(&self.factory)?;
        validate_symbol(&self.destructor)?;
        if self.factory == self.destructor {
            return Err(PluginError::SymbolClash {
                symbol: self.factory.clone(),
            });
        }
        Ok(())
    }
}

fn validate_symbol(symbol: &str) -> Result<(), PluginError> {
    let reason = if symbol.is_empty() {
        "symbol name is empty"
    } else if symbol.contains('\0') {
        "symbol name contains a NUL byte"
    } else {
        return Ok(());
    };

    Err(PluginError::InvalidSymbol {
        symbol: symbol.to_string(),
        reason,
    })
}

/// Keys accepted in a `[[plugin]]` entry.
const ENTRY_KEYS: &[&str] = &["name", "path", "factory", "destructor"];

/// One `[[plugin]]` entry of a manifest.
///
/// Unknown keys are rejected by [`PluginManifest::from_toml_str`], so a
/// misspelled `factory` does not silently fall back to the default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PluginEntry {
    /// Optional display name
    #[serde(default)]
    pub name: Option<String>,

    /// Library path or platform-resolvable library name
    pub path: PathBuf,

    #[serde(flatten)]
    pub symbols: SymbolNames,
}

impl PluginEntry {
    /// Name used in reports: the explicit name, else the path.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// A list of plugin libraries with the symbols each is expected to export.
///
/// ```toml
/// [[plugin]]
/// name = "tally"
/// path = "plugins/libtally.so"
///
/// [[plugin]]
/// path = "libother.so"
/// factory = "make_it"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PluginManifest {
    #[serde(default, rename = "plugin")]
    pub plugins: Vec<PluginEntry>,
}

impl PluginManifest {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let manifest: PluginManifest = toml::from_str(content)?;
        // `flatten` rules out `deny_unknown_fields`, so check the raw tables.
        check_entry_keys(&toml::from_str::<toml::Table>(content)?)?;
        for entry in &manifest.plugins {
            entry
                .symbols
                .validate()
                .map_err(|source| ConfigError::Entry {
                    entry: entry.label(),
                    source,
                })?;
        }
        Ok(manifest)
    }

    /// Read a manifest file.
    ///
    /// Relative paths with a directory component are resolved against the
    /// manifest's directory. Bare library names are left for the platform
    /// loader's search path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut manifest = Self::from_toml_str(&content)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for entry in &mut manifest.plugins {
            if entry.path.is_relative() && entry.path.components().count() > 1 {
                entry.path = base.join(&entry.path);
            }
        }

        tracing::debug!(
            "Read manifest {} with {} plugin(s)",
            path.display(),
            manifest.plugins.len()
        );
        Ok(manifest)
    }
}

fn check_entry_keys(raw: &toml::Table) -> Result<(), ConfigError> {
    let Some(entries) = raw.get("plugin").and_then(toml::Value::as_array) else {
        return Ok(());
    };

    for entry in entries.iter().filter_map(toml::Value::as_table) {
        if let Some(key) = entry.keys().find(|k| !ENTRY_KEYS.contains(&k.as_str())) {
            let label = entry
                .get("name")
                .or_else(|| entry.get("path"))
                .and_then(toml::Value::as_str)
                .unwrap_or_default();
            return Err(ConfigError::UnknownKey {
                entry: label.to_string(),
                key: key.clone(),
            });
        }
    }
    Ok(())
}
