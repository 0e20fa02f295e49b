//! Error types for plugin loading.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, PluginError>;

/// Failures surfaced while loading a plugin library or creating instances from it.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The shared library could not be opened.
    #[error("Failed to load library at {}: {source}", .path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// A required symbol is not exported by the library.
    ///
    /// `source` is `None` when the symbol exists but its address is null.
    #[error("Failed to find function '{symbol}' in library {}{}", .path.display(), detail(.source))]
    SymbolMissing {
        symbol: String,
        path: PathBuf,
        #[source]
        source: Option<libloading::Error>,
    },

    /// A symbol name cannot be looked up at all.
    #[error("Invalid symbol name '{symbol}': {reason}")]
    InvalidSymbol { symbol: String, reason: &'static str },

    /// Factory and destructor were configured with the same symbol.
    #[error("Factory and destructor must be distinct symbols, both are '{symbol}'")]
    SymbolClash { symbol: String },

    /// The factory returned a null pointer.
    #[error("Function '{symbol}' in library {} returned a null instance", .path.display())]
    NullInstance { symbol: String, path: PathBuf },
}

fn detail(source: &Option<libloading::Error>) -> String {
    match source {
        Some(e) => format!(": {}", e),
        None => ": symbol address is null".to_string(),
    }
}

impl PluginError {
    /// Path of the library involved, when the failure concerns one.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            PluginError::OpenFailed { path, .. }
            | PluginError::SymbolMissing { path, .. }
            | PluginError::NullInstance { path, .. } => Some(path),
            PluginError::InvalidSymbol { .. } | PluginError::SymbolClash { .. } => None,
        }
    }

    /// Symbol involved, when the failure concerns one.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            PluginError::SymbolMissing { symbol, .. }
            | PluginError::InvalidSymbol { symbol, .. }
            | PluginError::SymbolClash { symbol }
            | PluginError::NullInstance { symbol, .. } => Some(symbol),
            PluginError::OpenFailed { .. } => None,
        }
    }
}

/// Errors reading a plugin manifest.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read manifest {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid plugin entry '{entry}': {source}")]
    Entry {
        entry: String,
        #[source]
        source: PluginError,
    },

    #[error("Unknown key '{key}' in plugin entry '{entry}'")]
    UnknownKey { entry: String, key: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PluginError::SymbolClash {
            symbol: "create_plugin".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Factory and destructor must be distinct symbols, both are 'create_plugin'"
        );

        let err = PluginError::NullInstance {
            symbol: "make_it".to_string(),
            path: PathBuf::from("/tmp/libfoo.so"),
        };
        assert_eq!(
            err.to_string(),
            "Function 'make_it' in library /tmp/libfoo.so returned a null instance"
        );
    }

    #[test]
    fn test_error_accessors() {
        let err = PluginError::NullInstance {
            symbol: "make_it".to_string(),
            path: PathBuf::from("libfoo.so"),
        };
        assert_eq!(err.symbol(), Some("make_it"));
        assert_eq!(err.path(), Some(std::path::Path::new("libfoo.so")));

        let err = PluginError::InvalidSymbol {
            symbol: String::new(),
            reason: "empty",
        };
        assert_eq!(err.path(), None);
        assert_eq!(err.symbol(), Some(""));
    }
}
