//! Verifying that libraries export a factory/destructor pair.

use std::ffi::c_void;
use std::path::{Path, PathBuf};

use dynaplug_core::{Loader, PluginEntry, SymbolNames};
use serde::Serialize;

/// Outcome of checking one library.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub name: String,
    pub path: PathBuf,
    pub factory: String,
    pub destructor: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckReport {
    pub fn print(&self) {
        let status = if self.ok { "OK  " } else { "FAIL" };
        println!(
            "{} {} ({} / {}) {}",
            status,
            self.name,
            self.factory,
            self.destructor,
            self.path.display()
        );
        if let Some(error) = &self.error {
            println!("     {}", error);
        }
    }
}

/// Open `path` and resolve both symbols without calling the factory.
pub fn check_library(name: &str, path: &Path, symbols: &SymbolNames) -> CheckReport {
    // The interface type is unknown here, so it stays opaque.
    // SAFETY: only the library's initializers run; the resolved entry
    // points are never called.
    let result = unsafe { Loader::<c_void>::load_with(path, symbols) };

    let error = match result {
        Ok(loader) => {
            tracing::debug!("Checked {:?}", loader);
            None
        }
        Err(e) => {
            tracing::debug!("Check of {} failed: {}", path.display(), e);
            Some(e.to_string())
        }
    };

    CheckReport {
        name: name.to_string(),
        path: path.to_path_buf(),
        factory: symbols.factory.clone(),
        destructor: symbols.destructor.clone(),
        ok: error.is_none(),
        error,
    }
}

pub fn check_entry(entry: &PluginEntry) -> CheckReport {
    check_library(&entry.label(), &entry.path, &entry.symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_missing_library() {
        let report = check_library(
            "missing",
            Path::new("/nonexistent/libmissing.so"),
            &SymbolNames::default(),
        );

        assert!(!report.ok);
        assert!(report.error.unwrap().contains("/nonexistent/libmissing.so"));
        assert_eq!(report.factory, "create_plugin");
    }

    #[test]
    fn test_report_serialization() {
        let report = CheckReport {
            name: "tally".to_string(),
            path: PathBuf::from("libtally.so"),
            factory: "create_plugin".to_string(),
            destructor: "delete_plugin".to_string(),
            ok: true,
            error: None,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["name"], "tally");
        assert_eq!(json["ok"], true);
        assert!(json.get("error").is_none());
    }
}
