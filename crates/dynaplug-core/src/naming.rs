//! Platform shared-library file naming.

use std::ffi::OsString;
use std::path::Path;

/// Extension of shared libraries on the current platform.
pub const LIBRARY_EXTENSION: &str = std::env::consts::DLL_EXTENSION;

/// Map a bare library name to the platform file name
/// (`libfoo.so`, `libfoo.dylib`, `foo.dll`).
pub fn library_filename(name: &str) -> OsString {
    libloading::library_filename(name)
}

/// Check if a file looks like a shared library based on its extension.
pub fn is_library_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext == LIBRARY_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_filename() {
        #[cfg(target_os = "linux")]
        assert_eq!(library_filename("foo"), "libfoo.so");

        #[cfg(target_os = "macos")]
        assert_eq!(library_filename("foo"), "libfoo.dylib");

        #[cfg(windows)]
        assert_eq!(library_filename("foo"), "foo.dll");
    }

    #[test]
    fn test_is_library_file() {
        #[cfg(target_os = "linux")]
        {
            assert!(is_library_file(Path::new("test.so")));
            assert!(!is_library_file(Path::new("test.dylib")));
        }

        #[cfg(target_os = "macos")]
        {
            assert!(is_library_file(Path::new("test.dylib")));
            assert!(!is_library_file(Path::new("test.so")));
        }

        #[cfg(windows)]
        {
            assert!(is_library_file(Path::new("test.dll")));
            assert!(!is_library_file(Path::new("test.so")));
        }

        assert!(!is_library_file(Path::new("plugins.toml")));
        assert!(!is_library_file(Path::new("noext")));
    }
}
