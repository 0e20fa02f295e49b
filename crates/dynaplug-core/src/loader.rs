//! Shared-library plugin loader.
//!
//! A [`Loader`] opens a shared library, resolves its factory/destructor pair and
//! hands out [`Instance`]s. The library stays open until the loader and every
//! instance created from it are gone.

use std::fmt;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;

use libloading::Library;

use crate::config::SymbolNames;
use crate::error::{PluginError, Result};
use crate::instance::Instance;

/// Type of the exported factory function.
pub type FactoryFn<T> = unsafe extern "C" fn() -> *mut T;
/// Type of the exported destructor function.
pub type DestructorFn<T> = unsafe extern "C" fn(*mut T);

/// Factory and destructor resolved from the same library. Never split.
pub(crate) struct Entrypoints<T> {
    pub(crate) create: FactoryFn<T>,
    pub(crate) destroy: DestructorFn<T>,
}

/// An open library together with its resolved entry points.
pub(crate) struct LoadedModule<T> {
    pub(crate) entrypoints: Entrypoints<T>,
    pub(crate) symbols: SymbolNames,
    pub(crate) path: PathBuf,
    // Declared last so it is closed after everything else is dropped.
    library: Library,
}

impl<T> Drop for LoadedModule<T> {
    fn drop(&mut self) {
        tracing::info!("Closing library {}", self.path.display());
    }
}

impl<T> fmt::Debug for LoadedModule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModule")
            .field("path", &self.path)
            .field("symbols", &self.symbols)
            .field("library", &self.library)
            .finish()
    }
}

/// A loaded plugin library producing instances of `T`.
///
/// Move-only: the library handle is never duplicated.
///
/// ```compile_fail
/// fn assert_clone<C: Clone>() {}
/// assert_clone::<dynaplug_core::Loader<u32>>();
/// ```
pub struct Loader<T> {
    module: Arc<LoadedModule<T>>,
}

impl<T> Loader<T> {
    /// Load a library exporting `create_plugin` and `delete_plugin`.
    ///
    /// # Safety
    ///
    /// See [`Loader::load_with`].
    pub unsafe fn load(path: impl AsRef<Path>) -> Result<Self> {
        // SAFETY: forwarded to the caller.
        unsafe { Self::load_with(path, &SymbolNames::default()) }
    }

    /// Load a library exporting the factory/destructor pair named by `symbols`.
    ///
    /// The library is opened with lazy binding. If either symbol cannot be
    /// resolved the library is closed again before the error is returned.
    ///
    /// # Safety
    ///
    /// Opening a library runs its initializers. The caller must also guarantee
    /// that the factory symbol really is an `extern "C" fn() -> *mut T` returning
    /// a valid, uniquely owned `T` (or null), and that the destructor symbol is
    /// an `extern "C" fn(*mut T)` releasing exactly what that factory produced.
    pub unsafe fn load_with(path: impl AsRef<Path>, symbols: &SymbolNames) -> Result<Self> {
        let path = path.as_ref();
        symbols.validate()?;

        tracing::debug!("Opening library {}", path.display());
        // SAFETY: forwarded to the caller.
        let library = unsafe { open_library(path) }.map_err(|source| PluginError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;

        // On failure `library` is dropped here, closing the handle.
        // SAFETY: the caller vouches for the symbol types.
        let create: FactoryFn<T> = unsafe { resolve(&library, &symbols.factory, path) }?;
        // SAFETY: as above.
        let destroy: DestructorFn<T> = unsafe { resolve(&library, &symbols.destructor, path) }?;

        tracing::info!(
            "Loaded plugin library {} ({} / {})",
            path.display(),
            symbols.factory,
            symbols.destructor
        );

        Ok(Self {
            module: Arc::new(LoadedModule {
                entrypoints: Entrypoints { create, destroy },
                symbols: symbols.clone(),
                path: path.to_path_buf(),
                library,
            }),
        })
    }

    /// Call the factory and wrap the new object.
    ///
    /// Fails with [`PluginError::NullInstance`] when the factory returns null.
    pub fn instantiate(&self) -> Result<Instance<T>> {
        let create = self.module.entrypoints.create;
        // SAFETY: the signature was vouched for in `load_with` and the library
        // is held open by `self.module`.
        let raw = unsafe { create() };

        match NonNull::new(raw) {
            Some(ptr) => {
                tracing::debug!(
                    "Created instance {:p} from {}",
                    raw,
                    self.module.path.display()
                );
                Ok(Instance::new(ptr, Arc::clone(&self.module)))
            }
            None => {
                tracing::warn!(
                    "Factory '{}' in {} returned null",
                    self.module.symbols.factory,
                    self.module.path.display()
                );
                Err(PluginError::NullInstance {
                    symbol: self.module.symbols.factory.clone(),
                    path: self.module.path.clone(),
                })
            }
        }
    }

    /// Path the library was loaded from.
    pub fn path(&self) -> &Path {
        &self.module.path
    }

    /// Symbol names the entry points were resolved from.
    pub fn symbols(&self) -> &SymbolNames {
        &self.module.symbols
    }

    /// Number of live instances keeping the library loaded.
    pub fn outstanding(&self) -> usize {
        Arc::strong_count(&self.module) - 1
    }
}

#[cfg(all(test, unix))]
impl<T> Loader<T> {
    /// Loader over in-process entry points, backed by a handle to the test binary.
    pub(crate) fn from_entrypoints(create: FactoryFn<T>, destroy: DestructorFn<T>) -> Self {
        let library = Library::from(libloading::os::unix::Library::this());
        Self {
            module: Arc::new(LoadedModule {
                entrypoints: Entrypoints { create, destroy },
                symbols: SymbolNames::default(),
                path: PathBuf::from("<self>"),
                library,
            }),
        }
    }
}

impl<T> Drop for Loader<T> {
    fn drop(&mut self) {
        let outstanding = self.outstanding();
        if outstanding > 0 {
            tracing::warn!(
                "Loader for {} dropped with {} live instance(s); library stays loaded until they are dropped",
                self.module.path.display(),
                outstanding
            );
        }
    }
}

impl<T> fmt::Debug for Loader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("path", &self.module.path)
            .field("symbols", &self.module.symbols)
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

/// Open `path` with lazy symbol binding.
///
/// # Safety
///
/// Runs the library's initializers.
unsafe fn open_library(path: &Path) -> std::result::Result<Library, libloading::Error> {
    #[cfg(unix)]
    {
        use libloading::os::unix::{Library as UnixLibrary, RTLD_LAZY, RTLD_LOCAL};
        // SAFETY: forwarded to the caller.
        unsafe { UnixLibrary::open(Some(path), RTLD_LAZY | RTLD_LOCAL) }.map(Library::from)
    }

    #[cfg(not(unix))]
    {
        // SAFETY: forwarded to the caller.
        unsafe { Library::new(path) }
    }
}

/// Resolve `symbol` as a function pointer of type `F`.
///
/// A symbol whose address is null counts as missing.
///
/// # Safety
///
/// `F` must be a function pointer type matching the exported symbol, and the
/// returned pointer must not be called after `library` is closed.
unsafe fn resolve<F: Copy>(library: &Library, symbol: &str, path: &Path) -> Result<F> {
    let missing = |source| PluginError::SymbolMissing {
        symbol: symbol.to_string(),
        path: path.to_path_buf(),
        source,
    };

    // `Option<fn>` has the same layout as `fn`, with null mapping to `None`.
    // SAFETY: forwarded to the caller.
    let found = unsafe { library.get::<Option<F>>(symbol.as_bytes()) }
        .map(|sym| *sym)
        .map_err(|e| missing(Some(e)))?;

    tracing::debug!("Resolved '{}' in {}", symbol, path.display());
    found.ok_or_else(|| missing(None))
}

#[cfg(test)]
mod tests {
    use std::ffi::c_void;

    use super::*;

    #[test]
    fn test_load_nonexistent_path() {
        let path = "/nonexistent/dir/libdynaplug_missing.so";
        // SAFETY: the library does not exist, nothing is executed.
        let err = unsafe { Loader::<c_void>::load(path) }.unwrap_err();

        assert!(matches!(err, PluginError::OpenFailed { .. }));
        assert!(err.to_string().contains(path));
    }

    #[test]
    fn test_clashing_symbols_rejected_before_open() {
        let symbols = SymbolNames::new("same", "same");
        // SAFETY: rejected before the library is opened.
        let err = unsafe { Loader::<c_void>::load_with("/nonexistent/libx.so", &symbols) }
            .unwrap_err();

        assert!(matches!(err, PluginError::SymbolClash { .. }));
    }

    #[test]
    fn test_empty_symbol_rejected() {
        let symbols = SymbolNames::default().with_destructor("");
        // SAFETY: rejected before the library is opened.
        let err = unsafe { Loader::<c_void>::load_with("/nonexistent/libx.so", &symbols) }
            .unwrap_err();

        assert!(matches!(err, PluginError::InvalidSymbol { .. }));
    }
}
