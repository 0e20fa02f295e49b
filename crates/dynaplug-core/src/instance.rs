//! Owned plugin objects.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::loader::LoadedModule;

/// An object created by a plugin factory.
///
/// Dropping it calls the paired destructor exactly once. Each instance keeps
/// the library it came from loaded, so it may outlive its [`Loader`].
///
/// Instances cannot be cloned:
///
/// ```compile_fail
/// fn assert_clone<C: Clone>() {}
/// assert_clone::<dynaplug_core::Instance<u32>>();
/// ```
///
/// [`Loader`]: crate::Loader
pub struct Instance<T> {
    ptr: NonNull<T>,
    module: Arc<LoadedModule<T>>,
}

// SAFETY: an instance uniquely owns its object, like `Box<T>`.
unsafe impl<T: Send> Send for Instance<T> {}
// SAFETY: shared access only hands out `&T`.
unsafe impl<T: Sync> Sync for Instance<T> {}

impl<T> Instance<T> {
    pub(crate) fn new(ptr: NonNull<T>, module: Arc<LoadedModule<T>>) -> Self {
        Self { ptr, module }
    }

    /// Raw pointer to the object. Ownership stays with the instance.
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Path of the library that created this object.
    pub fn library_path(&self) -> &Path {
        &self.module.path
    }

    /// Destroy the object now.
    ///
    /// Takes `self` by value, so an instance cannot be disposed twice:
    ///
    /// ```compile_fail
    /// fn dispose_twice(instance: dynaplug_core::Instance<u32>) {
    ///     instance.dispose();
    ///     instance.dispose();
    /// }
    /// ```
    pub fn dispose(self) {
        drop(self);
    }
}

impl<T> Deref for Instance<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: non-null, produced by the factory and alive until drop.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> DerefMut for Instance<T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as in `deref`, and `&mut self` guarantees exclusivity.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T> Drop for Instance<T> {
    fn drop(&mut self) {
        let destroy = self.module.entrypoints.destroy;
        tracing::debug!(
            "Destroying instance {:p} via '{}'",
            self.ptr,
            self.module.symbols.destructor
        );
        // SAFETY: the pointer came from the paired factory, is destroyed only
        // here, and `self.module` keeps the library loaded for this call.
        unsafe { destroy(self.ptr.as_ptr()) };
    }
}

impl<T> fmt::Debug for Instance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("ptr", &self.ptr)
            .field("library", &self.module.path)
            .finish()
    }
}
