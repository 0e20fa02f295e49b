//! Declarative macros for plugin libraries.

/// Export a factory/destructor pair for a plugin type.
///
/// The factory boxes the value produced by the constructor expression and
/// returns the raw pointer. A panicking constructor yields null instead of
/// unwinding into the host. The destructor reclaims the box and ignores null.
///
/// # Example
///
/// ```rust,ignore
/// #[repr(C)]
/// pub struct Greeter {
///     pub greeting: &'static str,
/// }
///
/// // Exports `create_plugin` and `delete_plugin`
/// dynaplug_core::export_plugin!(Greeter, Greeter { greeting: "hello" });
///
/// // Exports `make_greeter` and `free_greeter`
/// dynaplug_core::export_plugin!(
///     Greeter,
///     Greeter { greeting: "hi" },
///     factory = make_greeter,
///     destructor = free_greeter
/// );
/// ```
#[macro_export]
macro_rules! export_plugin {
    ($ty:ty, $ctor:expr, factory = $create:ident, destructor = $delete:ident $(,)?) => {
        #[no_mangle]
        pub extern "C" fn $create() -> *mut $ty {
            match ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| {
                ::std::boxed::Box::new($ctor)
            })) {
                Ok(boxed) => ::std::boxed::Box::into_raw(boxed),
                Err(_) => ::std::ptr::null_mut(),
            }
        }

        /// # Safety
        ///
        /// `instance` must be null or a pointer returned by the paired factory
        /// that has not been destroyed yet.
        #[no_mangle]
        pub unsafe extern "C" fn $delete(instance: *mut $ty) {
            if !instance.is_null() {
                // SAFETY: upheld by the caller.
                drop(unsafe { ::std::boxed::Box::from_raw(instance) });
            }
        }
    };
    ($ty:ty, $ctor:expr $(,)?) => {
        $crate::export_plugin!($ty, $ctor, factory = create_plugin, destructor = delete_plugin);
    };
}
