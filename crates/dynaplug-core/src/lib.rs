//! Runtime loading of factory/destructor plugins from shared libraries.
//!
//! A plugin library exports two functions:
//!
//! - a factory, `extern "C" fn() -> *mut T` (default name `create_plugin`)
//! - a destructor, `extern "C" fn(*mut T)` (default name `delete_plugin`)
//!
//! [`Loader`] opens the library and resolves both. [`Instance`] owns one object
//! produced by the factory and hands it back to the destructor when dropped.
//!
//! ```rust,no_run
//! use dynaplug_core::{Loader, SymbolNames};
//!
//! #[repr(C)]
//! struct Greeter {
//!     greeting: *const std::ffi::c_char,
//! }
//!
//! # fn main() -> dynaplug_core::Result<()> {
//! // SAFETY: libgreeter.so exports the pair for `Greeter`.
//! let loader = unsafe { Loader::<Greeter>::load("./libgreeter.so")? };
//! let greeter = loader.instantiate()?;
//! println!("{:p}", greeter.greeting);
//!
//! let symbols = SymbolNames::default().with_factory("make_it");
//! // SAFETY: as above.
//! let renamed = unsafe { Loader::<Greeter>::load_with("./librenamed.so", &symbols)? };
//! # drop(renamed);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod instance;
pub mod loader;
#[macro_use]
pub mod macros;
pub mod naming;

pub use config::{PluginEntry, PluginManifest, SymbolNames};
pub use error::{ConfigError, PluginError, Result};
pub use instance::Instance;
pub use loader::{DestructorFn, FactoryFn, Loader};
pub use naming::{is_library_file, library_filename};

/// Re-exports commonly used types.
pub mod prelude {
    pub use crate::config::{defaults, PluginManifest, SymbolNames};
    pub use crate::error::{PluginError, Result};
    pub use crate::instance::Instance;
    pub use crate::loader::Loader;
}
