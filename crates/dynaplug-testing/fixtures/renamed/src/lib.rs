//! Fixture plugin whose factory is not named `create_plugin`.

use dynaplug_testing::{tally_vtable, Tally};

tally_vtable!(VTABLE);

dynaplug_core::export_plugin!(
    Tally,
    Tally::new(&VTABLE),
    factory = make_it,
    destructor = delete_plugin
);

/// Factory that never produces an object.
#[no_mangle]
pub extern "C" fn make_nothing() -> *mut Tally {
    std::ptr::null_mut()
}
