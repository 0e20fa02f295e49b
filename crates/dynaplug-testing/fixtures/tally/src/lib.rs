//! Fixture plugin exporting the default factory/destructor pair.

use dynaplug_testing::{tally_vtable, Tally};

tally_vtable!(VTABLE);

fn build_panicking() -> Tally {
    panic!("fixture constructor failure")
}

dynaplug_core::export_plugin!(Tally, Tally::new(&VTABLE));

dynaplug_core::export_plugin!(
    Tally,
    build_panicking(),
    factory = make_panicking,
    destructor = drop_panicking
);
