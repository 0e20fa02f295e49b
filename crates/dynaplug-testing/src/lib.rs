//! Test support for dynaplug.
//!
//! Provides the `Tally` interface shared by the fixture plugins and the host
//! tests, plus helpers that build the fixture libraries on demand.

pub mod fixtures;
pub mod tally;

pub use fixtures::{exclusive, fixture_path, RENAMED, TALLY};
#[cfg(unix)]
pub use fixtures::is_resident;
pub use tally::{Tally, TallyCounters, TallyProbe, TallyVTable};
