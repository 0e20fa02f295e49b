//! Instrumented plugin interface.
//!
//! A `Tally` is created and destroyed inside a fixture library. Every
//! creation and destruction is counted by statics living in that library,
//! reachable through the vtable.

/// Counters kept by a fixture library, reached from the host.
#[repr(C)]
pub struct TallyVTable {
    /// Record a creation and return the new object's serial number.
    pub on_create: extern "C" fn() -> usize,
    /// Record a destruction.
    pub on_destroy: extern "C" fn(),
    pub live: extern "C" fn() -> usize,
    pub created: extern "C" fn() -> usize,
    pub destroyed: extern "C" fn() -> usize,
}

/// Plugin object produced by the fixture factories.
#[repr(C)]
pub struct Tally {
    serial: usize,
    hits: u64,
    vtable: &'static TallyVTable,
}

impl Tally {
    /// Called inside the plugin; counts the creation.
    pub fn new(vtable: &'static TallyVTable) -> Self {
        let serial = (vtable.on_create)();
        Self {
            serial,
            hits: 0,
            vtable,
        }
    }

    pub fn serial(&self) -> usize {
        self.serial
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn bump(&mut self) -> u64 {
        self.hits += 1;
        self.hits
    }

    /// Counter accessors of the library that created this object.
    ///
    /// Only valid while that library is loaded.
    pub fn probe(&self) -> TallyProbe {
        TallyProbe {
            live: self.vtable.live,
            created: self.vtable.created,
            destroyed: self.vtable.destroyed,
        }
    }
}

impl Drop for Tally {
    fn drop(&mut self) {
        (self.vtable.on_destroy)();
    }
}

/// Snapshot of a fixture library's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TallyCounters {
    pub live: usize,
    pub created: usize,
    pub destroyed: usize,
}

/// Copied counter accessors of a fixture library.
#[derive(Clone, Copy)]
pub struct TallyProbe {
    live: extern "C" fn() -> usize,
    created: extern "C" fn() -> usize,
    destroyed: extern "C" fn() -> usize,
}

impl TallyProbe {
    pub fn counters(&self) -> TallyCounters {
        TallyCounters {
            live: (self.live)(),
            created: (self.created)(),
            destroyed: (self.destroyed)(),
        }
    }
}

/// Define the static vtable and counters of a fixture library.
#[macro_export]
macro_rules! tally_vtable {
    ($name:ident) => {
        static CREATED: ::std::sync::atomic::AtomicUsize = ::std::sync::atomic::AtomicUsize::new(0);
        static DESTROYED: ::std::sync::atomic::AtomicUsize =
            ::std::sync::atomic::AtomicUsize::new(0);

        extern "C" fn tally_on_create() -> usize {
            CREATED.fetch_add(1, ::std::sync::atomic::Ordering::SeqCst) + 1
        }

        extern "C" fn tally_on_destroy() {
            DESTROYED.fetch_add(1, ::std::sync::atomic::Ordering::SeqCst);
        }

        extern "C" fn tally_created() -> usize {
            CREATED.load(::std::sync::atomic::Ordering::SeqCst)
        }

        extern "C" fn tally_destroyed() -> usize {
            DESTROYED.load(::std::sync::atomic::Ordering::SeqCst)
        }

        extern "C" fn tally_live() -> usize {
            // Two separate loads; a destroy in between must not underflow.
            tally_created().saturating_sub(tally_destroyed())
        }

        static $name: $crate::TallyVTable = $crate::TallyVTable {
            on_create: tally_on_create,
            on_destroy: tally_on_destroy,
            live: tally_live,
            created: tally_created,
            destroyed: tally_destroyed,
        };
    };
}
