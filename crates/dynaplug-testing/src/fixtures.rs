//! Building and locating fixture plugin libraries.
//!
//! Fixtures are cdylib workspace members. They are built with the running
//! `cargo` into a dedicated target directory, so a build started from inside
//! `cargo test` does not wait on the outer build's lock.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard};

/// Exports `create_plugin` / `delete_plugin`, plus `make_panicking` / `drop_panicking`.
pub const TALLY: &str = "dynaplug-fixture-tally";
/// Exports `make_it` / `delete_plugin` and `make_nothing` (returns null). No `create_plugin`.
pub const RENAMED: &str = "dynaplug-fixture-renamed";

static BUILT: Lazy<Mutex<HashMap<String, PathBuf>>> = Lazy::new(|| Mutex::new(HashMap::new()));
static EXCLUSIVE: Mutex<()> = parking_lot::const_mutex(());

/// Serialize tests that observe fixture counters.
///
/// A library opened twice in one process shares its statics, so tests
/// asserting on counter deltas must not interleave.
pub fn exclusive() -> MutexGuard<'static, ()> {
    EXCLUSIVE.lock()
}

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

fn target_dir() -> PathBuf {
    workspace_root().join("target").join("dynaplug-fixtures")
}

/// Build a fixture package if needed and return the path of its library.
pub fn fixture_path(package: &str) -> io::Result<PathBuf> {
    let mut built = BUILT.lock();
    if let Some(path) = built.get(package) {
        return Ok(path.clone());
    }

    let cargo = std::env::var_os("CARGO").unwrap_or_else(|| "cargo".into());
    let target = target_dir();
    tracing::debug!("Building fixture {} into {}", package, target.display());

    let status = Command::new(cargo)
        .current_dir(workspace_root())
        .args(["build", "--quiet", "--package", package, "--target-dir"])
        .arg(&target)
        .status()?;
    if !status.success() {
        return Err(io::Error::other(format!(
            "building fixture {} failed with {}",
            package, status
        )));
    }

    let path = target
        .join("debug")
        .join(libloading::library_filename(package.replace('-', "_")));
    if !path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("fixture library not found at {}", path.display()),
        ));
    }

    built.insert(package.to_string(), path.clone());
    Ok(path)
}

/// Check whether the library at `path` is currently mapped into the process.
///
/// Opens with `RTLD_NOLOAD`, which never loads anything; the temporary
/// handle is released again before returning.
#[cfg(unix)]
pub fn is_resident(path: &Path) -> bool {
    // SAFETY: with RTLD_NOLOAD no library is loaded and no initializers run.
    unsafe {
        libloading::os::unix::Library::open(Some(path), libc::RTLD_NOLOAD | libc::RTLD_LAZY)
    }
    .is_ok()
}
