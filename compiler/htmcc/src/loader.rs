//! Artifact loader.
//!
//! Opens a built shared object, resolves `htmc_main`, and calls it with a
//! capability table. This is the only module in the driver that crosses the
//! C ABI; it never looks at the translated code itself.

#![allow(
    unsafe_code,
    reason = "dlopen/dlsym/dlclose and the entry point call are C ABI operations"
)]

use std::ffi::{c_void, CStr, CString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use htmc_rt::{Backend, CapabilityTable, EntryFn, ENTRY_SYMBOL};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("artifact '{}' not found", path.display())]
    NotFound { path: PathBuf },

    #[error("cannot load artifact '{}': {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    #[error("artifact '{}' does not export `{symbol}`", path.display())]
    MissingEntry { path: PathBuf, symbol: String },
}

/// A loaded artifact. Unloaded on drop.
#[derive(Debug)]
pub struct Artifact {
    handle: NonNull<c_void>,
    entry: EntryFn,
    path: PathBuf,
}

impl Artifact {
    /// Load the shared object at `path` and resolve its entry point.
    ///
    /// Relative paths are made absolute first so the dynamic loader never
    /// searches the library path for them.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = absolute(path.as_ref());
        if !path.is_file() {
            return Err(LoadError::NotFound { path });
        }

        let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| LoadError::Open {
            path: path.clone(),
            reason: "path contains a NUL byte".to_string(),
        })?;

        // SAFETY: c_path is a valid C string. Loading runs the object's
        // initializers; artifacts are built by this driver.
        let raw = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        let Some(handle) = NonNull::new(raw) else {
            return Err(LoadError::Open {
                path,
                reason: last_dl_error(),
            });
        };

        let symbol = CString::new(ENTRY_SYMBOL).map_err(|_| LoadError::MissingEntry {
            path: path.clone(),
            symbol: ENTRY_SYMBOL.to_string(),
        })?;

        // SAFETY: handle came from a successful dlopen.
        let sym = unsafe { libc::dlsym(handle.as_ptr(), symbol.as_ptr()) };
        if sym.is_null() {
            // SAFETY: handle is open and not used afterwards.
            unsafe { libc::dlclose(handle.as_ptr()) };
            return Err(LoadError::MissingEntry {
                path,
                symbol: ENTRY_SYMBOL.to_string(),
            });
        }

        // SAFETY: every artifact defines `int htmc_main(htmc_handover_t *)`
        // from the translated header, matching EntryFn.
        let entry = unsafe { std::mem::transmute::<*mut c_void, EntryFn>(sym) };

        tracing::debug!(path = %path.display(), "artifact loaded");
        Ok(Self {
            handle,
            entry,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Call the entry point with `table`, then run the table's cleanup once.
    ///
    /// Returns the entry point's status unchanged.
    pub fn run<B: Backend>(&self, table: &mut CapabilityTable<B>) -> i32 {
        let raw = table.as_raw_ptr();
        // SAFETY: `raw` points into `table`, which outlives the call; the
        // entry point only uses it through the glue.
        let status = unsafe { (self.entry)(raw) };
        table.cleanup();
        tracing::debug!(status, path = %self.path.display(), "entry point returned");
        status
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        // SAFETY: handle came from dlopen and is closed exactly once.
        if unsafe { libc::dlclose(self.handle.as_ptr()) } != 0 {
            tracing::warn!(path = %self.path.display(), error = %last_dl_error(), "dlclose failed");
        }
    }
}

/// Load `path`, run it with `table`, and unload it.
pub fn run_artifact<B: Backend>(
    path: impl AsRef<Path>,
    table: &mut CapabilityTable<B>,
) -> Result<i32, LoadError> {
    let artifact = Artifact::load(path)?;
    Ok(artifact.run(table))
}

fn last_dl_error() -> String {
    // SAFETY: dlerror returns null or a NUL-terminated message valid until
    // the next dl* call on this thread.
    unsafe {
        let msg = libc::dlerror();
        if msg.is_null() {
            "unknown dynamic loader error".to_string()
        } else {
            CStr::from_ptr(msg).to_string_lossy().into_owned()
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => Path::new(".").join(path),
    }
}

#[cfg(test)]
mod tests;
