//! Dynamic library loading for security backends.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use libloading::Library;
use sspl_sec_abi::{BackendModuleFn, SEC_ABI_VERSION, SEC_BACKEND_SYMBOL, SecBackendModule};
use tracing::{debug, info};

use crate::registry::{LIBRARY_FAMILY, LIBRARY_MAJOR_VERSION};

/// Errors that can occur when opening a backend library.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadError {
    /// The platform loader could not open the library (missing file,
    /// unresolved dependency, wrong architecture, ...).
    #[error("failed to load library {name}: {reason}")]
    LibraryLoad { name: String, reason: String },

    /// The library does not export the backend root symbol.
    #[error("library {name} does not export `{symbol}`: {reason}")]
    MissingSymbol {
        name: String,
        symbol: &'static str,
        reason: String,
    },

    /// ABI version mismatch.
    #[error("ABI version mismatch: expected {expected}, got {actual}")]
    AbiMismatch { expected: u32, actual: u32 },

    /// The exported module table is unusable.
    #[error("invalid backend module in {name}: {reason}")]
    InvalidModule { name: String, reason: String },
}

/// Closing a handle through the platform loader failed.
///
/// The handle has already been consumed, so there is no way to retry.
#[derive(Debug, thiserror::Error)]
#[error("failed to unload library {name}: {reason}")]
pub struct UnloadError {
    pub name: String,
    pub reason: String,
}

/// An opened backend library.
pub trait LoadedBackend {
    /// Name the library was requested under (e.g., `sspl_pki.so.0`).
    fn library_name(&self) -> &str;

    /// File name of the artifact the platform loader actually mapped.
    ///
    /// Only meant for verification; control flow never depends on it.
    fn resolved_name(&self) -> Option<String>;
}

/// Opens and closes backend libraries.
///
/// `close` takes the handle by value, so a closed handle can never be used
/// again.
pub trait BackendLoader {
    type Handle: LoadedBackend;

    /// Loads the library called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the library cannot be opened or is not a
    /// compatible backend. Nothing stays loaded on failure.
    fn open(&self, name: &str) -> Result<Self::Handle, LoadError>;

    /// Unloads the library behind `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`UnloadError`] if the platform loader reports a failure.
    fn close(&self, handle: Self::Handle) -> Result<(), UnloadError>;
}

/// A loaded backend library.
///
/// Owns the platform handle. Dropping it unloads the library, and every
/// reference into the library it hands out is tied to its lifetime.
pub struct BackendLibrary {
    library: Library,
    module_fn: BackendModuleFn,
    name: String,
    path: PathBuf,
}

impl BackendLibrary {
    /// Function table exported by the backend.
    #[must_use]
    pub fn module(&self) -> &SecBackendModule {
        (self.module_fn)()
    }

    /// Path handed to the platform loader.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for BackendLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendLibrary")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl LoadedBackend for BackendLibrary {
    fn library_name(&self) -> &str {
        &self.name
    }

    #[cfg(unix)]
    fn resolved_name(&self) -> Option<String> {
        use std::{ffi::CStr, mem::MaybeUninit, os::unix::ffi::OsStrExt};

        let mut info = MaybeUninit::<libc::Dl_info>::zeroed();
        let address = self.module_fn as *const libc::c_void;
        // SAFETY: `address` points into the library we hold open, and dladdr
        // only writes into `info`.
        let found = unsafe { libc::dladdr(address, info.as_mut_ptr()) };
        if found == 0 {
            return None;
        }
        // SAFETY: dladdr returned non-zero, so it initialized `info`.
        let info = unsafe { info.assume_init() };
        if info.dli_fname.is_null() {
            return None;
        }
        // SAFETY: dli_fname is a NUL-terminated string owned by the dynamic
        // linker and valid while the library stays loaded.
        let path = unsafe { CStr::from_ptr(info.dli_fname) };
        Path::new(std::ffi::OsStr::from_bytes(path.to_bytes()))
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }

    #[cfg(not(unix))]
    fn resolved_name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }
}

/// Loads backends through the platform dynamic loader.
///
/// Without a search directory, names go to the platform search
/// (`LD_LIBRARY_PATH`, the linker cache, ...).
#[derive(Debug, Clone, Default)]
pub struct DynamicLoader {
    search_dir: Option<PathBuf>,
}

impl DynamicLoader {
    #[must_use]
    pub const fn new(search_dir: Option<PathBuf>) -> Self {
        Self { search_dir }
    }

    #[must_use]
    pub fn search_dir(&self) -> Option<&Path> {
        self.search_dir.as_deref()
    }

    fn library_path(&self, name: &str) -> PathBuf {
        match &self.search_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}

/// Method part of a versioned backend library name
/// (`sspl_pki.so.0` -> `pki`), if `name` follows the convention.
fn method_in_library_name(name: &str) -> Option<&str> {
    let file = Path::new(name).file_name()?.to_str()?;
    let suffix = format!(".so.{LIBRARY_MAJOR_VERSION}");
    file.strip_prefix(LIBRARY_FAMILY)?
        .strip_prefix('_')?
        .strip_suffix(suffix.as_str())
}

/// Checks the module table a library exported before it is used.
///
/// Libraries named after a method must report that method, so a mis-staged
/// artifact is never installed under the wrong [`MethodId`].
///
/// [`MethodId`]: crate::MethodId
fn validate_module(name: &str, module: &SecBackendModule) -> Result<(), LoadError> {
    if module.abi_version != SEC_ABI_VERSION {
        return Err(LoadError::AbiMismatch {
            expected: SEC_ABI_VERSION,
            actual: module.abi_version,
        });
    }

    let method = module.method_name.as_str();
    if method.is_empty() {
        return Err(LoadError::InvalidModule {
            name: name.to_string(),
            reason: "empty method name".to_string(),
        });
    }
    if let Some(expected) = method_in_library_name(name)
        && expected != method
    {
        return Err(LoadError::InvalidModule {
            name: name.to_string(),
            reason: format!("exports method `{method}`, expected `{expected}`"),
        });
    }

    Ok(())
}

impl BackendLoader for DynamicLoader {
    type Handle = BackendLibrary;

    fn open(&self, name: &str) -> Result<BackendLibrary, LoadError> {
        let path = self.library_path(name);
        info!(library = %name, path = %path.display(), "Loading security backend");

        // SAFETY: backend libraries run no initializers beyond those of the
        // Rust runtime; loading is the trust decision made by the operator who
        // installed them.
        let library = unsafe { Library::new(&path) }.map_err(|e| LoadError::LibraryLoad {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        // SAFETY: the symbol is declared by `export_backend!` with exactly the
        // `BackendModuleFn` signature.
        let module_fn = unsafe { library.get::<BackendModuleFn>(SEC_BACKEND_SYMBOL.as_bytes()) }
            .map(|symbol| *symbol)
            .map_err(|e| LoadError::MissingSymbol {
                name: name.to_string(),
                symbol: SEC_BACKEND_SYMBOL,
                reason: e.to_string(),
            })?;

        let module = module_fn();
        validate_module(name, module)?;

        debug!(
            library = %name,
            method = %module.method_name.as_str(),
            sig_length = (module.sig_length)(),
            token_length = (module.token_length)(),
            "Backend loaded successfully"
        );

        Ok(BackendLibrary {
            library,
            module_fn,
            name: name.to_string(),
            path,
        })
    }

    fn close(&self, handle: BackendLibrary) -> Result<(), UnloadError> {
        let BackendLibrary { library, name, .. } = handle;
        info!(library = %name, "Unloading security backend");
        library
            .close()
            .map_err(|e| UnloadError {
                name,
                reason: e.to_string(),
            })
    }
}
