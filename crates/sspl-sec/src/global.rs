//! Process-wide security method.
//!
//! Wraps one [`MethodSwitcher`] over the [`DynamicLoader`] behind a mutex.
//! The switcher is created on first use, which eagerly loads the "none"
//! backend. Every switch runs entirely under the lock, and so does every
//! read, so callers never observe a method paired with the wrong library.

use parking_lot::{Mutex, MutexGuard, const_mutex};
use tracing::info;

use crate::{
    config::SecConfig,
    loader::{BackendLibrary, DynamicLoader, LoadError, LoadedBackend, UnloadError},
    registry::MethodId,
    switcher::MethodSwitcher,
};

/// Errors from the process-wide entry points.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GlobalError {
    /// A backend could not be loaded. The active method is unchanged.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The active backend could not be unloaded during shutdown.
    #[error(transparent)]
    Unload(#[from] UnloadError),

    /// [`configure`] was called after the first backend was loaded.
    #[error("security method already initialized")]
    AlreadyInitialized,
}

struct Global {
    loader: DynamicLoader,
    switcher: Option<MethodSwitcher<DynamicLoader>>,
}

impl Global {
    fn switcher(&mut self) -> Result<&mut MethodSwitcher<DynamicLoader>, LoadError> {
        let switcher = match self.switcher.take() {
            Some(switcher) => switcher,
            None => MethodSwitcher::new(self.loader.clone())?,
        };
        Ok(self.switcher.insert(switcher))
    }
}

static GLOBAL: Mutex<Global> = const_mutex(Global {
    loader: DynamicLoader::new(None),
    switcher: None,
});

fn lock() -> MutexGuard<'static, Global> {
    GLOBAL.lock()
}

/// Applies `config` and initializes the process-wide method.
///
/// Loads the default backend from `config.backend_dir`, then switches to
/// `config.default_method` if that is not the default.
///
/// # Errors
///
/// Returns [`GlobalError::AlreadyInitialized`] if a backend is already
/// loaded, or [`GlobalError::Load`] if a backend cannot be loaded. A failed
/// default load leaves the process uninitialized, so `configure` may be
/// retried. A failed switch to `default_method` leaves the default method
/// active.
pub fn configure(config: &SecConfig) -> Result<(), GlobalError> {
    let mut global = lock();
    if global.switcher.is_some() {
        return Err(GlobalError::AlreadyInitialized);
    }

    global.loader = DynamicLoader::new(config.backend_dir.clone());
    info!(
        backend_dir = ?config.backend_dir,
        default_method = %config.default_method,
        "Configuring security method"
    );
    let switcher = global.switcher()?;
    if config.default_method != MethodId::default() {
        switcher.set_method(config.default_method)?;
    }
    Ok(())
}

/// The currently active method.
///
/// # Errors
///
/// Returns [`GlobalError::Load`] only if this is the first use and the
/// default backend cannot be loaded.
pub fn get_method() -> Result<MethodId, GlobalError> {
    Ok(lock().switcher()?.current())
}

/// Switches the process to `method`.
///
/// # Errors
///
/// Returns [`GlobalError::Load`] if the backend cannot be loaded. The
/// previous method stays active.
///
/// # Panics
///
/// Panics if the superseded backend cannot be unloaded; see
/// [`MethodSwitcher::set_method`].
pub fn set_method(method: MethodId) -> Result<(), GlobalError> {
    lock().switcher()?.set_method(method)?;
    Ok(())
}

/// Runs `f` against the active backend while holding the lock.
///
/// The lock is not reentrant: `f` must not call back into this module
/// (`get_method`, `set_method`, ...), or the calling thread deadlocks.
///
/// # Errors
///
/// Returns [`GlobalError::Load`] only if this is the first use and the
/// default backend cannot be loaded.
pub fn with_backend<R>(f: impl FnOnce(MethodId, &BackendLibrary) -> R) -> Result<R, GlobalError> {
    let mut global = lock();
    let switcher = global.switcher()?;
    Ok(f(switcher.current(), switcher.active_backend()))
}

/// File name of the artifact backing the active method.
///
/// # Errors
///
/// Same as [`get_method`].
pub fn resolved_name() -> Result<Option<String>, GlobalError> {
    with_backend(|_, backend| backend.resolved_name())
}

/// Unloads the active backend and returns to the uninitialized state.
///
/// The next call to any other function here loads the default backend again.
///
/// # Errors
///
/// Returns [`GlobalError::Unload`] if the platform loader fails to close the
/// backend.
pub fn shutdown() -> Result<(), GlobalError> {
    let switcher = lock().switcher.take();
    if let Some(switcher) = switcher {
        switcher.shutdown()?;
    }
    Ok(())
}
