//! Switching the active security method.
//!
//! A switch is all-or-nothing: the new backend is opened first, and only once
//! that succeeds is it installed and the old backend closed. A failed open
//! leaves the previous method active and fully usable.
//!
//! Requesting the method that is already active is not a no-op. The library
//! is opened again and the old handle closed, so a backend's load-time
//! initialization runs on every request.

use std::fmt;

use tracing::{debug, error, info, warn};

use crate::{
    loader::{BackendLoader, LoadError, UnloadError},
    registry::MethodId,
    state::MethodState,
};

/// Owns a loader and the active method state.
pub struct MethodSwitcher<L: BackendLoader> {
    loader: L,
    state: MethodState<L::Handle>,
}

impl<L: BackendLoader> MethodSwitcher<L> {
    /// Creates a switcher with the default method ([`MethodId::None`])
    /// already loaded.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the default backend cannot be loaded.
    pub fn new(loader: L) -> Result<Self, LoadError> {
        let method = MethodId::default();
        let handle = loader.open(method.library_name())?;
        info!(method = %method, "Security method initialized");

        Ok(Self {
            loader,
            state: MethodState::new(method, handle),
        })
    }

    /// The method installed by the most recent successful switch.
    #[must_use]
    pub fn current(&self) -> MethodId {
        self.state.current()
    }

    /// Handle of the library backing [`Self::current`].
    #[must_use]
    pub fn active_backend(&self) -> &L::Handle {
        self.state.handle()
    }

    #[must_use]
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Switches to `requested`, loading its backend and unloading the
    /// previous one.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the requested backend cannot be loaded. The
    /// active method is unchanged in that case.
    ///
    /// # Panics
    ///
    /// Panics if the superseded backend cannot be unloaded. That handle was
    /// owned exclusively by this switcher, so a failure means the handle
    /// bookkeeping is broken.
    pub fn set_method(&mut self, requested: MethodId) -> Result<(), LoadError> {
        let library = requested.library_name();
        let previous_method = self.state.current();
        debug!(from = %previous_method, to = %requested, library, "Switching security method");

        let handle = match self.loader.open(library) {
            Ok(handle) => handle,
            Err(e) => {
                warn!(
                    method = %requested,
                    active = %previous_method,
                    error = %e,
                    "Security method switch failed, keeping active method"
                );
                return Err(e);
            }
        };

        let previous = self.state.install(requested, handle);
        if let Err(e) = self.loader.close(previous) {
            error!(method = %previous_method, error = %e, "Failed to unload superseded backend");
            panic!("security backend handle for `{previous_method}` could not be released: {e}");
        }

        info!(from = %previous_method, to = %requested, "Security method switched");
        Ok(())
    }

    /// Unloads the active backend.
    ///
    /// # Errors
    ///
    /// Returns [`UnloadError`] if the platform loader fails to close it.
    pub fn shutdown(self) -> Result<(), UnloadError> {
        let Self { loader, state } = self;
        let method = state.current();
        debug!(method = %method, "Shutting down security method");
        loader.close(state.into_handle())
    }
}

impl<L: BackendLoader> fmt::Debug for MethodSwitcher<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodSwitcher")
            .field("current", &self.current())
            .finish_non_exhaustive()
    }
}
