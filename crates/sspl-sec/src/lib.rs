//! Runtime-selectable security backends for SSPL.
//!
//! A process picks which security method backs its signing and verification
//! operations at runtime. Each method lives in its own shared library
//! (`sspl_none.so.0`, `sspl_pki.so.0`); switching methods loads the new
//! library, makes it active, and unloads the old one.
//!
//! # Key Components
//!
//! - **Method Registry**: [`MethodId`] and the library name backing each
//!   method ([`MethodId::library_name`], [`REGISTRY`])
//! - **Library Loading**: [`BackendLoader`] with the platform implementation
//!   [`DynamicLoader`], producing owned [`BackendLibrary`] handles
//! - **Method State**: [`MethodState`], the active `(method, handle)` pair
//! - **Switching**: [`MethodSwitcher`], the all-or-nothing switch
//! - **Process-wide access**: [`global`], one lazily initialized switcher
//!   behind a mutex
//!
//! # Example
//!
//! ```no_run
//! use sspl_sec::{MethodId, SecurityBackend, global};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! assert_eq!(global::get_method()?, MethodId::None);
//!
//! global::set_method(MethodId::Pki)?;
//! let sig_length = global::with_backend(|_, backend| backend.sig_length())?;
//! println!("pki signatures are {sig_length} bytes");
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! [`MethodSwitcher`] needs `&mut self` to switch and is meant to have a
//! single owner. The [`global`] module serializes every switch and read
//! behind one lock.

mod backend;
mod config;
mod loader;
mod registry;
mod state;
mod switcher;

pub mod global;

/// Security operations against a loaded backend.
pub use backend::{BackendError, SecurityBackend};
/// Configuration file resolution and parsing.
pub use config::{
    BACKEND_DIR_ENV, CONFIG_DIR_NAME, CONFIG_ENV, CONFIG_FILE_NAME, ConfigError, SecConfig,
};
/// Backend library loading.
pub use loader::{
    BackendLibrary, BackendLoader, DynamicLoader, LoadError, LoadedBackend, UnloadError,
};
/// Method identifiers and their libraries.
pub use registry::{
    LIBRARY_FAMILY, LIBRARY_MAJOR_VERSION, MethodId, REGISTRY, RegistryEntry, UnknownMethod,
};
pub use sspl_sec_abi::SecResult;
pub use state::MethodState;
pub use switcher::MethodSwitcher;
