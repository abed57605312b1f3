//! # SSPL Security Backend SDK
//!
//! A backend is a `cdylib` that implements one security method. The host
//! loads it by its versioned library name (`sspl_<method>.so.<major>`) and
//! calls it through the function table defined in `sspl_sec_abi`.
//!
//! ## Defining a Backend
//!
//! ```ignore
//! use sspl_sec_backend::{Backend, BackendError};
//!
//! struct NoneBackend;
//!
//! impl Backend for NoneBackend {
//!     const METHOD_NAME: &'static str = "none";
//!     const SIG_LENGTH: u32 = 0;
//!     const TOKEN_LENGTH: u32 = 0;
//!     // ...
//! }
//!
//! sspl_sec_backend::export_backend!(NoneBackend);
//! ```
//!
//! The macro generates the `extern "C"` shims and the exported
//! `sspl_sec_backend_module` symbol. Errors returned from trait methods are
//! mapped onto [`SecResult`] codes with the error's display text as the
//! message.

use std::time::Duration;

// Allow macro expansions within this crate to refer to it via `::sspl_sec_backend`.
extern crate self as sspl_sec_backend;

pub use sspl_sec_abi::{SEC_ABI_VERSION, SecResult};
pub use tracing::{debug, error, info, trace, warn};

/// Error returned by a backend operation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BackendError {
    /// Malformed input (wrong token length, bad key bytes, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The session token is past its expiry.
    #[error("session token expired")]
    Expired,

    /// The signature does not match the message.
    #[error("signature verification failed")]
    VerifyFailed,

    /// Any other failure inside the backend.
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// ABI result code for this error.
    #[must_use]
    pub const fn code(&self) -> SecResult {
        match self {
            Self::InvalidInput(_) => SecResult::InvalidInput,
            Self::Expired => SecResult::Expired,
            Self::VerifyFailed => SecResult::VerifyFailed,
            Self::Other(_) => SecResult::Error,
        }
    }
}

/// A security method implementation.
///
/// All functions are associated functions: a backend library is loaded and
/// unloaded as a whole, so any state it keeps lives in statics that are
/// reinitialized on every load.
pub trait Backend {
    /// Method name reported to the host (e.g., "pki").
    const METHOD_NAME: &'static str;

    /// Length of a signature produced by [`Backend::sign_message`].
    const SIG_LENGTH: u32;

    /// Length of a token produced by [`Backend::generate_session_token`].
    const TOKEN_LENGTH: u32;

    /// Derives a session token from long-lived credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are malformed.
    fn generate_session_token(
        username: &str,
        authn_token: &[u8],
        session_length: Duration,
    ) -> Result<Vec<u8>, BackendError>;

    /// Signs `message` on behalf of `username`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session token is malformed or expired.
    fn sign_message(
        message: &[u8],
        username: &str,
        session_token: &[u8],
    ) -> Result<Vec<u8>, BackendError>;

    /// Verifies a signature produced by [`Backend::sign_message`].
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::VerifyFailed`] if the signature does not match.
    fn verify_message(
        message: &[u8],
        username: &str,
        signature: &[u8],
        verifier_key: &[u8],
    ) -> Result<(), BackendError>;

    /// Derives the key a verifier needs for signatures made with
    /// `session_token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session token is malformed.
    fn verifier_key(session_token: &[u8]) -> Result<Vec<u8>, BackendError>;
}

#[doc(hidden)]
pub mod __private {
    pub use sspl_sec_abi as abi;

    use abi::{SecOutput, abi_stable::std_types::RVec};

    pub use crate::{Backend, BackendError};

    /// Converts a backend result into the ABI output type.
    #[must_use]
    pub fn into_output(result: Result<Vec<u8>, BackendError>) -> SecOutput {
        match result {
            Ok(bytes) => SecOutput::ok(RVec::from(bytes)),
            Err(e) => {
                crate::debug!(error = %e, "backend operation failed");
                SecOutput::error(e.code(), &e.to_string())
            }
        }
    }

    #[must_use]
    pub fn session_length(secs: u64) -> std::time::Duration {
        std::time::Duration::from_secs(secs)
    }
}

/// Generates the exported `sspl_sec_backend_module` symbol for a [`Backend`]
/// implementation. Invoke exactly once per backend library.
#[macro_export]
macro_rules! export_backend {
    ($backend:ty) => {
        mod __sspl_sec_entrypoint {
            use super::*;
            use ::sspl_sec_backend::__private::{Backend, abi, into_output, session_length};
            use abi::abi_stable::std_types::RStr;

            static MODULE: abi::SecBackendModule = abi::SecBackendModule {
                abi_version: abi::SEC_ABI_VERSION,
                method_name: RStr::from_str(<$backend as Backend>::METHOD_NAME),
                sig_length,
                token_length,
                generate_session_token,
                sign_message,
                verify_message,
                verifier_key,
            };

            #[unsafe(no_mangle)]
            pub extern "C" fn sspl_sec_backend_module() -> &'static abi::SecBackendModule {
                &MODULE
            }

            extern "C" fn sig_length() -> u32 {
                <$backend as Backend>::SIG_LENGTH
            }

            extern "C" fn token_length() -> u32 {
                <$backend as Backend>::TOKEN_LENGTH
            }

            extern "C" fn generate_session_token(args: abi::TokenArgs<'_>) -> abi::SecOutput {
                into_output(<$backend as Backend>::generate_session_token(
                    args.username.as_str(),
                    args.authn_token.as_slice(),
                    session_length(args.session_length_secs),
                ))
            }

            extern "C" fn sign_message(args: abi::SignArgs<'_>) -> abi::SecOutput {
                into_output(<$backend as Backend>::sign_message(
                    args.message.as_slice(),
                    args.username.as_str(),
                    args.session_token.as_slice(),
                ))
            }

            extern "C" fn verify_message(args: abi::VerifyArgs<'_>) -> abi::SecOutput {
                into_output(
                    <$backend as Backend>::verify_message(
                        args.message.as_slice(),
                        args.username.as_str(),
                        args.signature.as_slice(),
                        args.verifier_key.as_slice(),
                    )
                    .map(|()| Vec::new()),
                )
            }

            extern "C" fn verifier_key(
                session_token: abi::abi_stable::std_types::RSlice<'_, u8>,
            ) -> abi::SecOutput {
                into_output(<$backend as Backend>::verifier_key(session_token.as_slice()))
            }
        }
    };
}
