//! Stable ABI types for SSPL security backends.
//!
//! This crate defines the FFI boundary between the security method loader and
//! the backend libraries it switches between (`sspl_none.so.0`,
//! `sspl_pki.so.0`, ...). All types use `abi_stable` so that the host and a
//! backend built by a different compiler release agree on layout.
//!
//! # Ownership
//!
//! - **Module table** ([`SecBackendModule`]): lives in the backend library's
//!   static memory. It is only valid while the library stays loaded, so the
//!   host never hands out references that outlive its library handle.
//!
//! - **Per-call arguments** ([`TokenArgs`], [`SignArgs`], [`VerifyArgs`]):
//!   borrow from the caller's stack for the duration of the synchronous call.
//!
//! - **Results** ([`SecOutput`]): allocated by the backend. The host copies
//!   the bytes out and drops the [`RVec`] before the call returns, while the
//!   backend that owns the allocator is still loaded.

pub use abi_stable;
use abi_stable::{
    StableAbi,
    std_types::{RSlice, RStr, RVec},
};

/// Current ABI version. Incremented when breaking changes are made.
/// The loader rejects backends that report a different version.
pub const SEC_ABI_VERSION: u32 = 1;

/// Name of the symbol every backend exports.
///
/// The symbol is an `extern "C" fn() -> &'static SecBackendModule`.
pub const SEC_BACKEND_SYMBOL: &str = "sspl_sec_backend_module";

/// Result codes for backend operations.
#[repr(u8)]
#[derive(StableAbi, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SecResult {
    /// Operation completed successfully.
    Ok = 0,
    /// Generic error occurred.
    Error = 1,
    /// Input was malformed (wrong token length, bad key, ...).
    InvalidInput = 2,
    /// The session token has expired.
    Expired = 3,
    /// Signature verification failed.
    VerifyFailed = 4,
}

/// Output of a backend operation.
#[repr(C)]
#[derive(StableAbi, Debug, Clone)]
pub struct SecOutput {
    pub result: SecResult,
    /// Output data, or a UTF-8 error message on failure.
    pub bytes: RVec<u8>,
}

impl SecOutput {
    #[must_use]
    pub fn ok(bytes: RVec<u8>) -> Self {
        Self {
            result: SecResult::Ok,
            bytes,
        }
    }

    #[must_use]
    pub fn error(result: SecResult, message: &str) -> Self {
        Self {
            result,
            bytes: RVec::from_slice(message.as_bytes()),
        }
    }
}

/// Arguments for [`GenerateTokenFn`].
#[repr(C)]
#[derive(StableAbi, Debug, Clone, Copy)]
pub struct TokenArgs<'a> {
    pub username: RStr<'a>,
    /// Long-lived credential the session token is derived from.
    pub authn_token: RSlice<'a, u8>,
    /// Session lifetime in seconds.
    pub session_length_secs: u64,
}

impl<'a> TokenArgs<'a> {
    #[must_use]
    pub const fn new(
        username: RStr<'a>,
        authn_token: RSlice<'a, u8>,
        session_length_secs: u64,
    ) -> Self {
        Self {
            username,
            authn_token,
            session_length_secs,
        }
    }
}

/// Arguments for [`SignMessageFn`].
#[repr(C)]
#[derive(StableAbi, Debug, Clone, Copy)]
pub struct SignArgs<'a> {
    pub message: RSlice<'a, u8>,
    pub username: RStr<'a>,
    pub session_token: RSlice<'a, u8>,
}

impl<'a> SignArgs<'a> {
    #[must_use]
    pub const fn new(
        message: RSlice<'a, u8>,
        username: RStr<'a>,
        session_token: RSlice<'a, u8>,
    ) -> Self {
        Self {
            message,
            username,
            session_token,
        }
    }
}

/// Arguments for [`VerifyMessageFn`].
#[repr(C)]
#[derive(StableAbi, Debug, Clone, Copy)]
pub struct VerifyArgs<'a> {
    pub message: RSlice<'a, u8>,
    pub username: RStr<'a>,
    pub signature: RSlice<'a, u8>,
    /// Key returned by [`VerifierKeyFn`] for the signer's session.
    pub verifier_key: RSlice<'a, u8>,
}

impl<'a> VerifyArgs<'a> {
    #[must_use]
    pub const fn new(
        message: RSlice<'a, u8>,
        username: RStr<'a>,
        signature: RSlice<'a, u8>,
        verifier_key: RSlice<'a, u8>,
    ) -> Self {
        Self {
            message,
            username,
            signature,
            verifier_key,
        }
    }
}

/// Returns a fixed length in bytes.
pub type LengthFn = extern "C" fn() -> u32;

/// Derives a session token from long-lived credentials.
pub type GenerateTokenFn = extern "C" fn(args: TokenArgs<'_>) -> SecOutput;

/// Signs a message with a session token.
pub type SignMessageFn = extern "C" fn(args: SignArgs<'_>) -> SecOutput;

/// Verifies a signature. Succeeds with empty output.
pub type VerifyMessageFn = extern "C" fn(args: VerifyArgs<'_>) -> SecOutput;

/// Derives the key a verifier needs from a session token.
pub type VerifierKeyFn = extern "C" fn(session_token: RSlice<'_, u8>) -> SecOutput;

/// Accessor exported by every backend under [`SEC_BACKEND_SYMBOL`].
pub type BackendModuleFn = extern "C" fn() -> &'static SecBackendModule;

/// Function table a backend library exposes to the host.
#[repr(C)]
#[derive(StableAbi)]
pub struct SecBackendModule {
    /// ABI version this backend was compiled with.
    pub abi_version: u32,

    /// Method name (e.g., "none", "pki").
    pub method_name: RStr<'static>,

    /// Length of a signature produced by `sign_message`.
    #[sabi(unsafe_opaque_field)]
    pub sig_length: LengthFn,

    /// Length of a session token produced by `generate_session_token`.
    #[sabi(unsafe_opaque_field)]
    pub token_length: LengthFn,

    #[sabi(unsafe_opaque_field)]
    pub generate_session_token: GenerateTokenFn,

    #[sabi(unsafe_opaque_field)]
    pub sign_message: SignMessageFn,

    #[sabi(unsafe_opaque_field)]
    pub verify_message: VerifyMessageFn,

    #[sabi(unsafe_opaque_field)]
    pub verifier_key: VerifierKeyFn,
}
