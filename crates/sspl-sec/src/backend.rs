//! Security operations offered by the active backend.
//!
//! [`SecurityBackend`] is the capability every loaded backend provides.
//! [`BackendLibrary`] implements it by calling through the module table the
//! library exports. Output buffers are copied into host-owned memory before
//! each call returns, so nothing allocated by a backend outlives it.

use std::time::Duration;

use sspl_sec_abi::{
    SecOutput, SecResult, SignArgs, TokenArgs, VerifyArgs,
    abi_stable::std_types::{RSlice, RStr},
};

use crate::loader::{BackendLibrary, LoadedBackend};

/// A security operation failed inside the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{method} backend failed ({code:?}): {message}")]
pub struct BackendError {
    /// Method name reported by the backend.
    pub method: String,
    pub code: SecResult,
    pub message: String,
}

/// Operations provided by a security method.
pub trait SecurityBackend {
    /// Method name reported by the backend (e.g., "pki").
    fn method_name(&self) -> &str;

    /// Length in bytes of signatures produced by [`Self::sign_message`].
    fn sig_length(&self) -> usize;

    /// Length in bytes of tokens produced by
    /// [`Self::generate_session_token`].
    fn token_length(&self) -> usize;

    /// Derives a session token for `username`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the backend rejects the credentials.
    fn generate_session_token(
        &self,
        username: &str,
        authn_token: &[u8],
        session_length: Duration,
    ) -> Result<Vec<u8>, BackendError>;

    /// Signs `message` with a session token.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the token is malformed or expired.
    fn sign_message(
        &self,
        message: &[u8],
        username: &str,
        session_token: &[u8],
    ) -> Result<Vec<u8>, BackendError>;

    /// Verifies a signature against the signer's verifier key.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] with [`SecResult::VerifyFailed`] if the
    /// signature does not match.
    fn verify_message(
        &self,
        message: &[u8],
        username: &str,
        signature: &[u8],
        verifier_key: &[u8],
    ) -> Result<(), BackendError>;

    /// Derives the key verifiers need for a session token.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the token is malformed.
    fn verifier_key(&self, session_token: &[u8]) -> Result<Vec<u8>, BackendError>;
}

impl BackendLibrary {
    fn finish(&self, output: SecOutput) -> Result<Vec<u8>, BackendError> {
        let bytes = output.bytes.as_slice().to_vec();
        let result = output.result;
        // The RVec must be freed while its library is loaded.
        drop(output);

        if result == SecResult::Ok {
            Ok(bytes)
        } else {
            Err(BackendError {
                method: self.method_name().to_string(),
                code: result,
                message: String::from_utf8_lossy(&bytes).into_owned(),
            })
        }
    }
}

impl SecurityBackend for BackendLibrary {
    fn method_name(&self) -> &str {
        self.module().method_name.as_str()
    }

    fn sig_length(&self) -> usize {
        (self.module().sig_length)() as usize
    }

    fn token_length(&self) -> usize {
        (self.module().token_length)() as usize
    }

    fn generate_session_token(
        &self,
        username: &str,
        authn_token: &[u8],
        session_length: Duration,
    ) -> Result<Vec<u8>, BackendError> {
        let args = TokenArgs::new(
            RStr::from(username),
            RSlice::from_slice(authn_token),
            session_length.as_secs(),
        );
        tracing::debug!(library = %self.library_name(), username, "Generating session token");
        self.finish((self.module().generate_session_token)(args))
    }

    fn sign_message(
        &self,
        message: &[u8],
        username: &str,
        session_token: &[u8],
    ) -> Result<Vec<u8>, BackendError> {
        let args = SignArgs::new(
            RSlice::from_slice(message),
            RStr::from(username),
            RSlice::from_slice(session_token),
        );
        self.finish((self.module().sign_message)(args))
    }

    fn verify_message(
        &self,
        message: &[u8],
        username: &str,
        signature: &[u8],
        verifier_key: &[u8],
    ) -> Result<(), BackendError> {
        let args = VerifyArgs::new(
            RSlice::from_slice(message),
            RStr::from(username),
            RSlice::from_slice(signature),
            RSlice::from_slice(verifier_key),
        );
        self.finish((self.module().verify_message)(args))
            .map(|_| ())
    }

    fn verifier_key(&self, session_token: &[u8]) -> Result<Vec<u8>, BackendError> {
        self.finish((self.module().verifier_key)(RSlice::from_slice(session_token)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display_includes_method_and_code() {
        let err = BackendError {
            method: "pki".to_string(),
            code: SecResult::Expired,
            message: "session token expired".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "pki backend failed (Expired): session token expired"
        );
    }
}
