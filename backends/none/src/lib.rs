//! The "none" security method: nothing is signed and every message verifies.
//!
//! This is the backend a process starts with.

use std::time::Duration;

use sspl_sec_backend::{Backend, BackendError, trace};

/// Backend that performs no signing.
pub struct NoneBackend;

impl Backend for NoneBackend {
    const METHOD_NAME: &'static str = "none";
    const SIG_LENGTH: u32 = 0;
    const TOKEN_LENGTH: u32 = 0;

    fn generate_session_token(
        username: &str,
        _authn_token: &[u8],
        _session_length: Duration,
    ) -> Result<Vec<u8>, BackendError> {
        trace!(username, "issuing empty session token");
        Ok(Vec::new())
    }

    fn sign_message(
        _message: &[u8],
        _username: &str,
        _session_token: &[u8],
    ) -> Result<Vec<u8>, BackendError> {
        Ok(Vec::new())
    }

    fn verify_message(
        _message: &[u8],
        _username: &str,
        _signature: &[u8],
        _verifier_key: &[u8],
    ) -> Result<(), BackendError> {
        Ok(())
    }

    fn verifier_key(_session_token: &[u8]) -> Result<Vec<u8>, BackendError> {
        Ok(Vec::new())
    }
}

sspl_sec_backend::export_backend!(NoneBackend);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signatures_and_tokens_are_empty() {
        let token =
            NoneBackend::generate_session_token("admin", b"secret", Duration::from_secs(60))
                .expect("token");
        let signature = NoneBackend::sign_message(b"hello", "admin", &token).expect("sign");

        assert!(token.is_empty());
        assert!(signature.is_empty());
        assert_eq!(token.len(), NoneBackend::TOKEN_LENGTH as usize);
        assert_eq!(signature.len(), NoneBackend::SIG_LENGTH as usize);
    }

    #[test]
    fn test_any_signature_verifies() {
        assert!(NoneBackend::verify_message(b"hello", "admin", b"garbage", b"").is_ok());
        assert!(NoneBackend::verify_message(b"", "", &[], &[]).is_ok());
    }

    #[test]
    fn test_exported_module_reports_none_method() {
        let module = __sspl_sec_entrypoint::sspl_sec_backend_module();

        assert_eq!(module.method_name.as_str(), "none");
        assert_eq!((module.sig_length)(), 0);
    }
}
