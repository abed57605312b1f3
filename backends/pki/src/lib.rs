//! The "pki" security method, backed by Ed25519.
//!
//! - The authentication token is the user's 32-byte Ed25519 private seed.
//! - A session token is `expiry (u64, big-endian unix seconds) || seed`.
//! - A signature covers `username || 0x00 || message`.
//! - The verifier key is the Ed25519 public key of the session's seed.
//!
//! The session token is not protected: it carries the raw private seed, and
//! its expiry is not authenticated. Whoever holds a token can sign as its
//! user, and can extend an expired token by rewriting its first 8 bytes.
//! Treat tokens as secrets; the expiry check only catches honest callers.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use sspl_sec_backend::{Backend, BackendError, debug};

const SEED_LENGTH: usize = 32;
const EXPIRY_LENGTH: usize = 8;
const TOKEN_BYTES: usize = EXPIRY_LENGTH + SEED_LENGTH;

/// Ed25519 signing backend.
pub struct PkiBackend;

fn now_secs() -> Result<u64, BackendError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| BackendError::Other(format!("system clock before unix epoch: {e}")))
}

fn seed_from(bytes: &[u8]) -> Result<[u8; SEED_LENGTH], BackendError> {
    bytes.try_into().map_err(|_| {
        BackendError::InvalidInput(format!(
            "expected {SEED_LENGTH}-byte key, got {} bytes",
            bytes.len()
        ))
    })
}

/// Splits a session token into its expiry and signing key.
fn parse_token(token: &[u8]) -> Result<(u64, SigningKey), BackendError> {
    if token.len() != TOKEN_BYTES {
        return Err(BackendError::InvalidInput(format!(
            "expected {TOKEN_BYTES}-byte session token, got {} bytes",
            token.len()
        )));
    }
    let (expiry, seed) = token.split_at(EXPIRY_LENGTH);
    let mut expiry_bytes = [0_u8; EXPIRY_LENGTH];
    expiry_bytes.copy_from_slice(expiry);
    Ok((
        u64::from_be_bytes(expiry_bytes),
        SigningKey::from_bytes(&seed_from(seed)?),
    ))
}

fn signed_payload(username: &str, message: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(username.len() + 1 + message.len());
    payload.extend_from_slice(username.as_bytes());
    payload.push(0);
    payload.extend_from_slice(message);
    payload
}

impl Backend for PkiBackend {
    const METHOD_NAME: &'static str = "pki";
    const SIG_LENGTH: u32 = 64;
    const TOKEN_LENGTH: u32 = 40;

    fn generate_session_token(
        username: &str,
        authn_token: &[u8],
        session_length: Duration,
    ) -> Result<Vec<u8>, BackendError> {
        let seed = seed_from(authn_token)?;
        let expiry = now_secs()?.saturating_add(session_length.as_secs());
        debug!(username, expiry, "issuing pki session token");

        let mut token = Vec::with_capacity(TOKEN_BYTES);
        token.extend_from_slice(&expiry.to_be_bytes());
        token.extend_from_slice(&seed);
        Ok(token)
    }

    fn sign_message(
        message: &[u8],
        username: &str,
        session_token: &[u8],
    ) -> Result<Vec<u8>, BackendError> {
        let (expiry, key) = parse_token(session_token)?;
        if now_secs()? >= expiry {
            return Err(BackendError::Expired);
        }
        let signature = key.sign(&signed_payload(username, message));
        Ok(signature.to_bytes().to_vec())
    }

    fn verify_message(
        message: &[u8],
        username: &str,
        signature: &[u8],
        verifier_key: &[u8],
    ) -> Result<(), BackendError> {
        let key = VerifyingKey::from_bytes(&seed_from(verifier_key)?)
            .map_err(|e| BackendError::InvalidInput(format!("bad verifier key: {e}")))?;
        let signature = Signature::from_slice(signature)
            .map_err(|e| BackendError::InvalidInput(format!("bad signature: {e}")))?;
        key.verify(&signed_payload(username, message), &signature)
            .map_err(|_| BackendError::VerifyFailed)
    }

    fn verifier_key(session_token: &[u8]) -> Result<Vec<u8>, BackendError> {
        let (_, key) = parse_token(session_token)?;
        Ok(key.verifying_key().to_bytes().to_vec())
    }
}

sspl_sec_backend::export_backend!(PkiBackend);
