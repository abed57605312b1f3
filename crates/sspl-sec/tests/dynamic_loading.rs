//! Loads real backend libraries through the platform dynamic loader.
//!
//! The missing-library checks always run. The remaining tests need the
//! backend artifacts staged under their installed names:
//!
//! ```bash
//! cargo build -p sspl-none -p sspl-pki
//! mkdir -p /tmp/sspl && cp target/debug/libsspl_none.so /tmp/sspl/sspl_none.so.0
//! cp target/debug/libsspl_pki.so /tmp/sspl/sspl_pki.so.0
//! SSPL_SEC_BACKEND_DIR=/tmp/sspl cargo test -p sspl-sec --test dynamic_loading
//! ```
//!
//! Without `SSPL_SEC_BACKEND_DIR` they are skipped.

use std::{path::PathBuf, time::Duration};

use sspl_sec::{
    BACKEND_DIR_ENV, BackendLoader, DynamicLoader, LoadError, LoadedBackend, MethodId,
    MethodSwitcher, SecResult, SecurityBackend,
};

const AUTHN_SEED: [u8; 32] = [0x2a; 32];

fn staged_loader() -> Option<DynamicLoader> {
    let Some(dir) = std::env::var_os(BACKEND_DIR_ENV).filter(|d| !d.is_empty()) else {
        eprintln!("{BACKEND_DIR_ENV} not set, skipping test that needs staged backends");
        return None;
    };
    Some(DynamicLoader::new(Some(PathBuf::from(dir))))
}

#[test]
fn test_missing_library_returns_library_load_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loader = DynamicLoader::new(Some(dir.path().to_path_buf()));

    let result = loader.open(MethodId::Pki.library_name());

    assert!(matches!(
        result,
        Err(LoadError::LibraryLoad { ref name, .. }) if name == "sspl_pki.so.0"
    ));
}

#[test]
fn test_switcher_without_artifacts_fails_to_initialize() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loader = DynamicLoader::new(Some(dir.path().to_path_buf()));

    let result = MethodSwitcher::new(loader);

    assert!(matches!(result, Err(LoadError::LibraryLoad { .. })));
}

#[test]
fn test_staged_backends_switch_and_resolve() {
    let Some(loader) = staged_loader() else {
        return;
    };
    let mut switcher = MethodSwitcher::new(loader).expect("default backend loads");

    assert_eq!(switcher.current(), MethodId::None);
    assert_eq!(
        switcher.active_backend().resolved_name().as_deref(),
        Some("sspl_none.so.0")
    );
    assert_eq!(switcher.active_backend().method_name(), "none");

    switcher.set_method(MethodId::Pki).expect("switch to pki");
    assert_eq!(switcher.current(), MethodId::Pki);
    assert_eq!(
        switcher.active_backend().resolved_name().as_deref(),
        Some("sspl_pki.so.0")
    );
    assert_eq!(switcher.active_backend().method_name(), "pki");

    switcher.set_method(MethodId::None).expect("switch back to none");
    assert_eq!(switcher.current(), MethodId::None);
    assert_eq!(
        switcher.active_backend().resolved_name().as_deref(),
        Some("sspl_none.so.0")
    );

    switcher.shutdown().expect("shutdown");
}

#[test]
fn test_staged_backend_reloads_on_repeated_request() {
    let Some(loader) = staged_loader() else {
        return;
    };
    let mut switcher = MethodSwitcher::new(loader).expect("default backend loads");

    for _ in 0..5 {
        switcher.set_method(MethodId::Pki).expect("reload pki");
        assert_eq!(switcher.current(), MethodId::Pki);
        assert_eq!(switcher.active_backend().sig_length(), 64);
    }

    switcher.shutdown().expect("shutdown");
}

#[test]
fn test_staged_pki_signs_and_verifies() {
    let Some(loader) = staged_loader() else {
        return;
    };
    let mut switcher = MethodSwitcher::new(loader).expect("default backend loads");
    switcher.set_method(MethodId::Pki).expect("switch to pki");
    let backend = switcher.active_backend();

    let token = backend
        .generate_session_token("admin", &AUTHN_SEED, Duration::from_secs(600))
        .expect("session token");
    let key = backend.verifier_key(&token).expect("verifier key");
    let signature = backend
        .sign_message(b"shutdown enclosure", "admin", &token)
        .expect("sign");

    assert_eq!(token.len(), backend.token_length());
    assert_eq!(signature.len(), backend.sig_length());
    backend
        .verify_message(b"shutdown enclosure", "admin", &signature, &key)
        .expect("signature verifies");

    let tampered = backend
        .verify_message(b"shutdown enclosure!", "admin", &signature, &key)
        .expect_err("tampered message must not verify");
    assert_eq!(tampered.code, SecResult::VerifyFailed);
    assert_eq!(tampered.method, "pki");

    switcher.shutdown().expect("shutdown");
}

#[test]
fn test_staged_none_accepts_everything() {
    let Some(loader) = staged_loader() else {
        return;
    };
    let switcher = MethodSwitcher::new(loader).expect("default backend loads");
    let backend = switcher.active_backend();

    let signature = backend
        .sign_message(b"anything", "admin", &[])
        .expect("sign");

    assert!(signature.is_empty());
    assert_eq!(backend.sig_length(), 0);
    backend
        .verify_message(b"anything", "admin", b"garbage", b"")
        .expect("none verifies everything");

    switcher.shutdown().expect("shutdown");
}
