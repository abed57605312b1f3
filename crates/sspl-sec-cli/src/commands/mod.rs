//! CLI command implementations.
//!
//! Each command module exports an `*Args` struct parsed by `clap` and a
//! `run(&Args) -> Result<()>` function.

use anyhow::{Context, Result};
use sspl_sec::{MethodId, SecConfig, global};
use tracing::debug;

pub mod methods;
pub mod sign;
pub mod status;
pub mod verify;

/// Output format shared by the reporting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// Machine-readable JSON
    Json,
}

/// Initializes the process-wide method from configuration, switching
/// straight to `method` when one is given.
pub(crate) fn activate(method: Option<MethodId>) -> Result<MethodId> {
    let config = SecConfig::from_environment().context("failed to load security config")?;
    let config = with_requested_method(config, method);
    debug!(?config, "Resolved security config");

    global::configure(&config).with_context(|| {
        format!(
            "failed to activate security method `{}`",
            config.default_method
        )
    })?;
    global::get_method().context("failed to read active security method")
}

/// An explicit method replaces the configured default, so a default whose
/// backend is missing never blocks another method.
fn with_requested_method(mut config: SecConfig, method: Option<MethodId>) -> SecConfig {
    if let Some(method) = method {
        config.default_method = method;
    }
    config
}

/// Decodes a hex-encoded command-line argument.
pub(crate) fn decode_hex(flag: &str, value: &str) -> Result<Vec<u8>> {
    hex::decode(value.trim()).with_context(|| format!("{flag} is not valid hex"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_method_replaces_configured_default() {
        let config = SecConfig {
            default_method: MethodId::Pki,
            backend_dir: Some("/opt/sspl/lib".into()),
        };

        let config = with_requested_method(config, Some(MethodId::None));

        assert_eq!(config.default_method, MethodId::None);
        assert_eq!(
            config.backend_dir.as_deref(),
            Some(std::path::Path::new("/opt/sspl/lib"))
        );
    }

    #[test]
    fn test_configured_default_kept_without_explicit_method() {
        let config = SecConfig {
            default_method: MethodId::Pki,
            backend_dir: None,
        };

        let config = with_requested_method(config, None);

        assert_eq!(config.default_method, MethodId::Pki);
    }

    #[test]
    fn test_decode_hex_accepts_mixed_case_and_whitespace() {
        let bytes = decode_hex("--key", " 00Ff10\n").expect("valid hex");

        assert_eq!(bytes, [0x00, 0xff, 0x10]);
    }

    #[test]
    fn test_decode_hex_names_the_flag_on_error() {
        let err = decode_hex("--signature", "xyz").expect_err("invalid hex");

        assert_eq!(err.to_string(), "--signature is not valid hex");
    }
}
