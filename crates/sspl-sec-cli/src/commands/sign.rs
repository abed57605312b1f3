//! Sign a message through a security method.
//!
//! Issues a session token from the authentication key, signs with it, and
//! prints the signature along with the verifier key needed to check it.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use serde::Serialize;
use sspl_sec::{MethodId, SecurityBackend, global};

use super::{OutputFormat, activate, decode_hex};

#[derive(Args)]
pub struct SignArgs {
    /// Method to sign with
    #[arg(short, long)]
    pub method: MethodId,

    /// User the message is signed for
    #[arg(short, long)]
    pub user: String,

    /// Hex-encoded authentication key
    #[arg(long)]
    pub authn_key: String,

    /// Message to sign
    #[arg(long)]
    pub message: String,

    /// Session length in seconds
    #[arg(long, default_value_t = 3600)]
    pub session_secs: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Signed {
    method: MethodId,
    user: String,
    signature: String,
    verifier_key: String,
}

pub fn run(args: &SignArgs) -> Result<()> {
    let authn_key = decode_hex("--authn-key", &args.authn_key)?;
    let method = activate(Some(args.method))?;

    let (signature, verifier_key) = global::with_backend(|_, backend| {
        let token = backend.generate_session_token(
            &args.user,
            &authn_key,
            Duration::from_secs(args.session_secs),
        )?;
        let signature = backend.sign_message(args.message.as_bytes(), &args.user, &token)?;
        let verifier_key = backend.verifier_key(&token)?;
        Ok::<_, sspl_sec::BackendError>((signature, verifier_key))
    })
    .context("failed to query active backend")?
    .context("signing failed")?;

    let signed = Signed {
        method,
        user: args.user.clone(),
        signature: hex::encode(signature),
        verifier_key: hex::encode(verifier_key),
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&signed)?),
        OutputFormat::Table => {
            println!("{} {}", style("Signature:").bold(), signed.signature);
            println!("{} {}", style("Verifier key:").bold(), signed.verifier_key);
            println!(
                "\n{} Signed for {} with {}",
                style("✓").green(),
                style(&signed.user).cyan(),
                signed.method
            );
        }
    }

    Ok(())
}
