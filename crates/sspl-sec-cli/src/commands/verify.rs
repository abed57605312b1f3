//! Verify a signature through a security method.

use anyhow::{Context, Result, bail};
use clap::Args;
use console::style;
use sspl_sec::{MethodId, SecResult, SecurityBackend, global};

use super::{activate, decode_hex};

#[derive(Args)]
pub struct VerifyArgs {
    /// Method to verify with
    #[arg(short, long)]
    pub method: MethodId,

    /// User the message was signed for
    #[arg(short, long)]
    pub user: String,

    /// Hex-encoded verifier key
    #[arg(long)]
    pub key: String,

    /// Hex-encoded signature
    #[arg(long)]
    pub signature: String,

    /// Signed message
    #[arg(long)]
    pub message: String,
}

/// Exits with an error when the signature does not verify.
pub fn run(args: &VerifyArgs) -> Result<()> {
    let key = decode_hex("--key", &args.key)?;
    let signature = decode_hex("--signature", &args.signature)?;
    let method = activate(Some(args.method))?;

    let outcome = global::with_backend(|_, backend| {
        backend.verify_message(args.message.as_bytes(), &args.user, &signature, &key)
    })
    .context("failed to query active backend")?;

    match outcome {
        Ok(()) => {
            println!(
                "{} Signature valid for {} ({method})",
                style("✓").green(),
                style(&args.user).cyan()
            );
            Ok(())
        }
        Err(e) if e.code == SecResult::VerifyFailed => {
            println!("{} Signature invalid", style("✗").red());
            bail!("signature verification failed for `{}`", args.user)
        }
        Err(e) => Err(e).context("verification failed"),
    }
}
