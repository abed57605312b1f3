//! Operator CLI for SSPL security methods.
//!
//! Usage:
//! ```bash
//! sspl-sec methods                                  # List known methods
//! sspl-sec status --method pki                      # Show the active backend
//! sspl-sec sign --method pki --user U --authn-key HEX --message TEXT
//! sspl-sec verify --method pki --user U --key HEX --signature HEX --message TEXT
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "sspl-sec", author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the security methods and their backend libraries
    Methods(commands::methods::MethodsArgs),

    /// Show the active security method and its loaded backend
    Status(commands::status::StatusArgs),

    /// Sign a message through a security method
    Sign(commands::sign::SignArgs),

    /// Verify a signature through a security method
    Verify(commands::verify::VerifyArgs),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Methods(_) => f.debug_tuple("Methods").finish(),
            Self::Status(_) => f.debug_tuple("Status").finish(),
            Self::Sign(_) => f.debug_tuple("Sign").finish(),
            Self::Verify(_) => f.debug_tuple("Verify").finish(),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("info".parse().context("failed to parse log directive")?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = match &cli.command {
        Command::Methods(args) => commands::methods::run(args),
        Command::Status(args) => commands::status::run(args),
        Command::Sign(args) => commands::sign::run(args),
        Command::Verify(args) => commands::verify::run(args),
    };

    sspl_sec::global::shutdown().context("failed to unload security backend")?;
    outcome
}
