//! Report the active security method and the artifact backing it.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use serde::Serialize;
use sspl_sec::{LoadedBackend, MethodId, SecurityBackend, global};

use super::{OutputFormat, activate};

#[derive(Args)]
pub struct StatusArgs {
    /// Method to switch to before reporting; defaults to the configured one
    #[arg(short, long)]
    pub method: Option<MethodId>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Status {
    method: MethodId,
    backend_name: String,
    library: String,
    resolved: Option<String>,
    sig_length: usize,
    token_length: usize,
}

pub fn run(args: &StatusArgs) -> Result<()> {
    activate(args.method)?;

    let status = global::with_backend(|method, backend| Status {
        method,
        backend_name: backend.method_name().to_string(),
        library: backend.library_name().to_string(),
        resolved: backend.resolved_name(),
        sig_length: backend.sig_length(),
        token_length: backend.token_length(),
    })
    .context("failed to query active backend")?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Table => print_table(&status),
    }

    Ok(())
}

fn print_table(status: &Status) {
    println!("{} {}", style("Method:").bold(), style(status.method).cyan());
    println!("{} {}", style("Backend:").bold(), status.backend_name);
    println!("{} {}", style("Library:").bold(), status.library);
    match &status.resolved {
        Some(resolved) if *resolved == status.library => {
            println!("{} {} {}", style("Resolved:").bold(), resolved, style("✓").green());
        }
        Some(resolved) => {
            println!("{} {} {}", style("Resolved:").bold(), resolved, style("≠").yellow());
        }
        None => println!("{} {}", style("Resolved:").bold(), style("unknown").dim()),
    }
    println!("{} {} bytes", style("Signature length:").bold(), status.sig_length);
    println!("{} {} bytes", style("Token length:").bold(), status.token_length);
}
