//! List the security methods known to the registry.

use anyhow::Result;
use clap::Args;
use console::style;
use serde::Serialize;
use sspl_sec::{REGISTRY, RegistryEntry};

use super::OutputFormat;

#[derive(Args)]
pub struct MethodsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct MethodRow {
    method: sspl_sec::MethodId,
    library: &'static str,
}

impl From<&RegistryEntry> for MethodRow {
    fn from(entry: &RegistryEntry) -> Self {
        Self {
            method: entry.method,
            library: entry.library,
        }
    }
}

/// Prints every registry entry. Nothing is loaded.
pub fn run(args: &MethodsArgs) -> Result<()> {
    let rows: Vec<MethodRow> = REGISTRY.iter().map(MethodRow::from).collect();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Table => {
            println!("{:<10} {}", style("METHOD").bold(), style("LIBRARY").bold());
            println!("{}", "-".repeat(30));
            for row in &rows {
                println!("{:<10} {}", row.method, row.library);
            }
            println!("\n{} {} method(s) registered", style("✓").green(), rows.len());
        }
    }

    Ok(())
}
