//! Command-line arguments

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::completions::CompletionsArgs;
use crate::cli::commands::customs::CustomsArgs;
use crate::cli::commands::init::InitArgs;
use crate::cli::commands::order::OrderArgs;
use crate::cli::commands::source::SourceArgs;
use crate::cli::commands::vendor::VendorCommands;

#[derive(Parser, Debug)]
#[command(
    name = "tsrc",
    version,
    about = "Plain-text electronics sourcing: price, consolidate and order parts from vendor price lists",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub output: OutputFormat,

    /// Show debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project directory (discovered from the current directory by default)
    #[arg(long, short = 'C', global = true, env = "TSRC_PROJECT")]
    pub project: Option<PathBuf>,
}

/// Output format
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table for lists, summary text for single items
    #[default]
    Auto,
    /// Human-readable table
    Table,
    /// Comma-separated values
    Csv,
    /// Tab-separated values
    Tsv,
    /// JSON
    Json,
    /// YAML
    Yaml,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new sourcing project
    Init(InitArgs),

    /// Price a requirement list and select a vendor for every line
    Source(SourceArgs),

    /// Write per-vendor order files for a requirement list
    Order(OrderArgs),

    /// Inspect vendor price lists
    #[command(subcommand)]
    Vendor(VendorCommands),

    /// Assess import duties on a vendor invoice
    Customs(CustomsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tsrc", "vendor", "list", "-o", "json", "-v"]).unwrap();
        assert_eq!(cli.global.output, OutputFormat::Json);
        assert!(cli.global.verbose);
    }
}
