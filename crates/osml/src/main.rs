//! OSML CLI - bracket-markup site builder.
//!
//! Provides commands for:
//! - `create`: Scaffold a new project directory
//! - `build`: Compile every source document into the output tree
//! - `purge`: Delete generated output
//! - `live`: Watch sources and rebuild on change

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, CreateArgs, LiveArgs, PurgeArgs};
use output::Output;

/// OSML - bracket-markup site builder.
#[derive(Parser)]
#[command(name = "osml", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (build and watch progress logs).
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a new project directory.
    Create(CreateArgs),
    /// Compile every source document into the output tree.
    Build(BuildArgs),
    /// Delete generated output.
    Purge(PurgeArgs),
    /// Watch sources and rebuild on change.
    Live(LiveArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Create(args) => args.execute(&output),
        Commands::Build(args) => args.execute(&output),
        Commands::Purge(args) => args.execute(&output),
        Commands::Live(args) => args.execute(&output),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_accepts_project_dir() {
        let cli = Cli::try_parse_from(["osml", "build", "-C", "/tmp/site"]).unwrap();
        assert!(matches!(cli.command, Commands::Build(_)));
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["osml", "build", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }
}
