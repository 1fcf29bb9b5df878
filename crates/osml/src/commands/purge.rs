//! `osml purge` command implementation.

use std::path::PathBuf;

use clap::Args;
use osml_site::{SiteConfig, purge_output};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the purge command.
#[derive(Args)]
pub(crate) struct PurgeArgs {
    /// Project directory holding osml.toml.
    #[arg(short = 'C', long = "dir", default_value = ".")]
    dir: PathBuf,
}

impl PurgeArgs {
    /// Execute the purge command.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let config = SiteConfig::load(&self.dir)?;
        purge_output(&config)?;
        output.success(&format!("Purged {}", config.output_dir.display()));
        Ok(())
    }
}
