//! `osml create` command implementation.

use std::path::PathBuf;

use clap::Args;
use osml_site::create_project;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the create command.
#[derive(Args)]
pub(crate) struct CreateArgs {
    /// Directory to scaffold (created if missing).
    #[arg(default_value = ".")]
    path: PathBuf,
}

impl CreateArgs {
    /// Execute the create command.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        create_project(&self.path)?;
        output.success(&format!("Created project in {}", self.path.display()));
        Ok(())
    }
}
