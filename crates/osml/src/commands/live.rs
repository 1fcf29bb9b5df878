//! `osml live` command implementation.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use osml_compiler::PluginRegistry;
use osml_site::{SiteConfig, WatchOptions, WatchOutcome, build_site, watch_project};

use super::build::print_report;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the live command.
#[derive(Args)]
pub(crate) struct LiveArgs {
    /// Project directory holding osml.toml.
    #[arg(short = 'C', long = "dir", default_value = ".")]
    dir: PathBuf,

    /// Debounce window in milliseconds.
    #[arg(long, default_value_t = 200)]
    debounce_ms: u64,
}

impl LiveArgs {
    /// Execute the live command: full build, then watch until interrupted.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let config = SiteConfig::load(&self.dir)?;
        let registry = PluginRegistry::with_builtins();

        // Initial full build; compile failures are reported but do not
        // stop the watch from starting.
        let report = build_site(&config, &registry)?;
        print_report(output, &report);

        output.info(&format!("Watching {}", config.source_dir.display()));
        let options = WatchOptions {
            debounce: Duration::from_millis(self.debounce_ms),
            ..WatchOptions::default()
        };
        watch_project(&config, &registry, &options, &|outcome: &WatchOutcome| {
            match outcome {
                WatchOutcome::Compiled(path) => {
                    output.success(&format!("  OK   {}", path.display()));
                }
                WatchOutcome::Copied(path) => {
                    output.info(&format!("  COPY static/{}", path.display()));
                }
                WatchOutcome::Removed(path) => {
                    output.warning(&format!("  DEL  {}", path.display()));
                }
                WatchOutcome::Failed { path, error } => {
                    output.error(&format!("  FAIL {}: {error}", path.display()));
                }
                WatchOutcome::Superseded(path) => {
                    output.info(&format!("  SKIP {} (newer change pending)", path.display()));
                }
            }
        })?;
        Ok(())
    }
}
