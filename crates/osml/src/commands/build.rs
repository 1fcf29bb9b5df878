//! `osml build` command implementation.

use std::path::PathBuf;

use clap::Args;
use osml_compiler::PluginRegistry;
use osml_site::{BuildReport, SiteConfig, build_site};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Project directory holding osml.toml.
    #[arg(short = 'C', long = "dir", default_value = ".")]
    dir: PathBuf,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if the project cannot be built, or
    /// [`CliError::BuildFailed`] if any document failed to compile.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let config = SiteConfig::load(&self.dir)?;
        let registry = PluginRegistry::with_builtins();

        let report = build_site(&config, &registry)?;
        print_report(output, &report);

        if report.success() {
            output.success(&format!("Built {} document(s)", report.compiled.len()));
            Ok(())
        } else {
            Err(CliError::BuildFailed {
                failed: report.failures.len(),
            })
        }
    }
}

/// Print one line per build action.
pub(crate) fn print_report(output: &Output, report: &BuildReport) {
    for path in &report.compiled {
        output.success(&format!("  OK   {}", path.display()));
    }
    for path in &report.copied {
        output.info(&format!("  COPY static/{}", path.display()));
    }
    for path in &report.removed {
        output.warning(&format!("  DEL  static/{}", path.display()));
    }
    for failure in &report.failures {
        output.error(&format!(
            "  FAIL {}: {}",
            failure.source.display(),
            failure.error
        ));
    }
}
