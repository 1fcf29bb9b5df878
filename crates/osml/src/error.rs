//! CLI error types.

use osml_site::{BuildError, ConfigError, ScaffoldError, WatchError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Scaffold(#[from] ScaffoldError),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("{0}")]
    Watch(#[from] WatchError),

    #[error("{failed} document(s) failed to compile")]
    BuildFailed { failed: usize },
}
