//! Project-level build driver for OSML sites.
//!
//! A project is a directory holding `osml.toml`, a source tree of `.osml`
//! documents and a static asset tree. This crate turns that into an
//! output tree of HTML pages: scaffolding ([`create_project`]), one-shot
//! batch builds ([`build_site`]), output cleanup ([`purge_output`]) and a
//! watch loop ([`watch_project`]) that rebuilds on change.

mod build;
mod config;
mod scaffold;
mod watch;

pub use build::{
    BuildError, BuildFailure, BuildReport, FileError, SOURCE_EXTENSION, build_site, compile_file,
};
pub use config::{CONFIG_FILENAME, ConfigError, SiteConfig};
pub use scaffold::{ScaffoldError, create_project, purge_output};
pub use watch::{
    Change, ChangeDebouncer, ChangeKind, WatchError, WatchOptions, WatchOutcome, watch_project,
};
