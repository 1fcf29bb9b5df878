//! Batch build: compile every source file into the output tree.
//!
//! `src/**/*.osml` maps path-for-path to `dist/**/*.html`; everything
//! under `static/` is copied byte-for-byte into `dist/static/`, and
//! outputs there whose source has disappeared are removed. One document
//! failing to compile does not stop the rest of the build; failures are
//! collected in the [`BuildReport`].

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use osml_compiler::{CompileError, PageOptions, PluginRegistry, compile_page};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::SiteConfig;

/// Extension of compilable source files.
pub const SOURCE_EXTENSION: &str = "osml";

/// A failure that aborts the whole build, as opposed to a per-file one.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("source directory {path} does not exist")]
    MissingSourceDir { path: PathBuf },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: ignore::Error,
    },

    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Why a single file failed while the build went on.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One file's failure inside an otherwise-completed build.
#[derive(Debug)]
pub struct BuildFailure {
    /// Source path relative to the source directory.
    pub source: PathBuf,
    pub error: FileError,
}

/// What a build did. Paths are relative to the relevant roots.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Output files written, relative to the output directory.
    pub compiled: Vec<PathBuf>,
    /// Static assets copied, relative to the static directory.
    pub copied: Vec<PathBuf>,
    /// Stale static outputs deleted, relative to `dist/static/`.
    pub removed: Vec<PathBuf>,
    pub failures: Vec<BuildFailure>,
}

impl BuildReport {
    /// Whether every document compiled.
    #[must_use]
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Build the whole project.
pub fn build_site(
    config: &SiteConfig,
    registry: &PluginRegistry,
) -> Result<BuildReport, BuildError> {
    if !config.source_dir.is_dir() {
        return Err(BuildError::MissingSourceDir {
            path: config.source_dir.clone(),
        });
    }
    fs::create_dir_all(&config.output_dir).map_err(|source| BuildError::Io {
        action: "create",
        path: config.output_dir.clone(),
        source,
    })?;

    let mut report = BuildReport::default();
    let page = config.page_options();

    let sources: Vec<PathBuf> = list_files(&config.source_dir)?
        .into_iter()
        .filter(|p| p.extension().is_some_and(|e| e == SOURCE_EXTENSION))
        .filter(|p| !config.is_excluded(p))
        .collect();

    // The registry is shared read-only across the worker pool.
    let outcomes: Vec<(PathBuf, Result<PathBuf, FileError>)> = sources
        .par_iter()
        .map(|relative| (relative.clone(), compile_file(config, registry, &page, relative)))
        .collect();

    for (source, outcome) in outcomes {
        match outcome {
            Ok(output) => report.compiled.push(output),
            Err(error) => report.failures.push(BuildFailure { source, error }),
        }
    }

    copy_statics(config, &mut report)?;

    info!(
        compiled = report.compiled.len(),
        copied = report.copied.len(),
        removed = report.removed.len(),
        failed = report.failures.len(),
        "build finished"
    );
    Ok(report)
}

/// Compile one source file (path relative to the source dir) and write
/// its output. Returns the output path relative to the output dir.
pub fn compile_file(
    config: &SiteConfig,
    registry: &PluginRegistry,
    page: &PageOptions,
    relative: &Path,
) -> Result<PathBuf, FileError> {
    let source_path = config.source_dir.join(relative);
    let source = fs::read_to_string(&source_path)?;
    let html = compile_page(&source, registry, page)?;

    let output_relative = relative.with_extension("html");
    let output_path = config.output_dir.join(&output_relative);
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output_path, html)?;
    debug!(
        source = %source_path.display(),
        output = %output_path.display(),
        "compiled"
    );
    Ok(output_relative)
}

/// Copy static assets into `dist/static/` and drop outputs whose source
/// no longer exists.
fn copy_statics(config: &SiteConfig, report: &mut BuildReport) -> Result<(), BuildError> {
    let static_out = config.static_output_dir();

    let assets: Vec<PathBuf> = if config.static_dir.is_dir() {
        list_files(&config.static_dir)?
    } else {
        Vec::new()
    };

    for relative in &assets {
        let from = config.static_dir.join(relative);
        let to = static_out.join(relative);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|source| BuildError::Io {
                action: "create",
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::copy(&from, &to).map_err(|source| BuildError::Io {
            action: "copy",
            path: from.clone(),
            source,
        })?;
        report.copied.push(relative.clone());
    }

    if static_out.is_dir() {
        let known: HashSet<&PathBuf> = assets.iter().collect();
        for stale in list_files(&static_out)? {
            if !known.contains(&stale) {
                let path = static_out.join(&stale);
                fs::remove_file(&path).map_err(|source| BuildError::Io {
                    action: "remove",
                    path,
                    source,
                })?;
                debug!(path = %stale.display(), "removed stale static output");
                report.removed.push(stale);
            }
        }
    }
    Ok(())
}

/// All regular files under `root`, as paths relative to `root`.
fn list_files(root: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let mut files = Vec::new();
    for entry in WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build()
    {
        let entry = entry.map_err(|source| BuildError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_some_and(|t| t.is_file()) {
            if let Ok(relative) = entry.path().strip_prefix(root) {
                files.push(relative.to_path_buf());
            }
        }
    }
    files.sort();
    Ok(files)
}
