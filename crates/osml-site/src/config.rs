//! Project configuration.
//!
//! A project is a directory with an `osml.toml` at its root. The file is
//! optional; every setting has a default, so an empty directory is a
//! valid project.
//!
//! ```toml
//! [site]
//! source_dir = "src"
//! static_dir = "static"
//! output_dir = "dist"
//! excluded = ["drafts/wip.osml"]
//!
//! [page]
//! head_insert = "<link rel=\"stylesheet\" href=\"static/style.css\">"
//! body_insert = ""
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use osml_compiler::PageOptions;
use serde::Deserialize;
use thiserror::Error;

/// Name of the config file at the project root.
pub const CONFIG_FILENAME: &str = "osml.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// On-disk config shape, before paths are resolved.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    site: RawSite,
    page: RawPage,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSite {
    source_dir: String,
    static_dir: String,
    output_dir: String,
    excluded: Vec<PathBuf>,
}

impl Default for RawSite {
    fn default() -> Self {
        Self {
            source_dir: "src".to_owned(),
            static_dir: "static".to_owned(),
            output_dir: "dist".to_owned(),
            excluded: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawPage {
    head_insert: String,
    body_insert: String,
}

/// Resolved project configuration: all paths absolute-ized against the
/// project directory.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub project_dir: PathBuf,
    pub source_dir: PathBuf,
    pub static_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Source files (relative to `source_dir`) skipped by builds.
    pub excluded: Vec<PathBuf>,
    pub head_insert: String,
    pub body_insert: String,
}

impl SiteConfig {
    /// Load the config from `<project_dir>/osml.toml`, falling back to
    /// defaults when the file does not exist.
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let path = project_dir.join(CONFIG_FILENAME);
        let raw = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })?
        } else {
            RawConfig::default()
        };
        Ok(Self::resolve(raw, project_dir))
    }

    fn resolve(raw: RawConfig, project_dir: &Path) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            source_dir: project_dir.join(raw.site.source_dir),
            static_dir: project_dir.join(raw.site.static_dir),
            output_dir: project_dir.join(raw.site.output_dir),
            excluded: raw.site.excluded,
            head_insert: raw.page.head_insert,
            body_insert: raw.page.body_insert,
        }
    }

    /// Where static assets land inside the output tree.
    #[must_use]
    pub fn static_output_dir(&self) -> PathBuf {
        self.output_dir.join("static")
    }

    /// Whether a source path (relative to `source_dir`) is excluded from
    /// builds.
    #[must_use]
    pub fn is_excluded(&self, relative: &Path) -> bool {
        self.excluded.iter().any(|e| e == relative)
    }

    #[must_use]
    pub fn page_options(&self) -> PageOptions {
        PageOptions {
            head_insert: self.head_insert.clone(),
            body_insert: self.body_insert.clone(),
        }
    }
}
