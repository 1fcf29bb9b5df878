//! Project scaffolding and output cleanup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{CONFIG_FILENAME, SiteConfig};

/// An I/O failure while creating or cleaning project directories.
#[derive(Debug, thiserror::Error)]
#[error("failed to {action} {path}: {source}")]
pub struct ScaffoldError {
    action: &'static str,
    path: PathBuf,
    source: io::Error,
}

impl ScaffoldError {
    fn new(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

const DEFAULT_CONFIG: &str = r#"[site]
source_dir = "src"
static_dir = "static"
output_dir = "dist"
excluded = []

[page]
head_insert = ""
body_insert = ""
"#;

const STARTER_DOC: &str = r"[title Welcome]
[section
    Your project is ready. Edit src/index.osml and run osml build.
]
";

/// Create the project skeleton: `src/`, `static/`, `dist/`,
/// `dist/static/`, a default `osml.toml` and a starter `src/index.osml`.
///
/// Idempotent: existing directories are left alone and existing files
/// are never overwritten.
pub fn create_project(project_dir: &Path) -> Result<(), ScaffoldError> {
    for dir in [
        project_dir.to_path_buf(),
        project_dir.join("src"),
        project_dir.join("static"),
        project_dir.join("dist"),
        project_dir.join("dist/static"),
    ] {
        fs::create_dir_all(&dir).map_err(|e| ScaffoldError::new("create", &dir, e))?;
    }

    write_if_absent(&project_dir.join(CONFIG_FILENAME), DEFAULT_CONFIG)?;
    write_if_absent(&project_dir.join("src/index.osml"), STARTER_DOC)?;
    debug!(path = %project_dir.display(), "project scaffolded");
    Ok(())
}

/// Delete everything under the output directory, then restore the empty
/// skeleton (`dist/` and `dist/static/`).
pub fn purge_output(config: &SiteConfig) -> Result<(), ScaffoldError> {
    match fs::remove_dir_all(&config.output_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(ScaffoldError::new("remove", &config.output_dir, e)),
    }
    let static_out = config.static_output_dir();
    fs::create_dir_all(&static_out).map_err(|e| ScaffoldError::new("create", &static_out, e))?;
    debug!(path = %config.output_dir.display(), "output purged");
    Ok(())
}

fn write_if_absent(path: &Path, content: &str) -> Result<(), ScaffoldError> {
    if path.exists() {
        return Ok(());
    }
    fs::write(path, content).map_err(|e| ScaffoldError::new("write", path, e))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_create_makes_skeleton() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("mysite");
        create_project(&root).unwrap();

        assert!(root.join("src").is_dir());
        assert!(root.join("static").is_dir());
        assert!(root.join("dist/static").is_dir());
        assert!(root.join(CONFIG_FILENAME).is_file());
        assert!(root.join("src/index.osml").is_file());
    }

    #[test]
    fn test_create_is_idempotent() {
        let dir = TempDir::new().unwrap();
        create_project(dir.path()).unwrap();
        fs::write(dir.path().join("src/index.osml"), "edited").unwrap();

        create_project(dir.path()).unwrap();
        let content = fs::read_to_string(dir.path().join("src/index.osml")).unwrap();
        assert_eq!(content, "edited");
    }

    #[test]
    fn test_default_config_parses_to_defaults() {
        let dir = TempDir::new().unwrap();
        create_project(dir.path()).unwrap();
        let config = SiteConfig::load(dir.path()).unwrap();
        assert_eq!(config.source_dir, dir.path().join("src"));
        assert_eq!(config.output_dir, dir.path().join("dist"));
        assert!(config.excluded.is_empty());
    }

    #[test]
    fn test_starter_doc_compiles() {
        let registry = osml_compiler::PluginRegistry::with_builtins();
        let html = osml_compiler::compile(STARTER_DOC, &registry).unwrap();
        assert!(html.starts_with("<h1>Welcome</h1>"));
    }

    #[test]
    fn test_purge_empties_output_but_keeps_skeleton() {
        let dir = TempDir::new().unwrap();
        create_project(dir.path()).unwrap();
        let config = SiteConfig::load(dir.path()).unwrap();
        fs::write(config.output_dir.join("index.html"), "old").unwrap();
        fs::write(config.static_output_dir().join("style.css"), "old").unwrap();

        purge_output(&config).unwrap();
        assert!(!config.output_dir.join("index.html").exists());
        assert!(config.static_output_dir().is_dir());
        assert!(config.source_dir.join("index.osml").is_file());
    }

    #[test]
    fn test_purge_without_output_dir() {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::load(dir.path()).unwrap();
        purge_output(&config).unwrap();
        assert!(config.static_output_dir().is_dir());
    }
}
