//! Watch mode: rebuild outputs as sources change.
//!
//! Raw notify events are coalesced per path by [`ChangeDebouncer`], so an
//! editor emitting several events per save triggers one rebuild. Drained
//! changes are rebuilt on the rayon pool. Every recorded event bumps a
//! per-path generation counter; a rebuild snapshots the counter before
//! compiling and discards its result if the counter moved, so the newest
//! change always wins and stale output is never written.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};
use osml_compiler::{PluginRegistry, compile_page};
use tracing::debug;

use crate::build::{FileError, SOURCE_EXTENSION};
use crate::config::SiteConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// A debounced, coalesced filesystem change.
#[derive(Debug, Clone)]
pub struct Change {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

struct PendingChange {
    kind: ChangeKind,
    deadline: Instant,
}

/// Thread-safe per-path change coalescer.
///
/// `record` is called from the notify callback thread; `drain_ready` from
/// the rebuild loop. A change is held until no further event for its path
/// arrives within the debounce window.
pub struct ChangeDebouncer {
    pending: Mutex<HashMap<PathBuf, PendingChange>>,
    window: Duration,
}

impl ChangeDebouncer {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            window,
        }
    }

    /// Record a raw event, coalescing it with any pending change for the
    /// same path and pushing the path's deadline out.
    pub fn record(&self, path: PathBuf, kind: ChangeKind) {
        let mut pending = self.pending.lock().unwrap();
        let deadline = Instant::now() + self.window;

        match pending.entry(path) {
            Entry::Vacant(entry) => {
                entry.insert(PendingChange { kind, deadline });
            }
            Entry::Occupied(mut entry) => match coalesce(entry.get().kind, kind) {
                Some(kind) => {
                    *entry.get_mut() = PendingChange { kind, deadline };
                }
                // Created then Removed: the file never existed for us.
                None => {
                    entry.remove();
                }
            },
        }
    }

    /// Take every change whose debounce window has elapsed.
    pub fn drain_ready(&self) -> Vec<Change> {
        let mut pending = self.pending.lock().unwrap();
        let now = Instant::now();

        let ready: Vec<PathBuf> = pending
            .iter()
            .filter(|(_, change)| change.deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();

        ready
            .into_iter()
            .filter_map(|path| {
                let change = pending.remove(&path)?;
                Some(Change {
                    path,
                    kind: change.kind,
                })
            })
            .collect()
    }
}

fn coalesce(existing: ChangeKind, new: ChangeKind) -> Option<ChangeKind> {
    use ChangeKind::{Created, Modified, Removed};

    match (existing, new) {
        (Created, Created | Modified) => Some(Created),
        // The pending create never happened as far as consumers know.
        (Created, Removed) => None,
        // Recreated after a modify still needs a fresh output.
        (Modified, Created) => Some(Created),
        (Modified, Modified) => Some(Modified),
        (Modified | Removed, Removed) => Some(Removed),
        // Removed then recreated reads as a content change.
        (Removed, Created) => Some(Modified),
        // Modify events for a removed file are noise.
        (Removed, Modified) => Some(Removed),
    }
}

/// Per-path generation counters backing last-write-wins rebuilds.
#[derive(Default)]
struct Generations {
    counters: Mutex<HashMap<PathBuf, u64>>,
}

impl Generations {
    fn bump(&self, path: &Path) {
        let mut counters = self.counters.lock().unwrap();
        *counters.entry(path.to_path_buf()).or_insert(0) += 1;
    }

    fn current(&self, path: &Path) -> u64 {
        let counters = self.counters.lock().unwrap();
        counters.get(path).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Quiet period a path must see before its change is acted on.
    pub debounce: Duration,
    /// How often the rebuild loop polls for ready changes.
    pub poll_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(200),
            poll_interval: Duration::from_millis(50),
        }
    }
}

/// What the watcher did in response to one drained change.
#[derive(Debug)]
pub enum WatchOutcome {
    /// A source was recompiled; path relative to the output directory.
    Compiled(PathBuf),
    /// A static asset was copied; path relative to the static directory.
    Copied(PathBuf),
    /// An output file was deleted after its source went away.
    Removed(PathBuf),
    /// A source failed to compile or an output could not be written.
    Failed { path: PathBuf, error: FileError },
    /// A newer change arrived while this one was compiling; its result
    /// was discarded.
    Superseded(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("failed to watch {path}: {source}")]
    Watch {
        path: PathBuf,
        source: notify::Error,
    },

    #[error(transparent)]
    Notify(#[from] notify::Error),
}

/// Watch the source and static directories and rebuild on change. Runs
/// until the process is interrupted; `on_outcome` is called for every
/// handled change (possibly from multiple worker threads at once).
pub fn watch_project(
    config: &SiteConfig,
    registry: &PluginRegistry,
    options: &WatchOptions,
    on_outcome: &(dyn Fn(&WatchOutcome) + Sync),
) -> Result<(), WatchError> {
    let debouncer = Arc::new(ChangeDebouncer::new(options.debounce));
    let generations = Arc::new(Generations::default());

    let mut watcher = {
        let debouncer = Arc::clone(&debouncer);
        let generations = Arc::clone(&generations);
        notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
            let Ok(event) = event else { return };
            let Some(kind) = change_kind(&event.kind) else {
                return;
            };
            for path in event.paths {
                generations.bump(&path);
                debouncer.record(path, kind);
            }
        })?
    };
    for dir in [&config.source_dir, &config.static_dir] {
        if dir.is_dir() {
            watcher
                .watch(dir, RecursiveMode::Recursive)
                .map_err(|source| WatchError::Watch {
                    path: dir.clone(),
                    source,
                })?;
        }
    }
    debug!(project = %config.project_dir.display(), "watching for changes");

    loop {
        thread::sleep(options.poll_interval);
        let changes = debouncer.drain_ready();
        if changes.is_empty() {
            continue;
        }
        rayon::scope(|scope| {
            for change in &changes {
                scope.spawn(|_| {
                    if let Some(outcome) = rebuild(config, registry, &generations, change) {
                        on_outcome(&outcome);
                    }
                });
            }
        });
    }
}

/// Map a notify event class onto a change kind. Access and metadata-only
/// events are ignored.
fn change_kind(kind: &notify::EventKind) -> Option<ChangeKind> {
    match kind {
        notify::EventKind::Create(_) => Some(ChangeKind::Created),
        notify::EventKind::Modify(_) => Some(ChangeKind::Modified),
        notify::EventKind::Remove(_) => Some(ChangeKind::Removed),
        _ => None,
    }
}

/// Handle one drained change. Returns `None` for paths the build does not
/// care about (non-source files, excluded sources, directories).
fn rebuild(
    config: &SiteConfig,
    registry: &PluginRegistry,
    generations: &Generations,
    change: &Change,
) -> Option<WatchOutcome> {
    if let Ok(relative) = change.path.strip_prefix(&config.source_dir) {
        if relative.extension().is_some_and(|e| e == SOURCE_EXTENSION)
            && !config.is_excluded(relative)
        {
            return Some(rebuild_source(config, registry, generations, change, relative));
        }
        return None;
    }
    if let Ok(relative) = change.path.strip_prefix(&config.static_dir) {
        return refresh_static(config, change, relative);
    }
    None
}

fn rebuild_source(
    config: &SiteConfig,
    registry: &PluginRegistry,
    generations: &Generations,
    change: &Change,
    relative: &Path,
) -> WatchOutcome {
    let output_relative = relative.with_extension("html");
    let output = config.output_dir.join(&output_relative);

    if change.kind == ChangeKind::Removed {
        return match fs::remove_file(&output) {
            Ok(()) => WatchOutcome::Removed(output_relative),
            // Never produced or already gone; nothing to clean up.
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                WatchOutcome::Removed(output_relative)
            }
            Err(error) => WatchOutcome::Failed {
                path: relative.to_path_buf(),
                error: error.into(),
            },
        };
    }

    let generation = generations.current(&change.path);
    let page = config.page_options();
    let html = match fs::read_to_string(&change.path)
        .map_err(FileError::from)
        .and_then(|source| compile_page(&source, registry, &page).map_err(FileError::from))
    {
        Ok(html) => html,
        Err(error) => {
            return WatchOutcome::Failed {
                path: relative.to_path_buf(),
                error,
            };
        }
    };

    // A change recorded while this compile ran wins; drop the result.
    if generations.current(&change.path) != generation {
        debug!(path = %change.path.display(), "rebuild superseded");
        return WatchOutcome::Superseded(relative.to_path_buf());
    }

    let write = output
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| fs::write(&output, html));
    match write {
        Ok(()) => WatchOutcome::Compiled(output_relative),
        Err(error) => WatchOutcome::Failed {
            path: relative.to_path_buf(),
            error: error.into(),
        },
    }
}

fn refresh_static(config: &SiteConfig, change: &Change, relative: &Path) -> Option<WatchOutcome> {
    let target = config.static_output_dir().join(relative);

    if change.kind == ChangeKind::Removed {
        return match fs::remove_file(&target) {
            Ok(()) => Some(WatchOutcome::Removed(Path::new("static").join(relative))),
            Err(error) if error.kind() == io::ErrorKind::NotFound => None,
            Err(error) => Some(WatchOutcome::Failed {
                path: relative.to_path_buf(),
                error: error.into(),
            }),
        };
    }

    // Directory creation events carry no content to copy.
    if !change.path.is_file() {
        return None;
    }
    let copy = target
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| fs::copy(&change.path, &target).map(|_| ()));
    match copy {
        Ok(()) => Some(WatchOutcome::Copied(relative.to_path_buf())),
        Err(error) => Some(WatchOutcome::Failed {
            path: relative.to_path_buf(),
            error: error.into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_change_held_until_window_elapses() {
        let debouncer = ChangeDebouncer::new(Duration::from_millis(10));
        let path = PathBuf::from("/p/src/a.osml");

        debouncer.record(path.clone(), ChangeKind::Modified);
        assert!(debouncer.drain_ready().is_empty());

        thread::sleep(Duration::from_millis(15));
        let changes = debouncer.drain_ready();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, path);
        assert_eq!(changes[0].kind, ChangeKind::Modified);

        assert!(debouncer.drain_ready().is_empty());
    }

    #[test]
    fn test_burst_of_saves_coalesces_to_one_change() {
        let debouncer = ChangeDebouncer::new(Duration::from_millis(10));
        let path = PathBuf::from("/p/src/a.osml");

        for _ in 0..3 {
            debouncer.record(path.clone(), ChangeKind::Modified);
        }
        thread::sleep(Duration::from_millis(15));
        assert_eq!(debouncer.drain_ready().len(), 1);
    }

    #[test]
    fn test_create_then_remove_cancels_out() {
        let debouncer = ChangeDebouncer::new(Duration::from_millis(10));
        let path = PathBuf::from("/p/src/a.osml");

        debouncer.record(path.clone(), ChangeKind::Created);
        debouncer.record(path, ChangeKind::Removed);
        thread::sleep(Duration::from_millis(15));
        assert!(debouncer.drain_ready().is_empty());
    }

    #[test]
    fn test_paths_debounce_independently() {
        let debouncer = ChangeDebouncer::new(Duration::from_millis(10));
        debouncer.record(PathBuf::from("/p/src/a.osml"), ChangeKind::Modified);
        debouncer.record(PathBuf::from("/p/src/b.osml"), ChangeKind::Created);
        thread::sleep(Duration::from_millis(15));
        assert_eq!(debouncer.drain_ready().len(), 2);
    }

    #[test]
    fn test_coalescing_matrix() {
        use ChangeKind::{Created, Modified, Removed};

        assert_eq!(coalesce(Created, Created), Some(Created));
        assert_eq!(coalesce(Created, Modified), Some(Created));
        assert_eq!(coalesce(Created, Removed), None);
        assert_eq!(coalesce(Modified, Created), Some(Created));
        assert_eq!(coalesce(Modified, Modified), Some(Modified));
        assert_eq!(coalesce(Modified, Removed), Some(Removed));
        assert_eq!(coalesce(Removed, Created), Some(Modified));
        assert_eq!(coalesce(Removed, Modified), Some(Removed));
        assert_eq!(coalesce(Removed, Removed), Some(Removed));
    }

    #[test]
    fn test_generations_count_per_path() {
        let generations = Generations::default();
        let a = Path::new("/p/a.osml");
        let b = Path::new("/p/b.osml");

        assert_eq!(generations.current(a), 0);
        generations.bump(a);
        generations.bump(a);
        generations.bump(b);
        assert_eq!(generations.current(a), 2);
        assert_eq!(generations.current(b), 1);
    }

    #[test]
    fn test_change_kind_mapping() {
        use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};

        assert_eq!(
            change_kind(&notify::EventKind::Create(CreateKind::File)),
            Some(ChangeKind::Created)
        );
        assert_eq!(
            change_kind(&notify::EventKind::Modify(ModifyKind::Any)),
            Some(ChangeKind::Modified)
        );
        assert_eq!(
            change_kind(&notify::EventKind::Remove(RemoveKind::File)),
            Some(ChangeKind::Removed)
        );
        assert_eq!(
            change_kind(&notify::EventKind::Access(AccessKind::Any)),
            None
        );
    }

    fn project(dir: &TempDir) -> SiteConfig {
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("static")).unwrap();
        SiteConfig::load(dir.path()).unwrap()
    }

    #[test]
    fn test_rebuild_modified_source() {
        let dir = TempDir::new().unwrap();
        let config = project(&dir);
        let source = config.source_dir.join("page.osml");
        fs::write(&source, "[title Hi]").unwrap();

        let outcome = rebuild(
            &config,
            &PluginRegistry::with_builtins(),
            &Generations::default(),
            &Change {
                path: source,
                kind: ChangeKind::Modified,
            },
        );
        assert!(matches!(outcome, Some(WatchOutcome::Compiled(p)) if p == Path::new("page.html")));
        assert!(config.output_dir.join("page.html").exists());
    }

    #[test]
    fn test_rebuild_reports_compile_failure() {
        let dir = TempDir::new().unwrap();
        let config = project(&dir);
        let source = config.source_dir.join("bad.osml");
        fs::write(&source, "[never closed").unwrap();

        let outcome = rebuild(
            &config,
            &PluginRegistry::with_builtins(),
            &Generations::default(),
            &Change {
                path: source,
                kind: ChangeKind::Modified,
            },
        );
        assert!(matches!(outcome, Some(WatchOutcome::Failed { .. })));
        assert!(!config.output_dir.join("bad.html").exists());
    }

    #[test]
    fn test_removed_source_deletes_output() {
        let dir = TempDir::new().unwrap();
        let config = project(&dir);
        fs::create_dir_all(&config.output_dir).unwrap();
        fs::write(config.output_dir.join("gone.html"), "old").unwrap();

        let outcome = rebuild(
            &config,
            &PluginRegistry::new(),
            &Generations::default(),
            &Change {
                path: config.source_dir.join("gone.osml"),
                kind: ChangeKind::Removed,
            },
        );
        assert!(matches!(outcome, Some(WatchOutcome::Removed(_))));
        assert!(!config.output_dir.join("gone.html").exists());
    }

    #[test]
    fn test_static_change_is_copied() {
        let dir = TempDir::new().unwrap();
        let config = project(&dir);
        let asset = config.static_dir.join("style.css");
        fs::write(&asset, "body{}").unwrap();

        let outcome = rebuild(
            &config,
            &PluginRegistry::new(),
            &Generations::default(),
            &Change {
                path: asset,
                kind: ChangeKind::Created,
            },
        );
        assert!(matches!(outcome, Some(WatchOutcome::Copied(_))));
        assert_eq!(
            fs::read_to_string(config.static_output_dir().join("style.css")).unwrap(),
            "body{}"
        );
    }

    #[test]
    fn test_non_source_and_excluded_changes_are_ignored() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("osml.toml"),
            "[site]\nexcluded = [\"skip.osml\"]\n",
        )
        .unwrap();
        let config = SiteConfig::load(dir.path()).unwrap();
        fs::write(config.source_dir.join("notes.txt"), "x").unwrap();
        fs::write(config.source_dir.join("skip.osml"), "x").unwrap();

        let registry = PluginRegistry::new();
        let generations = Generations::default();
        for name in ["notes.txt", "skip.osml"] {
            let outcome = rebuild(
                &config,
                &registry,
                &generations,
                &Change {
                    path: config.source_dir.join(name),
                    kind: ChangeKind::Modified,
                },
            );
            assert!(outcome.is_none());
        }
    }
}
