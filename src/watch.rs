//! Rebuild-on-change with single-flight builds.
//!
//! Changes come from a `notify` watcher on the source directory and on the
//! directories holding the person registry and the bibliography.
//!
//! A change seen while a build is running does not start a second build
//! against the same output files. It marks the gate dirty, and the running
//! build goes around once more when it finishes. Any number of changes
//! during one build collapse into that single follow-up.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc};
use std::thread;

use notify::{Event, EventKind, RecursiveMode, Watcher};

use crate::config::BuildConfig;
use crate::error::{Error, Result};
use crate::source::SOURCE_EXTENSION;

#[derive(Debug, Default)]
struct GateState {
    running: bool,
    pending: bool,
}

/// What happened to a build request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// This caller ran the build, `runs` times in total.
    Completed { runs: usize },
    /// Another build was in flight; it will run once more.
    Queued,
}

/// Serializes builds: at most one in flight, at most one queued.
#[derive(Debug, Default)]
pub struct BuildGate {
    state: Mutex<GateState>,
}

/// Clears the running flag if a build panics.
struct RunningGuard<'a> {
    gate: &'a BuildGate,
    armed: bool,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.gate.lock();
            state.running = false;
            state.pending = false;
        }
    }
}

impl BuildGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `build`, or queue a rerun if a build is already in flight.
    pub fn run<F: FnMut()>(&self, mut build: F) -> Admission {
        {
            let mut state = self.lock();
            if state.running {
                state.pending = true;
                return Admission::Queued;
            }
            state.running = true;
        }

        let mut guard = RunningGuard {
            gate: self,
            armed: true,
        };
        let mut runs = 0;
        loop {
            build();
            runs += 1;

            let mut state = self.lock();
            if !state.pending {
                // Cleared under the same lock that saw no pending request,
                // so a request arriving after this point starts its own build.
                state.running = false;
                guard.armed = false;
                return Admission::Completed { runs };
            }
            state.pending = false;
            tracing::debug!("sources changed during build, rebuilding");
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }
}

/// The files a build reads, resolved for matching against watch events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTargets {
    source_dir: PathBuf,
    files: Vec<PathBuf>,
}

impl WatchTargets {
    /// Sources in `source_dir` plus the individual `files` (registry, bibliography).
    ///
    /// The source directory and each file's parent must exist; the files
    /// themselves may appear later.
    pub fn new(source_dir: &Path, files: &[&Path]) -> Result<Self> {
        Ok(Self {
            source_dir: canonical(source_dir)?,
            files: files.iter().map(|f| resolve_file(f)).collect::<Result<_>>()?,
        })
    }

    pub fn from_config(config: &BuildConfig) -> Result<Self> {
        Self::new(
            &config.source_dir,
            &[config.people.as_path(), config.bibliography.as_path()],
        )
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Directories to register with the watcher, each once.
    pub fn directories(&self) -> BTreeSet<PathBuf> {
        let mut dirs = BTreeSet::from([self.source_dir.clone()]);
        dirs.extend(self.files.iter().filter_map(|f| f.parent().map(Path::to_path_buf)));
        dirs
    }

    /// Whether `event` touches a source or one of the data files.
    pub fn is_relevant(&self, event: &Event) -> bool {
        if matches!(event.kind, EventKind::Access(_)) {
            return false;
        }
        event.paths.iter().any(|path| self.matches(path))
    }

    fn matches(&self, path: &Path) -> bool {
        if self.files.iter().any(|f| f == path) {
            return true;
        }
        path.parent() == Some(self.source_dir.as_path())
            && path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|source| Error::Path {
        path: path.to_path_buf(),
        source,
    })
}

/// Canonical parent joined with the file name, so missing files still resolve.
fn resolve_file(path: &Path) -> Result<PathBuf> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let dir = canonical(parent)?;
    Ok(match path.file_name() {
        Some(name) => dir.join(name),
        None => dir,
    })
}

/// Watch `targets` until the process exits, running `build` through `gate`
/// on every relevant change.
///
/// Builds run on their own threads so events keep draining while one is in
/// flight; the gate keeps them from overlapping.
pub fn watch<F>(targets: &WatchTargets, gate: Arc<BuildGate>, build: F) -> Result<()>
where
    F: Fn() + Send + Sync + 'static,
{
    let build = Arc::new(build);
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let _ = tx.send(res);
    })?;
    for dir in targets.directories() {
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!("watching {} for changes", dir.display());
    }

    for res in &rx {
        match res {
            Ok(event) if targets.is_relevant(&event) => {
                tracing::debug!("change in {:?}", event.paths);
            }
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!("watch error: {e}");
                continue;
            }
        }
        // One save tends to arrive as a burst; the build reads whatever is on disk.
        for _ in rx.try_iter() {}

        let gate = Arc::clone(&gate);
        let build = Arc::clone(&build);
        thread::spawn(move || {
            if gate.run(|| (*build)()) == Admission::Queued {
                tracing::debug!("build in flight, queued a rebuild");
            }
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use notify::event::{AccessKind, DataChange, ModifyKind, RemoveKind};

    use super::*;

    #[test]
    fn test_idle_gate_runs_once() {
        let gate = BuildGate::new();
        let mut count = 0;

        assert_eq!(gate.run(|| count += 1), Admission::Completed { runs: 1 });
        assert_eq!(count, 1);
        assert!(!gate.is_running());
    }

    #[test]
    fn test_requests_during_build_coalesce_into_one_rerun() {
        let gate = Arc::new(BuildGate::new());
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let worker = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let mut first = true;
                gate.run(|| {
                    if first {
                        first = false;
                        started_tx.send(()).unwrap();
                        release_rx.recv().unwrap();
                    }
                })
            })
        };

        started_rx.recv().unwrap();
        assert_eq!(gate.run(|| panic!("must not run concurrently")), Admission::Queued);
        assert_eq!(gate.run(|| panic!("must not run concurrently")), Admission::Queued);
        release_tx.send(()).unwrap();

        assert_eq!(worker.join().unwrap(), Admission::Completed { runs: 2 });
        assert!(!gate.is_running());
    }

    #[test]
    fn test_panicking_build_releases_gate() {
        let gate = BuildGate::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            gate.run(|| panic!("boom"));
        }));

        assert!(result.is_err());
        assert!(!gate.is_running());
    }

    fn modified(path: PathBuf) -> Event {
        Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content))).add_path(path)
    }

    fn project() -> (tempfile::TempDir, WatchTargets) {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("src")).unwrap();
        std::fs::create_dir(root.path().join("data")).unwrap();
        let config = BuildConfig {
            source_dir: root.path().join("src"),
            people: root.path().join("data/people.json"),
            bibliography: root.path().join("data/biblio.json"),
            ..BuildConfig::default()
        };
        let targets = WatchTargets::from_config(&config).unwrap();
        (root, targets)
    }

    #[test]
    fn test_data_files_trigger_rebuilds() {
        let (root, targets) = project();
        let data = root.path().canonicalize().unwrap().join("data");

        assert!(targets.is_relevant(&modified(data.join("people.json"))));
        assert!(targets.is_relevant(&modified(data.join("biblio.json"))));
        assert!(!targets.is_relevant(&modified(data.join("notes.json"))));
    }

    #[test]
    fn test_only_sources_in_source_dir_are_relevant() {
        let (root, targets) = project();
        let src = root.path().canonicalize().unwrap().join("src");

        assert!(targets.is_relevant(&modified(src.join("a.html"))));
        assert!(targets.is_relevant(&Event::new(EventKind::Remove(RemoveKind::File)).add_path(src.join("a.html"))));
        assert!(!targets.is_relevant(&modified(src.join("a.html~"))));
        assert!(!targets.is_relevant(&modified(src.join("nested/b.html"))));
        assert!(!targets.is_relevant(&Event::new(EventKind::Access(AccessKind::Any)).add_path(src.join("a.html"))));
    }

    #[test]
    fn test_directories_are_registered_once() {
        let (root, targets) = project();
        let root = root.path().canonicalize().unwrap();

        assert_eq!(targets.source_dir(), root.join("src"));
        assert_eq!(
            targets.directories().into_iter().collect::<Vec<_>>(),
            vec![root.join("data"), root.join("src")]
        );
    }

    #[test]
    fn test_missing_source_dir_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("nope");

        assert!(matches!(
            WatchTargets::new(&missing, &[]),
            Err(Error::Path { ref path, .. }) if *path == missing
        ));
    }
}
