//! Per-build state shared between the post-build stages.
//!
//! A [`BuildContext`] lives for exactly one build invocation. It carries the
//! options the host bundler was configured with and the set of TypeScript
//! sources the [`EntryTracker`](crate::EntryTracker) saw during loading.
//! Contexts never share state, so concurrent or repeated builds stay isolated.

use indexmap::IndexSet;
use parking_lot::Mutex;
use path_clean::PathClean;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options the host exposes to build-end hooks.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Base directory for resolving relative entry points.
    pub cwd: PathBuf,
    /// Source root; emitted declarations mirror its relative layout.
    pub root_dir: PathBuf,
    /// Directory the bundler wrote its output to.
    pub out_dir: PathBuf,
    /// Source files the package publishes.
    pub entry_points: Vec<PathBuf>,
}

impl BuildOptions {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            cwd: PathBuf::from("."),
            root_dir: PathBuf::from("src"),
            out_dir: out_dir.into(),
            entry_points: Vec::new(),
        }
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    pub fn root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    pub fn entry(mut self, entry: impl Into<PathBuf>) -> Self {
        self.entry_points.push(entry.into());
        self
    }

    pub fn entries<I, P>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.entry_points.extend(entries.into_iter().map(Into::into));
        self
    }

    /// Resolve a path against `cwd` and clean `.`/`..` components.
    ///
    /// A relative `cwd` (including the default `.`) is taken relative to the
    /// process working directory, so the result is always absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf().clean()
        } else {
            self.base_dir().join(path).clean()
        }
    }

    fn base_dir(&self) -> PathBuf {
        if self.cwd.is_absolute() {
            return self.cwd.clone();
        }
        match std::env::current_dir() {
            Ok(dir) => dir.join(&self.cwd),
            Err(_) => self.cwd.clone(),
        }
    }

    /// Absolute, cleaned entry points.
    pub fn resolved_entries(&self) -> Vec<PathBuf> {
        self.entry_points.iter().map(|p| self.resolve(p)).collect()
    }

    /// Absolute, cleaned output directory.
    pub fn resolved_out_dir(&self) -> PathBuf {
        self.resolve(&self.out_dir)
    }

    /// Absolute, cleaned source root.
    pub fn resolved_root_dir(&self) -> PathBuf {
        self.resolve(&self.root_dir)
    }
}

/// Insertion-ordered, duplicate-free set of source paths seen during a build.
///
/// Cloning yields another handle to the same set, which is how the load hook
/// and the build-end hooks observe one collection.
#[derive(Debug, Clone, Default)]
pub struct TrackedFiles {
    inner: Arc<Mutex<IndexSet<PathBuf>>>,
}

impl TrackedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a path. Returns `true` when it was not already present.
    pub fn insert(&self, path: impl Into<PathBuf>) -> bool {
        self.inner.lock().insert(path.into())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.inner.lock().contains(path)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Paths in the order they were first recorded.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.inner.lock().iter().cloned().collect()
    }
}

/// State for a single build invocation.
#[derive(Debug, Clone)]
pub struct BuildContext {
    options: BuildOptions,
    tracked: TrackedFiles,
}

impl BuildContext {
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            tracked: TrackedFiles::new(),
        }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Handle to this build's tracked file set.
    pub fn tracked_files(&self) -> TrackedFiles {
        self.tracked.clone()
    }

    /// Tracked files whose resolved path is a configured entry point.
    ///
    /// Order follows the tracked set. Files outside the entry set are never
    /// included, even when they were loaded.
    pub fn emission_plan(&self) -> Vec<PathBuf> {
        let entries: IndexSet<PathBuf> = self.options.resolved_entries().into_iter().collect();
        self.tracked
            .snapshot()
            .into_iter()
            .filter(|path| entries.contains(&self.options.resolve(path)))
            .collect()
    }
}
