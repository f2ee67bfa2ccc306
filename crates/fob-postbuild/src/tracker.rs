//! Entry tracking through the bundler's load hook.
//!
//! The tracker records every TypeScript-family file the bundler loads into
//! the build's [`TrackedFiles`]. It never overrides loading, so the bundler
//! proceeds with its normal pipeline. Unlike the bundler's module graph this
//! list is available to build-end hooks without any extra resolution work.

use crate::{Error, Result, TrackedFiles};
use regex::Regex;
use rolldown_plugin::{HookLoadArgs, HookLoadReturn, HookUsage, Plugin, PluginContext};
use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;
use tracing::trace;

/// Default load filter: `.ts` and `.tsx` sources.
pub const DEFAULT_LOAD_FILTER: &str = r"\.tsx?$";

static DEFAULT_FILTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_LOAD_FILTER).expect("default load filter is valid"));

/// Replacement content for a loaded file.
///
/// The tracker always passes through, so it never constructs one; the type
/// exists so `on_load` has the same shape as any other load hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOverride {
    pub contents: String,
}

/// Load hook that feeds the tracked file set.
#[derive(Debug, Clone)]
pub struct EntryTracker {
    filter: Regex,
    tracked: TrackedFiles,
}

impl EntryTracker {
    /// Track `.ts`/`.tsx` loads into `tracked`.
    pub fn new(tracked: TrackedFiles) -> Self {
        Self {
            filter: DEFAULT_FILTER.clone(),
            tracked,
        }
    }

    /// Track loads whose path matches `pattern`.
    pub fn with_filter(tracked: TrackedFiles, pattern: &str) -> Result<Self> {
        let filter = Regex::new(pattern).map_err(|e| {
            Error::InvalidConfig(format!("invalid load filter '{}': {}", pattern, e))
        })?;
        Ok(Self { filter, tracked })
    }

    pub fn tracked_files(&self) -> &TrackedFiles {
        &self.tracked
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.filter.is_match(&path.to_string_lossy())
    }

    /// Handle a load event. Always passes through.
    pub fn on_load(&self, path: &Path) -> Option<LoadOverride> {
        if self.matches(path) && self.tracked.insert(path) {
            trace!("[fob-entry-tracker] tracked {}", path.display());
        }
        None
    }
}

impl Plugin for EntryTracker {
    fn name(&self) -> Cow<'static, str> {
        "fob-entry-tracker".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Load
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        self.on_load(Path::new(args.id));

        async move {
            // Don't modify load behavior
            Ok(None)
        }
    }
}
