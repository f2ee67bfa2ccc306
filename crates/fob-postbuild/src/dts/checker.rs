//! Type-checker backends used for declaration emission.
//!
//! The type-checker is an optional collaborator. [`CheckerSource::load`]
//! looks for one at stage entry and reports absence as `None`; it never
//! fails. Everything backend specific is built only once a checker is found.

use super::diagnostics::TypeDiagnostic;
use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// ECMAScript target passed to the type-checker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EsTarget {
    Es2015,
    Es2017,
    Es2018,
    Es2019,
    #[default]
    Es2020,
    Es2021,
    Es2022,
    EsNext,
}

impl EsTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            EsTarget::Es2015 => "es2015",
            EsTarget::Es2017 => "es2017",
            EsTarget::Es2018 => "es2018",
            EsTarget::Es2019 => "es2019",
            EsTarget::Es2020 => "es2020",
            EsTarget::Es2021 => "es2021",
            EsTarget::Es2022 => "es2022",
            EsTarget::EsNext => "esnext",
        }
    }
}

/// Module system the bundler emits, mirrored in the declarations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    #[default]
    CommonJs,
    Es2020,
    EsNext,
}

impl ModuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::CommonJs => "commonjs",
            ModuleKind::Es2020 => "es2020",
            ModuleKind::EsNext => "esnext",
        }
    }
}

/// Isolated compiler configuration for one emission.
///
/// Declarations only, no JavaScript. Library types are not checked, each file
/// is checked on its own and imports are never resolved, so exactly the
/// planned files are processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    pub target: EsTarget,
    pub module: ModuleKind,
    pub root_dir: PathBuf,
    pub out_dir: PathBuf,
    pub declaration_map: bool,
    /// Drop `@internal` declarations (native backend only).
    pub strip_internal: bool,
    pub emit_declaration_only: bool,
    pub skip_lib_check: bool,
    pub isolated_modules: bool,
    pub no_resolve: bool,
}

impl CompilerOptions {
    pub fn isolated(root_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            target: EsTarget::default(),
            module: ModuleKind::default(),
            root_dir: root_dir.into(),
            out_dir: out_dir.into(),
            declaration_map: false,
            strip_internal: false,
            emit_declaration_only: true,
            skip_lib_check: true,
            isolated_modules: true,
            no_resolve: true,
        }
    }

    pub fn target(mut self, target: EsTarget) -> Self {
        self.target = target;
        self
    }

    pub fn module(mut self, module: ModuleKind) -> Self {
        self.module = module;
        self
    }

    pub fn declaration_map(mut self, enabled: bool) -> Self {
        self.declaration_map = enabled;
        self
    }

    pub fn strip_internal(mut self, enabled: bool) -> Self {
        self.strip_internal = enabled;
        self
    }

    /// Output path for the declaration of `source`, mirroring `root_dir`.
    pub fn declaration_path(&self, source: &Path) -> PathBuf {
        let relative = source
            .strip_prefix(&self.root_dir)
            .ok()
            .map(Path::to_path_buf)
            .or_else(|| source.file_name().map(PathBuf::from))
            .unwrap_or_default();
        let mut out = self.out_dir.join(relative);
        let stem = out
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        out.set_file_name(format!("{}.d.ts", stem));
        out
    }
}

/// Result of a completed emission.
#[derive(Debug, Default)]
pub struct EmitOutput {
    pub diagnostics: Vec<TypeDiagnostic>,
    /// Declaration files the backend reports as written.
    pub emitted: Vec<PathBuf>,
}

/// Hard failures of a type-checker backend.
///
/// These are distinct from diagnostics: the backend could not run to
/// completion at all.
#[derive(Debug, Error, Diagnostic)]
pub enum CheckerError {
    #[error("Type-checker executable not found: {0}")]
    #[diagnostic(
        code(fob::dts::checker_not_found),
        help("Install TypeScript: npm install -D typescript")
    )]
    NotFound(PathBuf),

    #[error("Failed to spawn type-checker process: {source}")]
    #[diagnostic(code(fob::dts::spawn_failed))]
    SpawnFailed {
        #[source]
        source: std::io::Error,
    },

    #[error("Type-checker timed out after {timeout_secs} seconds")]
    #[diagnostic(
        code(fob::dts::timeout),
        help("Increase dts.timeout_secs or reduce the number of entry points")
    )]
    Timeout { timeout_secs: u64 },

    #[error("Type-checker exited with code {exit_code} without reporting diagnostics")]
    #[diagnostic(code(fob::dts::exit_error))]
    ExitError {
        exit_code: i32,
        #[help]
        output: String,
    },

    #[error("Type-checker produced invalid output: {source}")]
    #[diagnostic(code(fob::dts::invalid_output))]
    InvalidOutput {
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("I/O error on {path}: {source}")]
    #[diagnostic(code(fob::dts::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CheckerError {
    pub fn spawn_failed(source: std::io::Error) -> Self {
        Self::SpawnFailed { source }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A backend able to emit declaration files for a list of sources.
#[async_trait]
pub trait TypeChecker: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Emit declarations for exactly `files`, writing into `options.out_dir`.
    async fn emit(
        &self,
        files: &[PathBuf],
        options: &CompilerOptions,
    ) -> Result<EmitOutput, CheckerError>;
}

/// Where the declaration emitter gets its type-checker from.
#[derive(Debug, Clone, Default)]
pub enum CheckerSource {
    /// Probe the environment when the stage runs.
    #[default]
    Detect,
    /// Use a specific tsc executable; absent if it doesn't exist.
    Tsc(PathBuf),
    Fixed(Arc<dyn TypeChecker>),
    /// Behave as if no type-checker were installed.
    Disabled,
}

impl CheckerSource {
    /// Probe for a type-checker. `None` means declarations are skipped.
    pub async fn load(&self, project_root: &Path, timeout_secs: u64) -> Option<Arc<dyn TypeChecker>> {
        match self {
            CheckerSource::Disabled => None,
            CheckerSource::Fixed(checker) => Some(Arc::clone(checker)),
            CheckerSource::Tsc(path) => {
                let exists = tokio::fs::try_exists(path).await.unwrap_or(false);
                if !exists {
                    debug!("[fob-dts] configured tsc not found at {}", path.display());
                    return None;
                }
                Some(Arc::new(
                    super::tsc::TscChecker::new(path.clone(), project_root).with_timeout(timeout_secs),
                ))
            }
            CheckerSource::Detect => detect(project_root, timeout_secs).await,
        }
    }
}

async fn detect(project_root: &Path, timeout_secs: u64) -> Option<Arc<dyn TypeChecker>> {
    if let Some(tsc) = super::tsc::TscChecker::locate(project_root).await {
        debug!("[fob-dts] using tsc at {}", tsc.display());
        return Some(Arc::new(
            super::tsc::TscChecker::new(tsc, project_root).with_timeout(timeout_secs),
        ));
    }

    #[cfg(feature = "dts-generation")]
    {
        debug!("[fob-dts] tsc not found, using native isolated declarations");
        return Some(Arc::new(super::isolated::IsolatedDeclarationsChecker::new()));
    }

    #[cfg(not(feature = "dts-generation"))]
    {
        debug!("[fob-dts] no type-checker available");
        None
    }
}
