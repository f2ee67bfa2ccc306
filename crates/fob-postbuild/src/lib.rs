#![cfg_attr(docsrs, feature(doc_cfg))]

//! # fob-postbuild
//!
//! Post-build stages for fob library builds.
//!
//! The bundler emits JavaScript; these stages extend that output:
//!
//! - [`EntryTracker`] records which TypeScript sources the bundler loaded
//! - [`DeclarationEmitter`] emits `.d.ts` files for the package's entry
//!   points with an isolated type-checker run, then links each declaration
//!   into its sibling `.js` with a triple-slash reference
//! - [`UmdWrapper`] rewrites emitted CommonJS into a UMD module usable from
//!   AMD loaders, CommonJS and plain `<script>` tags
//!
//! ## Quick Start
//!
//! ```no_run
//! use fob_postbuild::{
//!     BuildContext, BuildOptions, BuildResult, DeclarationEmitter, EntryTracker, PostBuild,
//!     UmdWrapper,
//! };
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = BuildContext::new(
//!     BuildOptions::new("/project/dist")
//!         .cwd("/project")
//!         .root_dir("src")
//!         .entry("src/index.ts"),
//! );
//!
//! // Register with the bundler's load hook (or pass it as a rolldown plugin).
//! let tracker = EntryTracker::new(ctx.tracked_files());
//! tracker.on_load(Path::new("/project/src/index.ts"));
//!
//! let pipeline = PostBuild::new()
//!     .hook(DeclarationEmitter::new())
//!     .hook(UmdWrapper::new("MyLib"));
//!
//! let mut result = BuildResult::new();
//! pipeline.run(&ctx, &mut result).await?;
//! for error in &result.errors {
//!     eprintln!("{}", error);
//! }
//! # Ok(()) }
//! ```

pub mod config;
pub mod context;
pub mod dts;
pub mod pipeline;
pub mod reference;
pub mod result;
pub mod tracker;
pub mod umd;

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

pub use config::{DtsConfig, PostBuildConfig, UmdConfig};
pub use context::{BuildContext, BuildOptions, TrackedFiles};
pub use dts::{CheckerSource, DeclarationEmitter, EsTarget, ModuleKind, TypeChecker};
pub use pipeline::{BuildEndHook, PostBuild};
pub use reference::ReferenceInjector;
pub use result::{BuildMessage, BuildResult, Location};
pub use tracker::{EntryTracker, LoadOverride};
pub use umd::UmdWrapper;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{LogLevel, init_logging, init_logging_from_env, init_logging_with_color};

use std::path::PathBuf;

/// Error types for post-build operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error on an output artifact.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded.
    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] Box<figment::Error>),
}

/// Result type alias for post-build operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Io { .. } => "IO_ERROR",
            Error::ConfigLoad(_) => "CONFIG_LOAD",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::InvalidConfig(msg) => Some(Box::new(format!(
                "Check your configuration file for invalid values.\nError: {}",
                msg
            ))),
            Error::Io { path, .. } => Some(Box::new(format!(
                "Failed to rewrite '{}'. Check disk space and permissions; the output directory may be partially processed and should be rebuilt.",
                path.display()
            ))),
            Error::ConfigLoad(_) => Some(Box::new(
                "Check fob-postbuild.json syntax and FOB_POSTBUILD_* environment variables",
            )),
        }
    }
}
