//! CLI error types.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    /// Configuration or output-file errors from the stages themselves
    #[error(transparent)]
    #[diagnostic(transparent)]
    PostBuild(#[from] fob_postbuild::Error),

    /// The working directory could not be determined
    #[error("Cannot determine working directory: {0}")]
    #[diagnostic(code(fob::cli::cwd))]
    Cwd(#[source] std::io::Error),

    /// An explicit `--config` file does not exist
    #[error("Configuration file not found: {}", .0.display())]
    #[diagnostic(code(fob::cli::config_not_found))]
    ConfigNotFound(PathBuf),

    /// An entry point given on the command line does not exist
    #[error("Entry point not found: {}", .0.display())]
    #[diagnostic(
        code(fob::cli::entry_not_found),
        help("Entry points are resolved against the working directory (see --cwd)")
    )]
    EntryNotFound(PathBuf),

    /// One or more stages reported errors in the build result
    #[error("Post-build failed with {count} error(s)")]
    #[diagnostic(code(fob::cli::build_failed))]
    BuildFailed { count: usize },
}

pub type Result<T> = std::result::Result<T, CliError>;
