//! Command-line interface definition for `fob-postbuild`.
//!
//! The CLI plays the host bundler's part for an output directory that was
//! already built: it reports the entry points as loaded, then runs the
//! build-end stages once.

use clap::Parser;
use std::path::PathBuf;

/// Post-build stages for a fob library build
#[derive(Parser, Debug)]
#[command(
    name = "fob-postbuild",
    version,
    about = "Emit TypeScript declarations and UMD wrappers for a built library",
    long_about = "Runs the fob post-build stages against an existing output directory.\n\
                  Declarations are emitted for the given entry points with an isolated\n\
                  type-checker run and linked into the sibling .js files. With\n\
                  --global-name every .js output is also wrapped as a UMD module."
)]
pub struct Cli {
    /// Entry points, relative to the working directory
    ///
    /// Overrides `entry_points` from the configuration file when given.
    #[arg(value_name = "ENTRY")]
    pub entries: Vec<PathBuf>,

    /// Configuration file (defaults to fob-postbuild.json in the working directory)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Working directory all other paths are resolved against
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Output directory of the finished build
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Source root mirrored into the output directory
    #[arg(long, value_name = "DIR")]
    pub root_dir: Option<PathBuf>,

    /// Wrap every emitted .js file as UMD under this global name
    #[arg(short, long, value_parser = parse_global, value_name = "NAME")]
    pub global_name: Option<String>,

    /// Skip declaration emission
    #[arg(long)]
    pub no_dts: bool,

    /// Use this tsc executable instead of probing for one
    #[arg(long, value_name = "PATH", conflicts_with = "no_dts")]
    pub tsc: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Parse and validate a UMD global name.
///
/// Valid identifiers: MyLibrary, _internal, $jquery, lib123
/// Invalid identifiers: 123abc, my-lib, my.lib, ""
pub fn parse_global(s: &str) -> Result<String, String> {
    fob_postbuild::config::validate_global_name(s)
        .map(|()| s.to_string())
        .map_err(|e| match e {
            fob_postbuild::Error::InvalidConfig(msg) => msg,
            other => other.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_minimal() {
        let cli = Cli::try_parse_from(["fob-postbuild", "src/index.ts"]).unwrap();
        assert_eq!(cli.entries, vec![PathBuf::from("src/index.ts")]);
        assert!(cli.global_name.is_none());
        assert!(!cli.no_dts);
    }

    #[test]
    fn test_parse_umd_only() {
        let cli = Cli::try_parse_from([
            "fob-postbuild",
            "--no-dts",
            "--global-name",
            "MyLib",
            "-d",
            "build",
        ])
        .unwrap();
        assert!(cli.no_dts);
        assert_eq!(cli.global_name.as_deref(), Some("MyLib"));
        assert_eq!(cli.out_dir, Some(PathBuf::from("build")));
    }

    #[test]
    fn test_invalid_global_name() {
        let err = Cli::try_parse_from(["fob-postbuild", "--global-name", "my-lib"]).unwrap_err();
        assert!(err.to_string().contains("my-lib"));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["fob-postbuild", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_tsc_conflicts_with_no_dts() {
        assert!(Cli::try_parse_from(["fob-postbuild", "--no-dts", "--tsc", "tsc"]).is_err());
    }
}
