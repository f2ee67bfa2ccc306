//! The `fob-postbuild` command.
//!
//! 1. Merge configuration: defaults, config file, `FOB_POSTBUILD_*`, flags
//! 2. Report each entry point to the entry tracker as a loaded file
//! 3. Run the build-end stages once and print what they reported

use crate::cli::Cli;
use crate::error::{CliError, Result};
use figment::{Figment, providers::Serialized};
use fob_postbuild::config::CONFIG_FILE;
use fob_postbuild::{BuildContext, BuildResult, PostBuildConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Summary of a successful run.
#[derive(Debug, Default)]
pub struct Outcome {
    pub tracked: usize,
    pub warnings: usize,
}

/// Merge command-line overrides over file and environment configuration.
pub fn figment(args: &Cli, cwd: &Path) -> Figment {
    let config_path = args
        .config
        .as_ref()
        .map(|p| resolve(cwd, p))
        .unwrap_or_else(|| cwd.join(CONFIG_FILE));

    let mut figment = PostBuildConfig::figment(Some(&config_path));

    if !args.entries.is_empty() {
        figment = figment.merge(Serialized::default("entry_points", &args.entries));
    }
    if let Some(out_dir) = &args.out_dir {
        figment = figment.merge(Serialized::default("out_dir", out_dir));
    }
    if let Some(root_dir) = &args.root_dir {
        figment = figment.merge(Serialized::default("root_dir", root_dir));
    }
    if let Some(global_name) = &args.global_name {
        figment = figment.merge(Serialized::default("umd.global_name", global_name));
    }
    if args.no_dts {
        figment = figment.merge(Serialized::default("dts.enabled", false));
    }
    if let Some(tsc) = &args.tsc {
        figment = figment.merge(Serialized::default("dts.tsc", resolve(cwd, tsc)));
    }
    figment
}

fn resolve(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Run the post-build stages as configured by `args`.
pub async fn execute(args: Cli) -> Result<Outcome> {
    let process_cwd = std::env::current_dir().map_err(CliError::Cwd)?;
    let cwd = args
        .cwd
        .as_ref()
        .map(|p| resolve(&process_cwd, p))
        .unwrap_or(process_cwd);

    if let Some(config_path) = &args.config {
        let config_path = resolve(&cwd, config_path);
        if !config_path.is_file() {
            return Err(CliError::ConfigNotFound(config_path));
        }
    }

    let config = PostBuildConfig::from_figment(figment(&args, &cwd))?;
    let ctx = BuildContext::new(config.build_options(&cwd));
    debug!("Resolved configuration: {:?}", config);

    let tracker = config.entry_tracker(&ctx)?;
    for entry in ctx.options().resolved_entries() {
        if !entry.exists() {
            return Err(CliError::EntryNotFound(entry));
        }
        tracker.on_load(&entry);
    }

    let pipeline = config.pipeline();
    info!(
        "Running {} post-build stage(s) on {}",
        pipeline.len(),
        ctx.options().resolved_out_dir().display()
    );

    let mut result = BuildResult::new();
    pipeline.run(&ctx, &mut result).await?;
    report(&result);

    if result.has_errors() {
        return Err(CliError::BuildFailed {
            count: result.errors.len(),
        });
    }

    Ok(Outcome {
        tracked: ctx.tracked_files().len(),
        warnings: result.warnings.len(),
    })
}

fn report(result: &BuildResult) {
    for warning in &result.warnings {
        warn!("{}", warning);
    }
    for err in &result.errors {
        error!("{}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn extract(argv: &[&str], cwd: &Path) -> PostBuildConfig {
        let args = Cli::try_parse_from(argv).unwrap();
        figment(&args, cwd).extract().unwrap()
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = extract(
            &[
                "fob-postbuild",
                "src/a.ts",
                "src/b.ts",
                "-d",
                "build",
                "--global-name",
                "MyLib",
                "--no-dts",
            ],
            Path::new("/nonexistent/project"),
        );
        assert_eq!(
            config.entry_points,
            vec![PathBuf::from("src/a.ts"), PathBuf::from("src/b.ts")]
        );
        assert_eq!(config.out_dir, PathBuf::from("build"));
        assert_eq!(config.root_dir, PathBuf::from("src"));
        assert!(!config.dts.enabled);
        assert_eq!(config.umd.unwrap().global_name, "MyLib");
    }

    #[test]
    fn test_tsc_is_resolved_against_cwd() {
        let config = extract(
            &["fob-postbuild", "src/a.ts", "--tsc", "node_modules/.bin/tsc"],
            Path::new("/nonexistent/project"),
        );
        assert_eq!(
            config.dts.tsc,
            Some(PathBuf::from("/nonexistent/project/node_modules/.bin/tsc"))
        );
    }
}
