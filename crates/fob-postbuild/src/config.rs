//! Configuration for the post-build stages.
//!
//! Sources are merged with figment, lowest priority first:
//! defaults, `fob-postbuild.json` (or an explicit file), then
//! `FOB_POSTBUILD_*` environment variables. Callers layer their own
//! overrides on top with [`PostBuildConfig::figment`].

use crate::dts::{CheckerSource, DEFAULT_TIMEOUT_SECS, DeclarationEmitter, EsTarget, ModuleKind};
use crate::tracker::DEFAULT_LOAD_FILTER;
use crate::{BuildContext, BuildOptions, EntryTracker, Error, PostBuild, Result, UmdWrapper};
use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory.
pub const CONFIG_FILE: &str = "fob-postbuild.json";

/// Declaration emission settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DtsConfig {
    pub enabled: bool,
    pub target: EsTarget,
    pub module: ModuleKind,
    pub declaration_map: bool,
    pub strip_internal: bool,
    /// Explicit `tsc` binary; looked up automatically when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tsc: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for DtsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target: EsTarget::default(),
            module: ModuleKind::default(),
            declaration_map: false,
            strip_internal: false,
            tsc: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// UMD wrapping settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UmdConfig {
    /// Property assigned on the global root when no module loader exists.
    pub global_name: String,
}

/// Complete post-build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostBuildConfig {
    pub entry_points: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    pub root_dir: PathBuf,
    pub out_dir: PathBuf,
    pub load_filter: String,
    pub dts: DtsConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub umd: Option<UmdConfig>,
}

impl Default for PostBuildConfig {
    fn default() -> Self {
        Self {
            entry_points: Vec::new(),
            cwd: None,
            root_dir: PathBuf::from("src"),
            out_dir: PathBuf::from("dist"),
            load_filter: DEFAULT_LOAD_FILTER.to_string(),
            dts: DtsConfig::default(),
            umd: None,
        }
    }
}

impl PostBuildConfig {
    /// Figment with defaults, the config file and environment merged.
    ///
    /// Without an explicit path, `fob-postbuild.json` in the working
    /// directory is used when it exists.
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = config_path.map(Path::to_path_buf).or_else(|| {
            let default_path = Path::new(CONFIG_FILE);
            default_path.exists().then(|| default_path.to_path_buf())
        });
        if let Some(path) = config_file {
            figment = figment.merge(Json::file(path));
        }

        // FOB_POSTBUILD_OUT_DIR, FOB_POSTBUILD_DTS__ENABLED, ...
        figment.merge(Env::prefixed("FOB_POSTBUILD_").split("__"))
    }

    /// Load and validate configuration.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(config_path))
    }

    /// Extract and validate configuration from a prepared figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(umd) = &self.umd {
            validate_global_name(&umd.global_name)?;
        }
        regex::Regex::new(&self.load_filter).map_err(|e| {
            Error::InvalidConfig(format!("invalid load_filter '{}': {}", self.load_filter, e))
        })?;
        if self.dts.enabled && self.entry_points.is_empty() {
            return Err(Error::InvalidConfig(
                "declaration emission needs at least one entry point".to_string(),
            ));
        }
        if self.dts.timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "dts.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Build options with `cwd` defaulting to `fallback_cwd`.
    pub fn build_options(&self, fallback_cwd: &Path) -> BuildOptions {
        let cwd = match &self.cwd {
            Some(cwd) if cwd.is_absolute() => cwd.clone(),
            Some(cwd) => fallback_cwd.join(cwd),
            None => fallback_cwd.to_path_buf(),
        };
        BuildOptions::new(self.out_dir.clone())
            .cwd(cwd)
            .root_dir(self.root_dir.clone())
            .entries(self.entry_points.iter().cloned())
    }

    /// Entry tracker for `ctx` using the configured load filter.
    pub fn entry_tracker(&self, ctx: &BuildContext) -> Result<EntryTracker> {
        EntryTracker::with_filter(ctx.tracked_files(), &self.load_filter)
    }

    /// Stages in run order: declarations first, then UMD wrapping.
    pub fn pipeline(&self) -> PostBuild {
        let mut pipeline = PostBuild::new();
        if self.dts.enabled {
            let source = match &self.dts.tsc {
                Some(path) => CheckerSource::Tsc(path.clone()),
                None => CheckerSource::Detect,
            };
            pipeline = pipeline.hook(
                DeclarationEmitter::new()
                    .checker(source)
                    .target(self.dts.target)
                    .module(self.dts.module)
                    .declaration_map(self.dts.declaration_map)
                    .strip_internal(self.dts.strip_internal)
                    .timeout_secs(self.dts.timeout_secs),
            );
        }
        if let Some(umd) = &self.umd {
            pipeline = pipeline.hook(UmdWrapper::new(umd.global_name.clone()));
        }
        pipeline
    }
}

/// A global name must be a plain JavaScript identifier.
pub fn validate_global_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(Error::InvalidConfig(
            "UMD global name cannot be empty".to_string(),
        ));
    };

    if !first.is_alphabetic() && first != '_' && first != '$' {
        return Err(Error::InvalidConfig(format!(
            "UMD global name must start with a letter, underscore, or dollar sign: '{}'",
            name
        )));
    }

    if chars.any(|c| !c.is_alphanumeric() && c != '_' && c != '$') {
        return Err(Error::InvalidConfig(format!(
            "UMD global name can only contain letters, numbers, underscores, or dollar signs: '{}'",
            name
        )));
    }

    Ok(())
}
