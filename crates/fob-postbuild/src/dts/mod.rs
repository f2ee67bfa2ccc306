//! TypeScript declaration emission for a package's entry points.
//!
//! ## How It Works
//!
//! 1. The [`EntryTracker`](crate::EntryTracker) records every TypeScript file
//!    the bundler loads
//! 2. At build end the tracked files are narrowed to configured entry points
//! 3. A type-checker backend emits `.d.ts` files for exactly those files with
//!    an isolated configuration (no import resolution, no cross-file
//!    inference, no library checking)
//! 4. Each emitted declaration is wired into its sibling JavaScript file with
//!    a triple-slash reference (see [`crate::reference`])
//!
//! Declarations are an optional enhancement. A missing type-checker or a
//! build that already failed is skipped silently. Diagnostics and backend
//! faults are appended to the [`BuildResult`] and never returned as errors.

mod checker;
mod diagnostics;
#[cfg(feature = "dts-generation")]
mod isolated;
mod tsc;

pub use checker::{
    CheckerError, CheckerSource, CompilerOptions, EmitOutput, EsTarget, ModuleKind, TypeChecker,
};
pub use diagnostics::{
    TypeDiagnostic, TypeDiagnosticSeverity, attach_sources, format_diagnostics, line_col_to_offset,
};
#[cfg(feature = "dts-generation")]
pub use isolated::IsolatedDeclarationsChecker;
pub use tsc::{DEFAULT_TIMEOUT_SECS, TscChecker, parse_diagnostics};

use crate::reference::ReferenceInjector;
use crate::{BuildContext, BuildEndHook, BuildMessage, BuildResult, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Plugin name used on reported messages.
pub const PLUGIN_NAME: &str = "fob-dts";
/// Error id for aggregated type-checker diagnostics.
pub const DIAGNOSTICS_ID: &str = "dts-diagnostics";
/// Error id for a type-checker that failed to run.
pub const FAULT_ID: &str = "dts-fault";

/// Build-end hook that emits declarations and wires references.
#[derive(Debug, Clone)]
pub struct DeclarationEmitter {
    source: CheckerSource,
    target: EsTarget,
    module: ModuleKind,
    declaration_map: bool,
    strip_internal: bool,
    timeout_secs: u64,
}

impl Default for DeclarationEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclarationEmitter {
    pub fn new() -> Self {
        Self {
            source: CheckerSource::Detect,
            target: EsTarget::default(),
            module: ModuleKind::default(),
            declaration_map: false,
            strip_internal: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn checker(mut self, source: CheckerSource) -> Self {
        self.source = source;
        self
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

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn compiler_options(&self, ctx: &BuildContext) -> CompilerOptions {
        let options = ctx.options();
        CompilerOptions::isolated(options.resolved_root_dir(), options.resolved_out_dir())
            .target(self.target)
            .module(self.module)
            .declaration_map(self.declaration_map)
            .strip_internal(self.strip_internal)
    }
}

#[async_trait]
impl BuildEndHook for DeclarationEmitter {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    async fn on_build_end(&self, ctx: &BuildContext, result: &mut BuildResult) -> Result<()> {
        if result.has_errors() {
            debug!("[fob-dts] build has errors, skipping declarations");
            return Ok(());
        }

        let project_root = ctx.options().resolve(&ctx.options().cwd);
        let Some(checker) = self.source.load(&project_root, self.timeout_secs).await else {
            debug!("[fob-dts] no type-checker available, skipping declarations");
            return Ok(());
        };

        let plan = ctx.emission_plan();
        if plan.is_empty() {
            debug!("[fob-dts] no tracked entry points, skipping declarations");
            return Ok(());
        }

        let options = self.compiler_options(ctx);
        debug!(
            "[fob-dts] emitting {} declaration(s) with {}",
            plan.len(),
            checker.name()
        );

        match checker.emit(&plan, &options).await {
            Ok(output) => {
                let (errors, warnings): (Vec<_>, Vec<_>) = output
                    .diagnostics
                    .into_iter()
                    .partition(TypeDiagnostic::is_error);
                if !warnings.is_empty() {
                    result.push_warning(BuildMessage::new(
                        DIAGNOSTICS_ID,
                        PLUGIN_NAME,
                        format_diagnostics(&warnings),
                    ));
                }
                if !errors.is_empty() {
                    warn!("[fob-dts] {} type diagnostic(s)", errors.len());
                    result.push_error(BuildMessage::new(
                        DIAGNOSTICS_ID,
                        PLUGIN_NAME,
                        format_diagnostics(&errors),
                    ));
                }
            }
            Err(fault) => {
                warn!("[fob-dts] type-checker failed: {}", fault);
                result.push_error(BuildMessage::new(
                    FAULT_ID,
                    PLUGIN_NAME,
                    format!("Declaration emission failed: {}", fault),
                ));
                return Ok(());
            }
        }

        let injected = ReferenceInjector::new(options.out_dir.clone())
            .inject(&plan)
            .await?;
        info!(
            "[fob-dts] emitted declarations for {} entry point(s), linked {}",
            plan.len(),
            injected.len()
        );

        Ok(())
    }
}
