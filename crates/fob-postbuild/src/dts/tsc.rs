//! TypeScript compiler (`tsc`) run as an external process.

use super::checker::{CheckerError, CompilerOptions, EmitOutput, TypeChecker};
use super::diagnostics::{TypeDiagnostic, TypeDiagnosticSeverity, attach_sources};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::process::Command;
use tokio::time::{Duration, timeout};
use tracing::debug;

/// Default timeout for a tsc run (2 minutes)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// `file(line,col): error TS1234: message`
static DIAGNOSTIC_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\((\d+),(\d+)\): (error|warning) (TS\d+): (.*)$")
        .expect("diagnostic pattern is valid")
});

/// `error TS1234: message` (no location, e.g. option errors)
static GLOBAL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(error|warning) (TS\d+): (.*)$").expect("global diagnostic pattern is valid")
});

#[cfg(windows)]
const TSC_BIN: &str = "tsc.cmd";
#[cfg(not(windows))]
const TSC_BIN: &str = "tsc";

/// Declaration emission through a locally installed `tsc`.
#[derive(Debug, Clone)]
pub struct TscChecker {
    program: PathBuf,
    project_root: PathBuf,
    timeout_secs: u64,
}

impl TscChecker {
    pub fn new(program: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            project_root: project_root.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Find `tsc`: `node_modules/.bin` in the project root or any ancestor,
    /// then the `PATH`.
    pub async fn locate(project_root: &Path) -> Option<PathBuf> {
        for dir in project_root.ancestors() {
            let candidate = dir.join("node_modules").join(".bin").join(TSC_BIN);
            if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return Some(candidate);
            }
        }

        #[cfg(unix)]
        let check_cmd = "which";
        #[cfg(windows)]
        let check_cmd = "where";

        let output = Command::new(check_cmd)
            .arg(TSC_BIN)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .ok()?;

        if !output.status.success() {
            return None;
        }

        String::from_utf8(output.stdout)
            .ok()?
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(PathBuf::from)
    }

    /// Command-line arguments for one isolated emission.
    pub fn build_args(files: &[PathBuf], options: &CompilerOptions) -> Vec<String> {
        let mut args = vec!["--declaration".to_string()];
        if options.emit_declaration_only {
            args.push("--emitDeclarationOnly".to_string());
        }
        if options.declaration_map {
            args.push("--declarationMap".to_string());
        }
        if options.skip_lib_check {
            args.push("--skipLibCheck".to_string());
        }
        if options.isolated_modules {
            args.push("--isolatedModules".to_string());
        }
        if options.no_resolve {
            args.push("--noResolve".to_string());
        }
        args.extend([
            "--target".to_string(),
            options.target.as_str().to_string(),
            "--module".to_string(),
            options.module.as_str().to_string(),
            "--rootDir".to_string(),
            options.root_dir.display().to_string(),
            "--outDir".to_string(),
            options.out_dir.display().to_string(),
            "--pretty".to_string(),
            "false".to_string(),
        ]);
        args.extend(files.iter().map(|f| f.display().to_string()));
        args
    }
}

#[async_trait]
impl TypeChecker for TscChecker {
    fn name(&self) -> &'static str {
        "tsc"
    }

    async fn emit(
        &self,
        files: &[PathBuf],
        options: &CompilerOptions,
    ) -> Result<EmitOutput, CheckerError> {
        let args = Self::build_args(files, options);
        debug!("[fob-dts] {} {}", self.program.display(), args.join(" "));

        let output = timeout(
            Duration::from_secs(self.timeout_secs),
            Command::new(&self.program)
                .args(&args)
                .current_dir(&self.project_root)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| CheckerError::Timeout {
            timeout_secs: self.timeout_secs,
        })?
        .map_err(CheckerError::spawn_failed)?;

        let stdout = String::from_utf8(output.stdout)
            .map_err(|source| CheckerError::InvalidOutput { source })?;
        let diagnostics = parse_diagnostics(&stdout);

        if !output.status.success() && diagnostics.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CheckerError::ExitError {
                exit_code: output.status.code().unwrap_or(-1),
                output: format!("{}{}", stdout, stderr).trim().to_string(),
            });
        }

        let diagnostics = attach_sources(diagnostics, &self.project_root).await;
        let emitted = files
            .iter()
            .map(|f| options.declaration_path(f))
            .collect();

        Ok(EmitOutput {
            diagnostics,
            emitted,
        })
    }
}

fn severity(word: &str) -> TypeDiagnosticSeverity {
    if word == "warning" {
        TypeDiagnosticSeverity::Warning
    } else {
        TypeDiagnosticSeverity::Error
    }
}

/// Parse `--pretty false` output. Indented lines continue the previous message.
pub fn parse_diagnostics(output: &str) -> Vec<TypeDiagnostic> {
    let mut diagnostics: Vec<TypeDiagnostic> = Vec::new();

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(caps) = DIAGNOSTIC_LINE.captures(line) {
            let line_no = caps[2].parse().unwrap_or(0);
            let column = caps[3].parse().unwrap_or(0);
            diagnostics.push(
                TypeDiagnostic::error(&caps[6])
                    .with_severity(severity(&caps[4]))
                    .with_code(&caps[5])
                    .at(&caps[1], line_no, column),
            );
        } else if let Some(caps) = GLOBAL_LINE.captures(line) {
            diagnostics.push(
                TypeDiagnostic::error(&caps[3])
                    .with_severity(severity(&caps[1]))
                    .with_code(&caps[2]),
            );
        } else if let Some(last) = diagnostics.last_mut() {
            last.message.push('\n');
            last.message.push_str(line);
        } else {
            diagnostics.push(TypeDiagnostic::error(line.trim()));
        }
    }

    diagnostics
}
