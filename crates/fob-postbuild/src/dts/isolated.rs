//! Native declaration emission using OXC's isolated declarations.
//!
//! Each file is parsed and transformed on its own, which is exactly the
//! isolated-modules contract: no imports are followed and no cross-file
//! inference happens. Parse and transform errors become diagnostics; only
//! I/O failures are faults.

use super::checker::{CheckerError, CompilerOptions, EmitOutput, TypeChecker};
use super::diagnostics::TypeDiagnostic;
use async_trait::async_trait;
use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_isolated_declarations::{IsolatedDeclarations, IsolatedDeclarationsOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct IsolatedDeclarationsChecker;

impl IsolatedDeclarationsChecker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TypeChecker for IsolatedDeclarationsChecker {
    fn name(&self) -> &'static str {
        "oxc-isolated-declarations"
    }

    async fn emit(
        &self,
        files: &[PathBuf],
        options: &CompilerOptions,
    ) -> Result<EmitOutput, CheckerError> {
        let mut output = EmitOutput::default();

        for file in files {
            let source = tokio::fs::read_to_string(file)
                .await
                .map_err(|e| CheckerError::io(file, e))?;

            match generate_dts(&source, file, options.strip_internal) {
                Ok(code) => {
                    let target = options.declaration_path(file);
                    if let Some(parent) = target.parent() {
                        tokio::fs::create_dir_all(parent)
                            .await
                            .map_err(|e| CheckerError::io(parent, e))?;
                    }
                    tokio::fs::write(&target, code)
                        .await
                        .map_err(|e| CheckerError::io(&target, e))?;
                    debug!("[fob-dts] wrote {}", target.display());
                    output.emitted.push(target);
                }
                Err(messages) => {
                    let name = file.display().to_string();
                    output.diagnostics.extend(messages.into_iter().map(|(message, span)| {
                        let diag = TypeDiagnostic::error(message).in_file(name.clone());
                        let diag = match span {
                            Some((offset, len)) => diag.with_span(offset, len),
                            None => diag,
                        };
                        diag.with_source(source.clone())
                    }));
                }
            }
        }

        Ok(output)
    }
}

type Messages = Vec<(String, Option<(usize, usize)>)>;

/// Generate `.d.ts` text, or the error messages with their byte spans.
fn generate_dts(source: &str, path: &Path, strip_internal: bool) -> Result<String, Messages> {
    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path)
        .map_err(|e| vec![(format!("Invalid TypeScript file: {:?}", e), None)])?;

    let parsed = Parser::new(&allocator, source, source_type).parse();
    if !parsed.errors.is_empty() {
        return Err(parsed
            .errors
            .iter()
            .map(|e| {
                let span = e
                    .labels
                    .as_ref()
                    .and_then(|labels| labels.first())
                    .map(|label| (label.offset(), label.len()));
                (e.message.to_string(), span)
            })
            .collect());
    }

    let options = IsolatedDeclarationsOptions { strip_internal };
    let dts = IsolatedDeclarations::new(&allocator, options).build(&parsed.program);
    if !dts.errors.is_empty() {
        return Err(dts
            .errors
            .iter()
            .map(|e| {
                let span = e
                    .labels
                    .as_ref()
                    .and_then(|labels| labels.first())
                    .map(|label| (label.offset(), label.len()));
                (e.message.to_string(), span)
            })
            .collect());
    }

    Ok(Codegen::new().build(&dts.program).code)
}
