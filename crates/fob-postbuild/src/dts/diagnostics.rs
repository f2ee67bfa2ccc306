//! Type-checker diagnostics and their human-readable rendering.
//!
//! Backends produce [`TypeDiagnostic`]s with a file and a line/column. When
//! the source can be loaded we attach it, so miette's graphical handler can
//! print the offending line with a label under the reported position.

use miette::{
    Diagnostic, GraphicalReportHandler, GraphicalTheme, LabeledSpan, NamedSource, Severity,
    SourceCode,
};
use std::fmt;
use std::path::Path;

/// Severity reported by a type-checker backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDiagnosticSeverity {
    Error,
    Warning,
}

/// A single diagnostic from a type-checker backend.
#[derive(Debug)]
pub struct TypeDiagnostic {
    pub severity: TypeDiagnosticSeverity,
    /// Backend-specific code, e.g. `TS2322`.
    pub code: Option<String>,
    pub message: String,
    pub file: Option<String>,
    /// 1-based line.
    pub line: Option<u32>,
    /// 1-based column.
    pub column: Option<u32>,
    /// Byte range into the source, when the backend reports one directly.
    pub span: Option<(usize, usize)>,
    source: Option<NamedSource<String>>,
    offset: Option<(usize, usize)>,
}

impl TypeDiagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: TypeDiagnosticSeverity::Error,
            code: None,
            message: message.into(),
            file: None,
            line: None,
            column: None,
            span: None,
            source: None,
            offset: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_severity(mut self, severity: TypeDiagnosticSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn at(mut self, file: impl Into<String>, line: u32, column: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_span(mut self, offset: usize, len: usize) -> Self {
        self.span = Some((offset, len));
        self
    }

    /// Attach source text so the rendered report shows a snippet.
    pub fn with_source(mut self, source: String) -> Self {
        let name = self.file.clone().unwrap_or_default();
        self.offset = match (self.span, self.line, self.column) {
            (Some((offset, len)), _, _) if offset <= source.len() => Some((offset, len.max(1))),
            (_, Some(line), Some(column)) => line_col_to_offset(&source, line, column)
                .map(|offset| (offset, token_len(&source, offset))),
            _ => None,
        };
        self.source = Some(NamedSource::new(name, source));
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == TypeDiagnosticSeverity::Error
    }
}

impl fmt::Display for TypeDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TypeDiagnostic {}

impl Diagnostic for TypeDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.code
            .as_ref()
            .map(|c| Box::new(c.clone()) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<Severity> {
        Some(match self.severity {
            TypeDiagnosticSeverity::Error => Severity::Error,
            TypeDiagnosticSeverity::Warning => Severity::Warning,
        })
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.source.as_ref().map(|s| s as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let (offset, len) = self.offset?;
        let label = match (&self.file, self.line, self.column) {
            (Some(file), Some(line), Some(column)) => format!("{}:{}:{}", file, line, column),
            _ => "here".to_string(),
        };
        Some(Box::new(std::iter::once(LabeledSpan::new(
            Some(label),
            offset,
            len,
        ))))
    }
}

/// Convert a 1-based line and column to a byte offset.
pub fn line_col_to_offset(source: &str, line: u32, column: u32) -> Option<usize> {
    if line == 0 {
        return None;
    }

    let mut offset = 0;
    for (idx, text) in source.split_inclusive('\n').enumerate() {
        if idx + 1 == line as usize {
            let content = text.trim_end_matches(['\n', '\r']);
            let col_bytes = if column <= 1 {
                0
            } else {
                content
                    .char_indices()
                    .nth((column - 1) as usize)
                    .map(|(pos, _)| pos)
                    .unwrap_or(content.len())
            };
            return Some(offset + col_bytes);
        }
        offset += text.len();
    }

    None
}

/// Length of the identifier starting at `offset`, at least one byte.
fn token_len(source: &str, offset: usize) -> usize {
    let Some(rest) = source.get(offset..) else {
        return 1;
    };
    rest.char_indices()
        .find(|(_, c)| !c.is_alphanumeric() && *c != '_' && *c != '$')
        .map(|(pos, _)| pos)
        .unwrap_or(rest.len())
        .max(1)
}

/// Load the source for each diagnostic that names a readable file.
pub async fn attach_sources(diagnostics: Vec<TypeDiagnostic>, cwd: &Path) -> Vec<TypeDiagnostic> {
    let mut out = Vec::with_capacity(diagnostics.len());
    for diag in diagnostics {
        let source = match &diag.file {
            Some(file) => tokio::fs::read_to_string(cwd.join(file)).await.ok(),
            None => None,
        };
        out.push(match source {
            Some(source) => diag.with_source(source),
            None => diag,
        });
    }
    out
}

/// Render diagnostics as plain text with source snippets.
pub fn format_diagnostics(diagnostics: &[TypeDiagnostic]) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    let mut out = String::new();
    for diag in diagnostics {
        if handler.render_report(&mut out, diag).is_err() {
            out.push_str(&diag.message);
            out.push('\n');
        }
    }
    out
}
