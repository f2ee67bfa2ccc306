//! UMD wrapping of emitted CommonJS output.
//!
//! Every `.js` file in the output directory (never `.js.map`) is rewritten
//! into a factory wrapped by a three-branch preamble: AMD `define`, then
//! CommonJS `module.exports`, then a property on the global root.
//!
//! The only structural rewrite is the trailing export: a single
//! `module.exports = <expr>;` anchored at end of file becomes
//! `return <expr>;`. Anything else passes through untouched, in which case
//! the factory returns `undefined`. This is a text transform, not a
//! JavaScript parser.

use crate::{BuildContext, BuildEndHook, BuildResult, Error, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

pub const PLUGIN_NAME: &str = "fob-umd";

static TRAILING_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((?:^|[;{}\n])\s*)module\.exports\s*=\s*([^;]+?)\s*;?\s*\z")
        .expect("export pattern is valid")
});

/// Replace a trailing `module.exports = <expr>;` with `return <expr>;`.
///
/// The assignment must start a statement; `obj.module.exports = x;` is a
/// member assignment and is left alone. Returns the text unchanged when no
/// such statement ends the file.
pub fn rewrite_trailing_export(text: &str) -> String {
    TRAILING_EXPORT.replace(text, "${1}return ${2};").into_owned()
}

/// Wrap `text` in the UMD preamble and postamble.
///
/// A leading shebang line is kept above the wrapper so it stays line 1.
pub fn wrap_umd(text: &str, global_name: &str) -> String {
    let (shebang, body) = split_shebang(text);
    let body = rewrite_trailing_export(body);

    let mut out = String::with_capacity(body.len() + 512);
    out.push_str(shebang);
    if !shebang.is_empty() && !shebang.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("(function (root, factory) {\n");
    out.push_str("  if (typeof define === 'function' && define.amd) {\n");
    out.push_str("    define([], factory);\n");
    out.push_str("  } else if (typeof module === 'object' && module.exports) {\n");
    out.push_str("    module.exports = factory();\n");
    out.push_str("  } else {\n");
    out.push_str("    root.");
    out.push_str(global_name);
    out.push_str(" = factory();\n");
    out.push_str("  }\n");
    out.push_str("}(typeof self !== 'undefined' ? self : this, function () {\n");
    out.push_str(&body);
    if !body.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("}));\n");
    out
}

fn split_shebang(text: &str) -> (&str, &str) {
    if !text.starts_with("#!") {
        return ("", text);
    }
    match text.find('\n') {
        Some(pos) => text.split_at(pos + 1),
        None => (text, ""),
    }
}

/// Whether the UMD stage rewrites `path`.
pub fn is_wrappable(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.ends_with(".js") && !name.ends_with(".js.map"))
}

/// Build-end hook that wraps every emitted `.js` file.
#[derive(Debug, Clone)]
pub struct UmdWrapper {
    global_name: String,
}

impl UmdWrapper {
    pub fn new(global_name: impl Into<String>) -> Self {
        Self {
            global_name: global_name.into(),
        }
    }

    pub fn global_name(&self) -> &str {
        &self.global_name
    }

    /// Wrap every eligible file directly inside `out_dir`.
    pub async fn wrap_dir(&self, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(out_dir)
            .await
            .map_err(|e| Error::io(out_dir, e))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::io(out_dir, e))?
        {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(|e| Error::io(&path, e))?;
            if file_type.is_file() && is_wrappable(&path) {
                files.push(path);
            }
        }
        files.sort();

        for path in &files {
            let text = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| Error::io(path, e))?;
            tokio::fs::write(path, wrap_umd(&text, &self.global_name))
                .await
                .map_err(|e| Error::io(path, e))?;
            debug!("[fob-umd] wrapped {}", path.display());
        }

        Ok(files)
    }
}

#[async_trait]
impl BuildEndHook for UmdWrapper {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    async fn on_build_end(&self, ctx: &BuildContext, result: &mut BuildResult) -> Result<()> {
        if result.has_errors() {
            debug!("[fob-umd] build has errors, skipping UMD wrapping");
            return Ok(());
        }

        let out_dir = ctx.options().resolved_out_dir();
        let wrapped = self.wrap_dir(&out_dir).await?;
        info!(
            "[fob-umd] wrapped {} file(s) as {}",
            wrapped.len(),
            self.global_name
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREAMBLE: &str = "(function (root, factory) {\n  if (typeof define === 'function' && define.amd) {\n    define([], factory);\n  } else if (typeof module === 'object' && module.exports) {\n    module.exports = factory();\n  } else {\n    root.MyLib = factory();\n  }\n}(typeof self !== 'undefined' ? self : this, function () {\n";
    const POSTAMBLE: &str = "}));\n";

    #[test]
    fn test_rewrites_trailing_export() {
        assert_eq!(
            rewrite_trailing_export("var Foo = 1;\nmodule.exports = Foo;"),
            "var Foo = 1;\nreturn Foo;"
        );
    }

    #[test]
    fn test_rewrite_tolerates_missing_semicolon_and_whitespace() {
        assert_eq!(
            rewrite_trailing_export("var a = {};\nmodule.exports   =  a  \n\n"),
            "var a = {};\nreturn a;"
        );
    }

    #[test]
    fn test_rewrite_multiline_expression() {
        assert_eq!(
            rewrite_trailing_export("module.exports = {\n  a: a,\n  b: b\n};\n"),
            "return {\n  a: a,\n  b: b\n};"
        );
    }

    #[test]
    fn test_non_trailing_export_is_untouched() {
        let text = "module.exports = Foo;\nFoo.extra = 1;\n";
        assert_eq!(rewrite_trailing_export(text), text);
    }

    #[test]
    fn test_identifier_suffix_is_not_matched() {
        let text = "mymodule.exports = Foo;";
        assert_eq!(rewrite_trailing_export(text), text);
    }

    #[test]
    fn test_wrap_exact_structure() {
        let out = wrap_umd("var Foo = 1;\nmodule.exports = Foo;", "MyLib");
        assert_eq!(
            out,
            format!("{}var Foo = 1;\nreturn Foo;\n{}", PREAMBLE, POSTAMBLE)
        );
    }

    #[test]
    fn test_wrap_without_export_keeps_body() {
        let body = "console.log('side effect');\n";
        let out = wrap_umd(body, "MyLib");
        assert_eq!(out, format!("{}{}{}", PREAMBLE, body, POSTAMBLE));
    }

    #[test]
    fn test_wrap_hoists_shebang() {
        let out = wrap_umd("#!/usr/bin/env node\nmodule.exports = run;\n", "MyLib");
        assert!(out.starts_with("#!/usr/bin/env node\n(function (root, factory) {"));
        assert!(out.contains("\nreturn run;\n}));\n"));
    }

    #[test]
    fn test_member_assignment_is_not_a_module_export() {
        let text = "var o = {module: {}};\no.module.exports = X;";
        assert_eq!(rewrite_trailing_export(text), text);
    }

    #[test]
    fn test_export_after_statement_on_same_line() {
        assert_eq!(
            rewrite_trailing_export("var a = 1; module.exports = a;"),
            "var a = 1; return a;"
        );
        assert_eq!(
            rewrite_trailing_export("if (x) {}\n  module.exports = x;\n"),
            "if (x) {}\n  return x;"
        );
    }

    #[test]
    fn test_wrap_shebang_without_newline() {
        let out = wrap_umd("#!/usr/bin/env node", "MyLib");
        assert_eq!(
            out,
            format!("#!/usr/bin/env node\n{}\n{}", PREAMBLE, POSTAMBLE)
        );
    }

    #[test]
    fn test_is_wrappable() {
        assert!(is_wrappable(Path::new("/dist/index.js")));
        assert!(!is_wrappable(Path::new("/dist/index.js.map")));
        assert!(!is_wrappable(Path::new("/dist/index.d.ts")));
        assert!(!is_wrappable(Path::new("/dist/index.mjs")));
    }
}
