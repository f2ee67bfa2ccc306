//! Triple-slash reference wiring between emitted JavaScript and declarations.
//!
//! For every planned entry `<name>.ts` with both `<out>/<name>.js` and
//! `<out>/<name>.d.ts` on disk, the JavaScript file gets
//! `/// <reference types="./<name>.d.ts" />` as its first line, or its second
//! line when the file starts with a shebang.
//!
//! The directive is not deduplicated. Running the injector twice on the same
//! output without a rebuild in between writes it twice.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reference directive naming a sibling declaration file.
pub fn reference_directive(dts_file_name: &str) -> String {
    format!("/// <reference types=\"./{}\" />", dts_file_name)
}

/// Insert the reference directive for `dts_file_name` into `text`.
///
/// A leading `#!` line stays first; the directive goes right after its
/// newline. A shebang with no newline gets one added before the directive.
pub fn inject_reference(text: &str, dts_file_name: &str) -> String {
    let directive = reference_directive(dts_file_name);

    if text.starts_with("#!") {
        return match text.find('\n') {
            Some(pos) => {
                let (shebang, rest) = text.split_at(pos + 1);
                format!("{}{}\n{}", shebang, directive, rest)
            }
            None => format!("{}\n{}\n", text, directive),
        };
    }

    format!("{}\n{}", directive, text)
}

/// JavaScript and declaration outputs for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPair {
    pub js: PathBuf,
    pub dts: PathBuf,
}

impl ArtifactPair {
    /// Output paths for `source` inside `out_dir`, by base name.
    pub fn for_source(out_dir: &Path, source: &Path) -> Option<Self> {
        let stem = source.file_stem()?.to_string_lossy();
        Some(Self {
            js: out_dir.join(format!("{}.js", stem)),
            dts: out_dir.join(format!("{}.d.ts", stem)),
        })
    }

    /// Both files exist. The two checks run concurrently.
    pub async fn exists(&self) -> bool {
        let (js, dts) = tokio::join!(
            tokio::fs::try_exists(&self.js),
            tokio::fs::try_exists(&self.dts)
        );
        matches!((js, dts), (Ok(true), Ok(true)))
    }

    fn dts_file_name(&self) -> String {
        self.dts
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Writes reference directives into emitted JavaScript.
#[derive(Debug, Clone)]
pub struct ReferenceInjector {
    out_dir: PathBuf,
}

impl ReferenceInjector {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Inject references for each planned source. Returns the rewritten
    /// JavaScript paths. Pairs with a missing half are skipped; read and
    /// write failures are returned.
    pub async fn inject(&self, plan: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        for source in plan {
            let Some(pair) = ArtifactPair::for_source(&self.out_dir, source) else {
                continue;
            };
            if !pair.exists().await {
                debug!(
                    "[fob-dts] {} has no js/d.ts pair, not linking",
                    source.display()
                );
                continue;
            }

            let text = tokio::fs::read_to_string(&pair.js)
                .await
                .map_err(|e| Error::io(&pair.js, e))?;
            let updated = inject_reference(&text, &pair.dts_file_name());
            tokio::fs::write(&pair.js, updated)
                .await
                .map_err(|e| Error::io(&pair.js, e))?;

            debug!("[fob-dts] linked {}", pair.js.display());
            written.push(pair.js);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_text() {
        assert_eq!(
            reference_directive("index.d.ts"),
            "/// <reference types=\"./index.d.ts\" />"
        );
    }

    #[test]
    fn test_prepends_directive() {
        let out = inject_reference("\"use strict\";\nmodule.exports = 1;\n", "a.d.ts");
        assert_eq!(
            out,
            "/// <reference types=\"./a.d.ts\" />\n\"use strict\";\nmodule.exports = 1;\n"
        );
    }

    #[test]
    fn test_keeps_shebang_first() {
        let out = inject_reference("#!/usr/bin/env node\nconsole.log(1);\n", "cli.d.ts");
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "#!/usr/bin/env node");
        assert_eq!(lines[1], "/// <reference types=\"./cli.d.ts\" />");
        assert_eq!(lines[2], "console.log(1);");
    }

    #[test]
    fn test_shebang_without_newline() {
        let out = inject_reference("#!/usr/bin/env node", "cli.d.ts");
        assert_eq!(
            out,
            "#!/usr/bin/env node\n/// <reference types=\"./cli.d.ts\" />\n"
        );
    }

    #[test]
    fn test_hash_bang_must_be_at_start() {
        let out = inject_reference(" #!not a shebang\n", "a.d.ts");
        assert!(out.starts_with("/// <reference"));
    }

    #[test]
    fn test_repeated_injection_duplicates() {
        let once = inject_reference("x;\n", "a.d.ts");
        let twice = inject_reference(&once, "a.d.ts");
        assert_eq!(twice.matches("/// <reference").count(), 2);
    }

    #[test]
    fn test_artifact_pair_uses_base_name() {
        let pair = ArtifactPair::for_source(Path::new("/p/dist"), Path::new("/p/src/nested/view.tsx"))
            .unwrap();
        assert_eq!(pair.js, PathBuf::from("/p/dist/view.js"));
        assert_eq!(pair.dts, PathBuf::from("/p/dist/view.d.ts"));
    }
}
