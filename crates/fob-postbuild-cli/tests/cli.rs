//! Integration tests for the `fob-postbuild` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A built project: `src/index.ts` and its CommonJS output in `dist/`.
fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::create_dir_all(root.join("dist")).unwrap();
    fs::write(root.join("src/index.ts"), "export const value: number = 1;\n").unwrap();
    fs::write(
        root.join("dist/index.js"),
        "\"use strict\";\nconst value = 1;\nmodule.exports = { value };\n",
    )
    .unwrap();
    fs::write(root.join("dist/index.js.map"), "{\"version\":3}").unwrap();
    temp
}

fn cmd(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("fob-postbuild").unwrap();
    cmd.current_dir(cwd)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .arg("--no-color");
    cmd
}

#[cfg(unix)]
fn fake_tsc(dir: &Path, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-tsc");
    fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[test]
fn test_help() {
    Command::cargo_bin("fob-postbuild")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--global-name"))
        .stdout(predicate::str::contains("--no-dts"));
}

#[test]
fn test_rejects_invalid_global_name() {
    let temp = project();
    cmd(temp.path())
        .args(["--no-dts", "--global-name", "my-lib"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("my-lib"));
}

#[test]
fn test_umd_only() {
    let temp = project();
    cmd(temp.path())
        .args(["--no-dts", "--global-name", "MyLib"])
        .assert()
        .success();

    let js = fs::read_to_string(temp.path().join("dist/index.js")).unwrap();
    assert!(js.starts_with("(function (root, factory) {\n"));
    assert!(js.contains("    root.MyLib = factory();\n"));
    assert!(js.contains("return { value };\n}));\n"));
    assert_eq!(
        fs::read_to_string(temp.path().join("dist/index.js.map")).unwrap(),
        "{\"version\":3}"
    );
}

#[test]
fn test_declarations_need_entry_points() {
    let temp = project();
    cmd(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("entry point"));
}

#[test]
fn test_missing_entry_point() {
    let temp = project();
    cmd(temp.path())
        .args(["src/missing.ts", "--tsc", "node_modules/.bin/tsc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Entry point not found"));
}

#[test]
fn test_missing_config_file() {
    let temp = project();
    cmd(temp.path())
        .args(["--no-dts", "--config", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_absent_type_checker_is_not_an_error() {
    let temp = project();
    cmd(temp.path())
        .args(["src/index.ts", "--tsc", "node_modules/.bin/tsc"])
        .assert()
        .success();

    let js = fs::read_to_string(temp.path().join("dist/index.js")).unwrap();
    assert!(js.starts_with("\"use strict\";"));
    assert!(!temp.path().join("dist/index.d.ts").exists());
}

#[test]
fn test_reads_config_file() {
    let temp = project();
    fs::write(
        temp.path().join("fob-postbuild.json"),
        r#"{ "dts": { "enabled": false }, "umd": { "global_name": "FromConfig" } }"#,
    )
    .unwrap();

    cmd(temp.path()).assert().success();

    let js = fs::read_to_string(temp.path().join("dist/index.js")).unwrap();
    assert!(js.contains("root.FromConfig = factory();"));
}

#[test]
fn test_cwd_flag() {
    let temp = project();
    let elsewhere = TempDir::new().unwrap();
    cmd(elsewhere.path())
        .arg("--cwd")
        .arg(temp.path())
        .args(["--no-dts", "--global-name", "MyLib"])
        .assert()
        .success();

    let js = fs::read_to_string(temp.path().join("dist/index.js")).unwrap();
    assert!(js.contains("root.MyLib = factory();"));
}

#[cfg(unix)]
#[test]
fn test_declarations_with_tsc_then_umd() {
    let temp = project();
    let tsc = fake_tsc(
        temp.path(),
        r#"out=""
while [ $# -gt 0 ]; do
  case "$1" in
    --outDir) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
mkdir -p "$out"
printf 'export declare const value: number;\n' > "$out/index.d.ts"
"#,
    );

    cmd(temp.path())
        .arg("src/index.ts")
        .arg("--tsc")
        .arg(&tsc)
        .args(["--global-name", "MyLib"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(temp.path().join("dist/index.d.ts")).unwrap(),
        "export declare const value: number;\n"
    );
    let js = fs::read_to_string(temp.path().join("dist/index.js")).unwrap();
    assert!(js.starts_with("(function (root, factory) {\n"));
    assert!(js.contains("/// <reference types=\"./index.d.ts\" />\n\"use strict\";"));
    assert!(js.contains("return { value };\n}));\n"));
}

#[cfg(unix)]
#[test]
fn test_type_errors_fail_the_run() {
    let temp = project();
    let tsc = fake_tsc(
        temp.path(),
        "echo \"src/index.ts(1,14): error TS2322: Type 'string' is not assignable to type 'number'.\"\nexit 2\n",
    );

    cmd(temp.path())
        .arg("src/index.ts")
        .arg("--tsc")
        .arg(&tsc)
        .args(["--global-name", "MyLib"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("TS2322"))
        .stderr(predicate::str::contains("Post-build failed with 1 error(s)"));

    // A failed build is never wrapped.
    let js = fs::read_to_string(temp.path().join("dist/index.js")).unwrap();
    assert!(js.starts_with("\"use strict\";"));
}

#[cfg(unix)]
#[test]
fn test_crashing_type_checker_is_reported() {
    let temp = project();
    let tsc = fake_tsc(temp.path(), "echo 'out of memory' >&2\nexit 134\n");

    cmd(temp.path())
        .arg("src/index.ts")
        .arg("--tsc")
        .arg(&tsc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Declaration emission failed"));

    let js = fs::read_to_string(temp.path().join("dist/index.js")).unwrap();
    assert!(!js.contains("/// <reference"));
}
