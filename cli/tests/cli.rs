use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use pretty_assertions::assert_eq;

const LIBRARY: &str = "function add(x, y) {
  return x + y
}

/*
Adds two numbers.

    > add(1, 2)
    3

Remembers globals between examples.

    > var total = add(2, 2)

Uses them.

    > total
    4
*/
";

fn transcript(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_transcript"))
        .args(args)
        .arg("--no-color")
        .env_remove("TRANSCRIPT_LOG")
        .output()
        .expect("failed to run transcript")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

#[test]
fn no_file_prints_usage() {
    let output = transcript(&[]);
    assert_eq!(stdout(&output), "usage: transcript <file>\n");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn passing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = write(dir.path(), "lib.js", LIBRARY);
    let output = transcript(&[path_arg(&file)]);
    assert_eq!(
        stdout(&output),
        "1..3\nok Adds two numbers.\nok Remembers globals between examples.\nok Uses them.\n"
    );
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn failing_example_sets_the_exit_status() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = write(
        dir.path(),
        "lib.js",
        "/*\nwrong\n\n    > 1 + 1\n    3\n*/\n",
    );
    let output = transcript(&[path_arg(&file)]);
    let label = file.display().to_string();
    assert_eq!(
        stdout(&output),
        format!("1..1\nnot ok wrong\n    expected:\n        3\n    got:\n        2\n    at {label}:4\n")
    );
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn isolate_flag_gives_each_example_a_fresh_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = write(dir.path(), "lib.js", LIBRARY);
    let output = transcript(&[path_arg(&file), "--isolate"]);
    assert!(stdout(&output).contains("not ok Uses them."), "{}", stdout(&output));
    assert!(stdout(&output).contains("ReferenceError: total is not defined"));
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn config_beside_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = write(dir.path(), "lib.js", LIBRARY);
    write(dir.path(), "transcript.toml", "isolation = \"fresh\"\n");
    let output = transcript(&[path_arg(&file)]);
    assert!(stdout(&output).contains("not ok Uses them."));
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = write(dir.path(), "lib.js", LIBRARY);
    let config = write(dir.path(), "custom.toml", "colour = true\n");
    let output = transcript(&[path_arg(&file), "--config", path_arg(&config)]);
    assert_eq!(stdout(&output), "");
    assert!(stderr(&output).contains("invalid config"), "{}", stderr(&output));
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn parse_errors_are_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = write(dir.path(), "lib.js", "/*\nx\n\n    > 1\n    1\n*/\nvar = 1\n");
    let output = transcript(&[path_arg(&file)]);
    assert_eq!(stdout(&output), "");
    assert!(stderr(&output).contains("error"), "{}", stderr(&output));
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn missing_file() {
    let output = transcript(&["does/not/exist.js"]);
    assert!(stderr(&output).contains("cannot read 'does/not/exist.js'"));
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn list_shows_transcripts_without_running() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = write(
        dir.path(),
        "lib.js",
        "/*\nNever run.\n\n    > explode(\n    ...  1)\n    2\n*/\n",
    );
    let output = transcript(&[path_arg(&file), "--list"]);
    let label = file.display().to_string();
    assert_eq!(
        stdout(&output),
        format!("{label}:4 Never run.\n    > explode(\n    ...  1)\n    2\n")
    );
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn html_renders_block_comments() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = write(dir.path(), "lib.js", "/* *hello* */\n// *ignored*\n");
    let output = transcript(&[path_arg(&file), "--html"]);
    assert_eq!(stdout(&output), "<p><em>hello</em></p>\n");
}

#[test]
fn functional_demo() {
    let demo = concat!(env!("CARGO_MANIFEST_DIR"), "/../demos/functional.js");
    let output = transcript(&[demo]);
    let out = stdout(&output);
    assert!(out.starts_with("1..14\n"), "{out}");
    assert!(!out.contains("not ok"), "{out}");
    assert_eq!(output.status.code(), Some(0));
}
