//! Command line behaviour of the built binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn git_herd(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_git-herd"))
        .args(args)
        .current_dir(dir)
        // Keep a developer's own configuration out of the run
        .env("XDG_CONFIG_HOME", dir.join(".no-config"))
        .env("HOME", dir)
        .env("NO_COLOR", "1")
        .output()
        .expect("run git-herd")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_help_and_version_exit_zero() {
    let tmp = TempDir::new().unwrap();

    let help = git_herd(tmp.path(), &["--help"]);
    assert_eq!(help.status.code(), Some(0));
    let text = stdout(&help);
    assert!(text.contains("--operation"));
    assert!(text.contains("--skip-dirty"));

    let version = git_herd(tmp.path(), &["--version"]);
    assert_eq!(version.status.code(), Some(0));
    assert!(stdout(&version).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_invalid_arguments_exit_one() {
    let tmp = TempDir::new().unwrap();
    for args in [
        &["-w", "0"][..],
        &["--operation", "push"][..],
        &["--timeout", "forever"][..],
        &["--no-such-flag"][..],
    ] {
        let output = git_herd(tmp.path(), args);
        assert_eq!(output.status.code(), Some(1), "args {:?}", args);
    }
}

#[test]
fn test_missing_explicit_config_file_exits_one() {
    let tmp = TempDir::new().unwrap();
    let output = git_herd(tmp.path(), &["-c", "absent.toml", "-p"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn test_invalid_config_in_working_directory_exits_one() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("git-herd.toml"), "workers = 0\n").unwrap();
    let output = git_herd(tmp.path(), &["-p"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_missing_path_exits_one() {
    let tmp = TempDir::new().unwrap();
    let output = git_herd(tmp.path(), &["-p", "does-not-exist"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_tree_without_repositories_exits_zero() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("a/b/c")).unwrap();
    let output = git_herd(tmp.path(), &["-p", "--log-level", "off"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(!stdout(&output).contains("Summary"));
}

#[test]
fn test_broken_working_copy_fails_the_run() {
    // An empty .git directory marks a working copy that cannot be opened
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("broken/.git")).unwrap();
    let report = tmp.path().join("report.txt");

    let output = git_herd(
        tmp.path(),
        &["-p", "--save-report", report.to_str().unwrap(), "."],
    );

    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.contains("❌ broken"), "stdout: {}", text);
    assert!(text.contains("📈 Summary: 0 successful, 1 failed, 0 skipped, 1 total"));
    let saved = fs::read_to_string(&report).unwrap();
    assert!(saved.contains("Status: FAILED - failed to open repository"));
}

#[test]
fn test_dry_run_with_config_file_layering() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("broken/.git")).unwrap();
    fs::create_dir_all(tmp.path().join("skipme/broken/.git")).unwrap();
    fs::write(
        tmp.path().join("git-herd.toml"),
        "exclude = [\"skipme\"]\nworkers = 2\nplain = true\n",
    )
    .unwrap();

    let output = git_herd(tmp.path(), &["-n", "--log-level", "off"]);

    // The broken repository still fails analysis; the excluded one is never seen
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("1 total"));
}
