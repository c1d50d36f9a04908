//! End-to-end tests of the `tweet` binary.
//!
//! These cover everything that happens before the first remote call:
//! argument handling, config loading and message sizing. None of them need
//! network access.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const APP_CREDENTIALS: &str = "<api>_key = consumerkey\n<api>_secret = consumersecret\n";
const ACCOUNT_CREDENTIALS: &str = "jschauma_key = 1234-accesskey\njschauma_secret = accesssecret\n";

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("tweetrc");
    fs::write(&path, contents).unwrap();
    path
}

fn tweet() -> Command {
    let mut cmd = Command::cargo_bin("tweet").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn tweet_with_config(path: &Path) -> Command {
    let mut cmd = tweet();
    cmd.arg("-u").arg("jschauma").arg("-c").arg(path);
    cmd
}

#[test]
fn test_help_goes_to_stdout() {
    tweet()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("--user"))
        .stdout(predicate::str::contains("--truncate"));
}

#[test]
fn test_version_goes_to_stdout() {
    tweet()
        .arg("-V")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_user_is_an_error() {
    tweet()
        .arg("-l")
        .arg("1234")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--user"));
}

#[test]
fn test_unknown_flag_is_an_error() {
    tweet()
        .args(["-u", "jschauma", "--bogus"])
        .assert()
        .code(1)
        .stderr(predicate::str::is_empty().not());
}

#[test]
fn test_reserved_user_name_is_refused() {
    let dir = TempDir::new().unwrap();
    let contents = format!("{APP_CREDENTIALS}{ACCOUNT_CREDENTIALS}");
    let path = write_config(&dir, &contents);

    tweet()
        .arg("-u")
        .arg("<api>")
        .arg("-c")
        .arg(&path)
        .write_stdin("hello\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("reserved"));

    assert_eq!(fs::read_to_string(&path).unwrap(), contents);
}

#[test]
fn test_empty_user_name_is_refused() {
    tweet()
        .args(["-u", "", "-l", "1234"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("must not be empty"));
}

#[test]
fn test_missing_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("does-not-exist");

    tweet_with_config(&path)
        .write_stdin("hello\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unable to open config file"));
}

#[test]
fn test_config_without_app_credentials() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, ACCOUNT_CREDENTIALS);

    tweet_with_config(&path)
        .write_stdin("hello\n")
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No API credentials found."));
}

#[test]
fn test_partial_app_credentials_count_as_missing() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "<api>_key = consumerkey\n");

    tweet_with_config(&path)
        .arg("-l")
        .arg("1234")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No API credentials found."));
}

#[test]
fn test_long_message_without_truncation() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &format!("{APP_CREDENTIALS}{ACCOUNT_CREDENTIALS}"));

    tweet_with_config(&path)
        .write_stdin(format!("{}\n", "word ".repeat(80)))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Message too long (400). Trim by 120."));
}

#[test]
fn test_empty_message() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &format!("{APP_CREDENTIALS}{ACCOUNT_CREDENTIALS}"));

    tweet_with_config(&path)
        .write_stdin("\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("empty"));
}

#[test]
fn test_missing_media_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &format!("{APP_CREDENTIALS}{ACCOUNT_CREDENTIALS}"));
    let media = dir.path().join("missing.png");

    tweet_with_config(&path)
        .arg("-m")
        .arg(&media)
        .write_stdin("with a picture\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No such file"));
}
