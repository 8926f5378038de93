#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Binary isolated from the caller's token, home directory and log filter.
fn dbx_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("dbx"));
    cmd.env("HOME", home.path())
        .env_remove("DBX_ACCESS_TOKEN")
        .env_remove("RUST_LOG")
        .current_dir(home.path());
    cmd
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    dbx_cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("account_info"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("--token"));
}

#[test]
fn remote_commands_without_token_ask_for_login() {
    let home = TempDir::new().unwrap();
    dbx_cmd(&home)
        .arg("ls")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Please 'login' to execute this command"));
}

#[test]
fn remote_dir_sets_starting_directory() {
    let home = TempDir::new().unwrap();
    dbx_cmd(&home)
        .args(["--remote-dir", "docs/../work/./2024", "pwd"])
        .assert()
        .success()
        .stdout("/work/2024\n");
}

#[test]
fn batch_file_keeps_going_after_bad_lines() {
    let home = TempDir::new().unwrap();
    let script = home.path().join("commands.txt");
    fs::write(
        &script,
        "cd photos\npwd\nteleport home\nmv only-one\ncd ../music\npwd\n",
    )
    .unwrap();

    dbx_cmd(&home)
        .args(["--token", "sl.test", "cmd"])
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("/photos\n"))
        .stdout(predicate::str::contains("*** Unknown command: teleport"))
        .stdout(predicate::str::contains("<TO_PATH>"))
        .stdout(predicate::str::ends_with("/music\n"));
}

#[test]
fn token_file_is_read_and_logged() {
    let home = TempDir::new().unwrap();
    let token_file = home.path().join("token_store.txt");
    fs::write(&token_file, "sl.from-file\n").unwrap();

    dbx_cmd(&home)
        .arg("-v")
        .arg("--token")
        .arg(&token_file)
        .arg("pwd")
        .assert()
        .success()
        .stdout("/\n")
        .stderr(predicate::str::contains("loaded OAuth 2 access token"));
}

#[test]
fn login_persists_token_in_home() {
    let home = TempDir::new().unwrap();
    dbx_cmd(&home)
        .args(["login", "sl.saved"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[loaded OAuth 2 access token]"));

    let saved = fs::read_to_string(home.path().join(".dbx_token")).unwrap();
    assert_eq!(saved, "sl.saved");
}

#[test]
fn missing_command_file_fails() {
    let home = TempDir::new().unwrap();
    dbx_cmd(&home)
        .args(["--token", "sl.test", "cmd", "nowhere.txt"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Error: IO error"));
}
