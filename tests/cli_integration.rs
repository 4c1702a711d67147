//! Integration tests for the PinVault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Every run gets its own working directory with a `.pinvault.toml`
//! that lowers the Argon2 cost, and backup passwords are supplied via
//! `PINVAULT_BACKUP_PASSWORD` so nothing is interactive.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const DIGITS: &str = "1234567 2345678 3456789 4567890 5678901 6789012 7890123";
const PASSWORD: &str = "correctpw1234";

/// Helper: get a Command pointing at the pinvault binary.
fn pinvault() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("pinvault").expect("binary should exist")
}

/// Helper: a working directory with fast Argon2 settings.
fn workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tmp.child(".pinvault.toml")
        .write_str("argon2_memory_kib = 8192\nargon2_iterations = 1\nargon2_parallelism = 1\n")
        .unwrap();
    tmp
}

fn run(tmp: &TempDir) -> Command {
    let mut cmd = pinvault();
    cmd.current_dir(tmp.path())
        .env_remove("PINVAULT_BACKUP_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

fn add(tmp: &TempDir, name: &str) {
    run(tmp)
        .args(["add", name, "--digits", DIGITS])
        .assert()
        .success();
}

#[test]
fn help_flag_shows_usage() {
    pinvault()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Encrypted PIN table vault"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("import"));
}

#[test]
fn version_flag_shows_version() {
    pinvault()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pinvault"));
}

#[test]
fn no_args_shows_help() {
    pinvault()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn list_on_fresh_vault_is_empty() {
    let tmp = workspace();
    run(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No PINs"));
}

#[test]
fn add_show_and_list() {
    let tmp = workspace();
    add(&tmp, "Card A");

    tmp.child(".pinvault/pins").assert(predicate::path::is_file());

    run(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Card A"));

    run(&tmp)
        .args(["show", "Card A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Card A"))
        .stdout(predicate::str::contains("7"));
}

#[test]
fn add_duplicate_name_fails() {
    let tmp = workspace();
    add(&tmp, "Card A");
    run(&tmp)
        .args(["add", "Card A", "--digits", DIGITS])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn add_incomplete_grid_needs_fill() {
    let tmp = workspace();
    let partial = format!("___{}", &DIGITS.replace(' ', "")[3..]);

    run(&tmp)
        .args(["add", "Partial", "--digits", &partial])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not completely filled"));

    run(&tmp)
        .args(["add", "Partial", "--digits", &partial, "--fill"])
        .assert()
        .success();
}

#[test]
fn add_rejects_malformed_digits() {
    let tmp = workspace();
    run(&tmp)
        .args(["add", "Card A", "--digits", "123"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("49 cells"));
}

#[test]
fn show_missing_item_fails() {
    let tmp = workspace();
    run(&tmp)
        .args(["show", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn single_export_delete_import_roundtrip() {
    let tmp = workspace();
    add(&tmp, "Card A");

    run(&tmp)
        .args(["export", "Card A", "--output", "card.pin"])
        .env("PINVAULT_BACKUP_PASSWORD", PASSWORD)
        .assert()
        .success();
    tmp.child("card.pin").assert(predicate::path::is_file());

    run(&tmp)
        .args(["delete", "Card A", "--force"])
        .assert()
        .success();

    run(&tmp)
        .args(["import", "card.pin"])
        .env("PINVAULT_BACKUP_PASSWORD", PASSWORD)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 of 1 imported"));

    run(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Card A"));
}

#[test]
fn full_export_and_import_with_wrong_password() {
    let tmp = workspace();
    add(&tmp, "Card A");
    add(&tmp, "Bank");

    run(&tmp)
        .args(["export", "-o", "all.pinc"])
        .env("PINVAULT_BACKUP_PASSWORD", PASSWORD)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 PIN(s)"));

    run(&tmp)
        .args(["import", "all.pinc"])
        .env("PINVAULT_BACKUP_PASSWORD", "wrongpassword1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("wrong password"));

    run(&tmp)
        .args(["import", "all.pinc"])
        .env("PINVAULT_BACKUP_PASSWORD", PASSWORD)
        .assert()
        .success()
        .stderr(predicate::str::contains("0 of 2 imported"));
}

#[test]
fn export_with_short_password_fails() {
    let tmp = workspace();
    add(&tmp, "Card A");
    run(&tmp)
        .args(["export", "Card A", "-o", "card.pin"])
        .env("PINVAULT_BACKUP_PASSWORD", "short")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid backup password"));
    tmp.child("card.pin").assert(predicate::path::missing());
}

#[test]
fn export_of_empty_vault_fails() {
    let tmp = workspace();
    run(&tmp)
        .args(["export", "-o", "all.pinc"])
        .env("PINVAULT_BACKUP_PASSWORD", PASSWORD)
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty"));
}

#[test]
fn import_unknown_format_fails() {
    let tmp = workspace();
    tmp.child("notes.txt").write_str("hello").unwrap();
    run(&tmp)
        .args(["import", "notes.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown backup file format"));
}

#[test]
fn vault_dir_flag_is_respected() {
    let tmp = workspace();
    run(&tmp)
        .args(["--vault-dir", "elsewhere", "add", "Card A", "--digits", DIGITS])
        .assert()
        .success();
    tmp.child("elsewhere/pins").assert(predicate::path::is_file());
    tmp.child(".pinvault").assert(predicate::path::missing());
}
