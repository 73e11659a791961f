//! Integration tests for the pmvault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! Passphrases are supplied through `PMVAULT_PASSPHRASE` /
//! `PMVAULT_NEW_PASSPHRASE` so no interactive prompt is ever reached.

use assert_cmd::Command;
use assert_fs::TempDir;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use predicates::prelude::*;

const LEGACY_RECORD: &str = "MTI2LDE2MCwxOSwxMTgsNzgsMjcsMjE4LDY1LDIzNiwxMCwxODEsMTAw&MTUzLDE5OSwxNjIsNjMsMjM0LDE1NCwxNzYsNTIsMTkzLDcyLDEwMSwyLDE0LDg5LDMxLDIwNyw0MSwyMjcsMjksMjAsMjIyLDEyNiwxOTksMjA2LDExOSwyNCwxNTksMTQ4LDIyOCwxNjYsMjQ4LDIzMSwyMSw3MywyMTMsNjUsODUsNDQsMTAyLDgxLDEyLDE4NCwxNzEsMTUxLDQ5LDI1MiwxNjgsMjE0";

/// Helper: a pmvault command isolated to `dir`.
fn pmvault(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("pmvault").expect("binary should exist");
    cmd.current_dir(dir.path())
        .env_remove("PMVAULT_SESSION_TOKEN")
        .env_remove("PMVAULT_PASSPHRASE")
        .env_remove("PMVAULT_NEW_PASSPHRASE")
        .env_remove("RUST_LOG")
        .arg("--store")
        .arg(dir.path().join("store.json"));
    cmd
}

fn token(fill: u8) -> String {
    BASE64.encode([fill; 32])
}

/// The single envelope line printed on stdout.
fn envelope_line(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout)
        .lines()
        .find(|line| line.contains('&') && !line.contains(' '))
        .expect("an envelope line on stdout")
        .to_string()
}

/// Run `init` with a known token and return the master key record.
fn init(dir: &TempDir, passphrase: &str, token: &str) -> String {
    let out = pmvault(dir)
        .args(["--session-token", token, "init"])
        .env("PMVAULT_PASSPHRASE", passphrase)
        .output()
        .unwrap();
    assert!(out.status.success(), "init failed: {out:?}");
    envelope_line(&out.stdout)
}

#[test]
fn help_flag_shows_usage() {
    let tmp = TempDir::new().unwrap();
    pmvault(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("passphrase-wrapped master key"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("unlock"))
        .stdout(predicate::str::contains("show-key"))
        .stdout(predicate::str::contains("rotate"))
        .stdout(predicate::str::contains("browse"));
}

#[test]
fn init_prints_record_and_writes_cache() {
    let tmp = TempDir::new().unwrap();
    let record = init(&tmp, "passphrase1", &token(1));

    assert_eq!(record.matches('&').count(), 1);
    let store = std::fs::read_to_string(tmp.path().join("store.json")).unwrap();
    assert!(store.contains("pmengine_masterkey"));
}

#[test]
fn init_generates_a_token_when_none_given() {
    let tmp = TempDir::new().unwrap();
    pmvault(&tmp)
        .arg("init")
        .env("PMVAULT_PASSPHRASE", "passphrase1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Session token"));
}

#[test]
fn init_rejects_short_passphrase() {
    let tmp = TempDir::new().unwrap();
    pmvault(&tmp)
        .arg("init")
        .env("PMVAULT_PASSPHRASE", "short")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8"));
}

#[test]
fn unlock_with_same_token_hits_cache() {
    let tmp = TempDir::new().unwrap();
    let record = init(&tmp, "passphrase1", &token(1));

    pmvault(&tmp)
        .args(["--session-token", &token(1), "unlock", &record])
        .assert()
        .success()
        .stdout(predicate::str::contains("session cache"));
}

#[test]
fn unlock_with_new_token_uses_passphrase() {
    let tmp = TempDir::new().unwrap();
    let record = init(&tmp, "passphrase1", &token(1));

    pmvault(&tmp)
        .args(["--session-token", &token(2), "unlock", &record])
        .env("PMVAULT_PASSPHRASE", "passphrase1")
        .assert()
        .success()
        .stdout(predicate::str::contains("passphrase"));

    // The cache now answers to the new token without a passphrase.
    pmvault(&tmp)
        .args(["--session-token", &token(2), "unlock", &record])
        .assert()
        .success()
        .stdout(predicate::str::contains("session cache"));
}

#[test]
fn unlock_with_wrong_passphrase_fails() {
    let tmp = TempDir::new().unwrap();
    let record = init(&tmp, "passphrase1", &token(1));

    pmvault(&tmp)
        .args(["--session-token", &token(3), "unlock", &record])
        .env("PMVAULT_PASSPHRASE", "not-the-passphrase")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Decryption failed"));
}

#[test]
fn unlock_without_token_fails() {
    let tmp = TempDir::new().unwrap();
    pmvault(&tmp)
        .args(["unlock", LEGACY_RECORD])
        .assert()
        .failure()
        .stderr(predicate::str::contains("session token"));
}

#[test]
fn malformed_record_is_rejected() {
    let tmp = TempDir::new().unwrap();
    pmvault(&tmp)
        .args(["--session-token", &token(1), "unlock", "garbage"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed envelope"));
}

#[test]
fn seal_then_open_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let record = init(&tmp, "passphrase1", &token(1));

    let out = pmvault(&tmp)
        .args(["--session-token", &token(1), "seal", &record, "hello world"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let sealed = envelope_line(&out.stdout);

    pmvault(&tmp)
        .args(["--session-token", &token(1), "open", &record, &sealed])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello world"));
}

#[test]
fn encrypt_then_decrypt_with_passphrase() {
    let tmp = TempDir::new().unwrap();
    let out = pmvault(&tmp)
        .args(["encrypt", "a note"])
        .env("PMVAULT_PASSPHRASE", "passphrase1")
        .output()
        .unwrap();
    assert!(out.status.success());
    let envelope = envelope_line(&out.stdout);

    pmvault(&tmp)
        .args(["decrypt", &envelope])
        .env("PMVAULT_PASSPHRASE", "passphrase1")
        .assert()
        .success()
        .stdout(predicate::str::contains("a note"));

    pmvault(&tmp)
        .args(["decrypt", &envelope])
        .env("PMVAULT_PASSPHRASE", "passphrase2")
        .assert()
        .failure();
}

#[test]
fn show_key_opens_legacy_record() {
    let tmp = TempDir::new().unwrap();
    pmvault(&tmp)
        .args(["show-key", LEGACY_RECORD])
        .env("PMVAULT_PASSPHRASE", "password")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "903a36891faef9e5bd1cb326d2fe8777587735e071fa0dd9f4fee78fb26c38e3",
        ));
}

#[test]
fn rotate_keeps_the_same_master_key() {
    let tmp = TempDir::new().unwrap();
    let key = "11".repeat(32);
    let out = pmvault(&tmp)
        .args(["--session-token", &token(1), "init", "--key", &key])
        .env("PMVAULT_PASSPHRASE", "passphrase1")
        .output()
        .unwrap();
    assert!(out.status.success());
    let record = envelope_line(&out.stdout);

    let out = pmvault(&tmp)
        .args(["--session-token", &token(1), "rotate", &record])
        .env("PMVAULT_PASSPHRASE", "passphrase1")
        .env("PMVAULT_NEW_PASSPHRASE", "passphrase2")
        .output()
        .unwrap();
    assert!(out.status.success(), "rotate failed: {out:?}");
    let rotated = envelope_line(&out.stdout);
    assert_ne!(rotated, record);

    pmvault(&tmp)
        .args(["show-key", &rotated])
        .env("PMVAULT_PASSPHRASE", "passphrase2")
        .assert()
        .success()
        .stdout(predicate::str::contains(key.as_str()));
}

/// Run `init --key` with a known token and return the record.
fn init_with_key(dir: &TempDir, passphrase: &str, token: &str, key: &str) -> String {
    let out = pmvault(dir)
        .args(["--session-token", token, "init", "--key", key])
        .env("PMVAULT_PASSPHRASE", passphrase)
        .output()
        .unwrap();
    assert!(out.status.success(), "init failed: {out:?}");
    envelope_line(&out.stdout)
}

#[test]
fn rotate_ignores_a_cache_holding_another_records_key() {
    let tmp = TempDir::new().unwrap();
    let key_a = "aa".repeat(32);
    let key_b = "bb".repeat(32);

    // Both records share one token; the cache now holds B's key.
    let record_a = init_with_key(&tmp, "passphrase-a", &token(1), &key_a);
    init_with_key(&tmp, "passphrase-b", &token(1), &key_b);

    let out = pmvault(&tmp)
        .args(["--session-token", &token(1), "rotate", &record_a])
        .env("PMVAULT_PASSPHRASE", "passphrase-a")
        .env("PMVAULT_NEW_PASSPHRASE", "passphrase-a2")
        .output()
        .unwrap();
    assert!(out.status.success(), "rotate failed: {out:?}");
    let rotated = envelope_line(&out.stdout);

    pmvault(&tmp)
        .args(["show-key", &rotated])
        .env("PMVAULT_PASSPHRASE", "passphrase-a2")
        .assert()
        .success()
        .stdout(predicate::str::contains(key_a.as_str()))
        .stdout(predicate::str::contains(key_b.as_str()).not());
}

#[test]
fn rotate_requires_the_current_passphrase() {
    let tmp = TempDir::new().unwrap();
    let record = init(&tmp, "passphrase1", &token(1));

    // A warm cache is not enough to re-wrap the record.
    pmvault(&tmp)
        .args(["--session-token", &token(1), "rotate", &record])
        .env("PMVAULT_PASSPHRASE", "wrong-passphrase")
        .env("PMVAULT_NEW_PASSPHRASE", "passphrase2")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Decryption failed"));
}

#[test]
fn browse_missing_file_fails() {
    let tmp = TempDir::new().unwrap();
    pmvault(&tmp)
        .args(["browse", "nope.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CSV file not found"));
}

#[test]
fn completions_bash_mentions_binary() {
    let tmp = TempDir::new().unwrap();
    pmvault(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pmvault"));
}
