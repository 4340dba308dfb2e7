//! Binary integration tests for contract-intake
//!
//! These tests run the actual binary as a subprocess to cover argument parsing.

#![cfg(not(coverage))]
#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_binary_help() {
    Command::cargo_bin("contract-intake")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--preview-rows"))
        .stdout(predicate::str::contains("--session-ttl"))
        .stdout(predicate::str::contains("INTAKE_SESSION_TTL"))
        .stdout(predicate::str::contains("MainData.xlsx"));
}

#[test]
fn test_binary_version() {
    Command::cargo_bin("contract-intake")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_binary_rejects_invalid_port() {
    Command::cargo_bin("contract-intake")
        .unwrap()
        .args(["--port", "not-a-port"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_binary_rejects_zero_session_ttl() {
    Command::cargo_bin("contract-intake")
        .unwrap()
        .args(["--session-ttl", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--session-ttl"));
}
