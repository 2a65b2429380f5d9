//! Integration tests for the CLI binary.
//!
//! Drives the `adid` binary against a throwaway keystore directory.
//!
//! This test is registered as a [[test]] in the agentic-did-cli crate
//! so that CARGO_BIN_EXE_adid is available.

use std::path::Path;
use std::process::{Command, Output};

/// Get a Command pointing to the `adid` binary with a clean environment.
fn adid_binary() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_adid"));
    cmd.env_remove("AGENTIC_DID_PASSPHRASE")
        .env_remove("AGENTIC_DID_KEYSTORE_PASSPHRASE")
        .env_remove("AGENT_PASSPHRASE")
        .env_remove("AGENTIC_DID_HOME");
    cmd
}

/// Run `adid --keystore DIR --plaintext --json ARGS...`.
fn run_json(dir: &Path, args: &[&str]) -> Output {
    adid_binary()
        .arg("--keystore")
        .arg(dir)
        .arg("--plaintext")
        .arg("--json")
        .args(args)
        .output()
        .expect("failed to execute adid")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "adid should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn cli_responds_to_help() {
    let output = adid_binary()
        .arg("--help")
        .output()
        .expect("failed to execute adid --help");

    assert!(
        output.status.success(),
        "adid --help should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("adid") || stdout.contains("AgenticDID") || stdout.contains("Usage"),
        "adid --help output should contain usage information, got: {stdout}"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = adid_binary()
        .arg("--version")
        .output()
        .expect("failed to execute adid --version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("adid"),
        "adid --version should contain the binary name, got: {stdout}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = adid_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute adid");

    assert!(
        !output.status.success(),
        "adid with unknown flag should exit with error"
    );
}

#[test]
fn cli_validate_reports_invalid_identifier() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_json(dir.path(), &["did", "validate", "did:web:example.com"]);
    assert_eq!(output.status.code(), Some(2));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["valid"], false);
}

#[test]
fn cli_write_without_passphrase_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = adid_binary()
        .arg("--keystore")
        .arg(dir.path())
        .args(["identity", "create", "--role", "owner", "--name", "alice"])
        .output()
        .expect("failed to execute adid");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("passphrase"), "stderr: {stderr}");
}

#[test]
fn cli_weak_passphrase_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let output = adid_binary()
        .arg("--keystore")
        .arg(dir.path())
        .args(["--passphrase", "short"])
        .args(["identity", "create", "--role", "owner", "--name", "alice"])
        .output()
        .expect("failed to execute adid");

    assert!(!output.status.success());
}

#[test]
fn cli_identity_issue_verify_revoke() {
    let dir = tempfile::tempdir().unwrap();

    let owner = stdout_json(&run_json(
        dir.path(),
        &["identity", "create", "--role", "owner", "--name", "alice"],
    ));
    let owner_did = owner["did"].as_str().unwrap().to_string();
    assert!(owner_did.starts_with("did:key:z"));

    let agent = stdout_json(&run_json(
        dir.path(),
        &[
            "identity", "create", "--role", "agent", "--name", "worker", "--owner", &owner_did,
        ],
    ));
    let agent_did = agent["did"].as_str().unwrap().to_string();
    assert_eq!(agent["ownerDid"], owner_did.as_str());

    let agents = stdout_json(&run_json(
        dir.path(),
        &["identity", "list", "--owner", &owner_did],
    ));
    assert_eq!(agents.as_array().unwrap().len(), 1);

    let issued = stdout_json(&run_json(
        dir.path(),
        &[
            "issue", "ownership", "--owner", &owner_did, "--agent", &agent_did, "--expires", "1h",
        ],
    ));
    let token = issued["token"].as_str().unwrap().to_string();
    assert_eq!(token.split('.').count(), 3);

    let verified = stdout_json(&run_json(
        dir.path(),
        &["verify", &token, "--issuer", &owner_did, "--check-revoked"],
    ));
    assert_eq!(verified["valid"], true);

    stdout_json(&run_json(
        dir.path(),
        &["revoke", &token, "--reason", "compromised"],
    ));

    let status = stdout_json(&run_json(dir.path(), &["status", &token]));
    assert_eq!(status["revoked"], true);

    let after = run_json(dir.path(), &["verify", &token, "--check-revoked"]);
    assert_eq!(after.status.code(), Some(2));
    let after: serde_json::Value = serde_json::from_slice(&after.stdout).unwrap();
    assert_eq!(after["reason"], "Credential has been revoked");
}

#[test]
fn cli_rotation_updates_current() {
    let dir = tempfile::tempdir().unwrap();
    let owner = stdout_json(&run_json(
        dir.path(),
        &["identity", "create", "--role", "owner", "--name", "alice"],
    ));
    let did = owner["did"].as_str().unwrap().to_string();

    let record = stdout_json(&run_json(dir.path(), &["rotate", &did, "--reason", "routine"]));
    assert_eq!(record["oldDid"], did.as_str());
    assert_eq!(record["status"], "completed");

    let current = stdout_json(&run_json(dir.path(), &["current", &did]));
    assert_eq!(current["current"], record["newDid"]);

    let history = stdout_json(&run_json(dir.path(), &["history", &did]));
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[test]
fn cli_auth_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let owner = stdout_json(&run_json(
        dir.path(),
        &["identity", "create", "--role", "owner", "--name", "alice"],
    ));
    let did = owner["did"].as_str().unwrap().to_string();

    let nonce = stdout_json(&run_json(dir.path(), &["auth", "nonce"]));
    let nonce = nonce["nonce"].as_str().unwrap().to_string();

    let signed = stdout_json(&run_json(
        dir.path(),
        &["auth", "sign", "--did", &did, "--nonce", &nonce],
    ));
    let payload = signed["encodedPayload"].as_str().unwrap();
    let signature = signed["signature"].as_str().unwrap();

    let ok = stdout_json(&run_json(
        dir.path(),
        &[
            "auth", "verify", "--did", &did, "--payload", payload, "--signature", signature,
            "--nonce", &nonce,
        ],
    ));
    assert_eq!(ok["valid"], true);

    let bad = run_json(
        dir.path(),
        &[
            "auth", "verify", "--did", &did, "--payload", payload, "--signature", signature,
            "--nonce", "some-other-nonce",
        ],
    );
    assert_eq!(bad.status.code(), Some(2));
}
