use std::process::Command;

use sha2::{Digest, Sha256};
use tempfile::TempDir;

fn schemactl() -> Command {
    Command::new(env!("CARGO_BIN_EXE_schemactl"))
}

fn sha256_hex(body: &str) -> String {
    let digest = Sha256::digest(body.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

// The registry endpoint points at a closed port. If hash validation
// correctly runs before any upload, the command fails with the hash
// error and never notices the endpoint is unreachable.
const DEAD_ENDPOINT: &str = "http://127.0.0.1:9";

#[test]
fn test_v2_hash_mismatch_fails_before_any_upload() {
    let temp_dir = TempDir::new().unwrap();
    let manifest_path = temp_dir.path().join("manifest.json");

    let good_a = "query A { a }";
    let good_b = "query B { b }";
    let mut manifest = serde_json::Map::new();
    manifest.insert(
        format!("sha256:{}", sha256_hex(good_a)),
        serde_json::Value::String(good_a.into()),
    );
    manifest.insert(
        format!("sha256:{}", sha256_hex(good_b)),
        serde_json::Value::String(good_b.into()),
    );
    manifest.insert(
        "a".repeat(64),
        serde_json::Value::String("query C { c }".into()),
    );
    std::fs::write(
        &manifest_path,
        serde_json::Value::Object(manifest).to_string(),
    )
    .unwrap();

    let output = schemactl()
        .arg("app")
        .arg("create")
        .arg(&manifest_path)
        .args(["--name", "web", "--version", "1.0.0", "--format", "v2"])
        .args(["--registry-endpoint", DEAD_ENDPOINT])
        .args(["--registry-access-token", "test-token"])
        .arg("--json")
        .output()
        .expect("Failed to run app create");

    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let envelope: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(envelope["type"], "failure");
    assert_eq!(envelope["data"]["type"], "Failure");

    let message = envelope["data"]["message"].as_str().unwrap();
    assert!(message.contains("Hash does not match document content"));
    assert!(message.contains(&format!("Provided: {}", "a".repeat(64))));
    assert!(message.contains(&format!("Expected: {}", sha256_hex("query C { c }"))));
    // The error came from local validation, not the dead endpoint.
    assert!(!message.contains("registry request failed"));
}

#[test]
fn test_v2_rejects_non_sha256_hashes_with_bypass_hint() {
    let temp_dir = TempDir::new().unwrap();
    let manifest_path = temp_dir.path().join("manifest.json");

    let manifest = serde_json::json!({
        "my-operation-1": "query A { a }",
    });
    std::fs::write(&manifest_path, manifest.to_string()).unwrap();

    let output = schemactl()
        .arg("app")
        .arg("create")
        .arg(&manifest_path)
        .args(["--name", "web", "--version", "1.0.0", "--format", "v2"])
        .args(["--registry-endpoint", DEAD_ENDPOINT])
        .args(["--registry-access-token", "test-token"])
        .arg("--json")
        .output()
        .expect("Failed to run app create");

    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let envelope: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let message = envelope["data"]["message"].as_str().unwrap();
    assert!(message.contains("Invalid hash format detected: my-operation-1"));
    assert!(message.contains("--format v1"));
}

#[test]
fn test_malformed_manifest_is_a_user_input_failure() {
    let temp_dir = TempDir::new().unwrap();
    let manifest_path = temp_dir.path().join("manifest.json");
    std::fs::write(&manifest_path, "[1, 2, 3]").unwrap();

    let output = schemactl()
        .arg("app")
        .arg("create")
        .arg(&manifest_path)
        .args(["--name", "web", "--version", "1.0.0"])
        .args(["--registry-endpoint", DEAD_ENDPOINT])
        .args(["--registry-access-token", "test-token"])
        .arg("--json")
        .output()
        .expect("Failed to run app create");

    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let envelope: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(envelope["data"]["type"], "FailureUserInput");
    assert_eq!(envelope["data"]["problem"], "fileContentsInvalid");
}
