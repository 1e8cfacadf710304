use std::path::Path;
use std::process::{Command, Output};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::json;

/// Build an unsigned JWT expiring `offset` seconds from now.
pub fn jwt(label: &str, offset: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        json!({
            "token_type": "access",
            "exp": chrono::Utc::now().timestamp() + offset,
            "user_id": 1,
            "jti": label,
        })
        .to_string(),
    );
    format!("{}.{}.sig-{}", header, payload, label)
}

/// Run the CLI against `api` with an isolated credential file.
pub fn run_cli(args: &[&str], api: &str, store: &Path) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_penna"));
    cmd.args(args);
    cmd.arg("--api-url").arg(api);
    cmd.arg("--store").arg(store);
    cmd.env_remove("PENNA_API_URL");
    cmd.env_remove("PENNA_STORE");
    cmd.env_remove("RUST_LOG");
    cmd.env("NO_COLOR", "1");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success, returning stdout.
pub fn run_cli_success(args: &[&str], api: &str, store: &Path) -> String {
    let output = run_cli(args, api, store);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI and expect failure, returning stderr.
pub fn run_cli_failure(args: &[&str], api: &str, store: &Path) -> String {
    let output = run_cli(args, api, store);
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}
