#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A throwaway data directory plus the mock server the CLI talks to.
pub struct Env {
    pub server: MockServer,
    pub dir: TempDir,
}

impl Env {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn credential_file(&self) -> PathBuf {
        self.dir.path().join("credential.json")
    }

    pub fn stored(&self) -> serde_json::Value {
        let json = std::fs::read_to_string(self.credential_file()).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    /// Run the CLI binary, feeding `stdin` if given.
    pub async fn run(&self, args: &[&str], stdin: Option<&str>) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_quizgate"));
        cmd.args(args)
            .env("QUIZGATE_API_URL", self.server.uri())
            .env("QUIZGATE_DATA_DIR", self.dir.path())
            .env("NO_COLOR", "1")
            .env_remove("QUIZGATE_PASSWORD")
            .env_remove("RUST_LOG")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let input = stdin.unwrap_or_default().to_string();

        tokio::task::spawn_blocking(move || {
            let mut child = cmd.spawn().expect("Failed to execute CLI");
            let mut pipe = child.stdin.take().unwrap();
            // The CLI may exit without reading its input.
            let _ = pipe.write_all(input.as_bytes());
            drop(pipe);
            child.wait_with_output().expect("Failed to wait for CLI")
        })
        .await
        .unwrap()
    }

    /// Run the CLI and expect success, returning stdout.
    pub async fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args, None).await;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run the CLI and expect failure, returning stderr.
    pub async fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args, None).await;
        if output.status.success() {
            panic!("CLI command should have failed: {:?}", args);
        }
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    /// Mount login and profile endpoints handing out `access`/`refresh`.
    pub async fn mount_login(&self, access: &str, refresh: &str) {
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access,
                "refresh_token": refresh
            })))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 7,
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "role": "student"
            })))
            .mount(&self.server)
            .await;
    }

    /// Log in through the CLI.
    pub async fn login(&self) {
        self.run_success(&[
            "login",
            "--email",
            "ada@example.com",
            "--password",
            "hunter22",
        ])
        .await;
    }
}
