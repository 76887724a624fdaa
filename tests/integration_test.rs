// file: tests/integration_test.rs
// version: 2.0.0
// guid: z6a7b8c9-d0e1-2345-6789-012345zabcde

//! Integration tests for the pages agent

use assert_cmd::Command;
use pages_agent::{
    config::{loader::ConfigLoader, Architecture, GhInstallMethod},
    executor::LocalExecutor,
    network::ArtifactFetcher,
    provision::{gh_cli, GhCliStep},
    steps::{StepRunner, StepStatus},
    AgentError, Result,
};
use predicates::prelude::*;
use sha2::Digest;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_config_loading_integration() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();

    let config_content = r#"
github_username: octocat
app_secret: ${TEST_APP_SECRET}
output_dir: /srv/pages
gemini:
  api_key: file-key
  model: gemini-2.5-pro
notification:
  max_attempts: 5
provision:
  manifest: package.json
  gh_method: package
"#;

    let config_path = temp_dir.path().join("agent.yaml");
    tokio::fs::write(&config_path, config_content).await?;

    let env = HashMap::from([
        ("TEST_APP_SECRET".to_string(), "from-env".to_string()),
        ("GEMINI_API_KEY".to_string(), "env-key".to_string()),
    ]);
    let config = ConfigLoader::with_env(env).resolve(Some(&config_path))?;

    assert_eq!(config.github_username.as_deref(), Some("octocat"));
    assert_eq!(config.app_secret.as_deref(), Some("from-env"));
    assert_eq!(config.gemini.api_key.as_deref(), Some("env-key"));
    assert_eq!(config.gemini.model, "gemini-2.5-pro");
    assert_eq!(config.notification.max_attempts, 5);
    assert_eq!(config.provision.manifest, PathBuf::from("package.json"));
    assert_eq!(config.provision.gh_method, GhInstallMethod::Package);
    assert!(config.validate_for_service().is_ok());

    Ok(())
}

#[tokio::test]
async fn test_config_with_missing_variable_fails() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("agent.yaml");
    tokio::fs::write(&config_path, "app_secret: ${NOT_SET_ANYWHERE}\n").await?;

    let result = ConfigLoader::with_env(HashMap::new()).resolve(Some(&config_path));

    assert!(matches!(result, Err(AgentError::ConfigError(_))));
    Ok(())
}

const MIRROR: &str = "https://mirror.example.com/gh-releases";

/// Serves a prebuilt archive and its checksum listing from memory
struct LocalRelease {
    archive: Vec<u8>,
    listing: String,
}

impl LocalRelease {
    fn check_mirror(url: &str) -> Result<()> {
        if url.starts_with(&format!("{}/v2.62.0/", MIRROR)) {
            Ok(())
        } else {
            Err(AgentError::network(format!("unexpected download {}", url)))
        }
    }
}

#[async_trait::async_trait]
impl ArtifactFetcher for LocalRelease {
    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        Self::check_mirror(url)?;
        tokio::fs::write(dest, &self.archive).await?;
        Ok(())
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        Self::check_mirror(url)?;
        Ok(self.listing.clone())
    }
}

/// Build a `gh_<v>_linux_<arch>.tar.gz` whose `bin/gh` prints a version
fn build_release(work: &Path, version: &str) -> (String, Vec<u8>) {
    let top = format!("gh_{}_linux_amd64", version);
    let bin = work.join(&top).join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    std::fs::write(
        bin.join("gh"),
        format!("#!/bin/sh\necho \"gh version {} (test)\"\n", version),
    )
    .unwrap();

    let asset = gh_cli::archive_name(version, Architecture::Amd64);
    let status = std::process::Command::new("tar")
        .args(["-czf", asset.as_str(), top.as_str()])
        .current_dir(work)
        .status()
        .unwrap();
    assert!(status.success());

    let bytes = std::fs::read(work.join(&asset)).unwrap();
    (asset, bytes)
}

#[cfg(unix)]
#[tokio::test]
async fn test_binary_install_from_release_archive() -> Result<()> {
    let work = TempDir::new().unwrap();
    let install_dir = TempDir::new().unwrap();
    let (asset, archive) = build_release(work.path(), "2.62.0");
    let listing = format!(
        "0000000000000000000000000000000000000000000000000000000000000000  gh_2.62.0_macOS_arm64.zip\n{}  {}\n",
        hex::encode(sha2::Sha256::digest(&archive)),
        asset
    );

    let step = GhCliStep::new(
        GhInstallMethod::Binary,
        "2.62.0",
        install_dir.path(),
        Architecture::Amd64,
        Arc::new(LocalExecutor::new()),
        Arc::new(LocalRelease { archive, listing }),
    )
    .with_release_base_url(format!("{}/", MIRROR));
    let results = StepRunner::new(vec![Box::new(step)]).run_all().await?;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, StepStatus::Completed);
    assert!(install_dir.path().join("gh").is_file());
    assert_eq!(
        results[0].metadata.get("version").map(String::as_str),
        Some("gh version 2.62.0 (test)")
    );

    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn test_binary_install_rejects_tampered_archive() -> Result<()> {
    let work = TempDir::new().unwrap();
    let install_dir = TempDir::new().unwrap();
    let (asset, archive) = build_release(work.path(), "2.62.0");
    let listing = format!("{}  {}\n", "ab".repeat(32), asset);

    let step = GhCliStep::new(
        GhInstallMethod::Binary,
        "2.62.0",
        install_dir.path(),
        Architecture::Amd64,
        Arc::new(LocalExecutor::new()),
        Arc::new(LocalRelease { archive, listing }),
    )
    .with_release_base_url(format!("{}/", MIRROR));
    let err = StepRunner::new(vec![Box::new(step)])
        .run_all()
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::ChecksumMismatch { .. }));
    assert!(!install_dir.path().join("gh").exists());

    Ok(())
}

fn agent() -> Command {
    let mut cmd = Command::cargo_bin("pages-agent").unwrap();
    for var in [
        "GITHUB_USERNAME",
        "GEMINI_API_KEY",
        "GEMINI_MODEL",
        "APP_SECRET",
        "PAGES_AGENT_OUTPUT_DIR",
        "PAGES_AGENT_CONFIG",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_provision_fails_without_manifest() {
    let dir = TempDir::new().unwrap();

    agent()
        .current_dir(dir.path())
        .args(["provision", "--manifest", "requirements.txt", "--gh-method", "package"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Manifest error"))
        .stdout(predicate::str::contains("gh-cli").not());
}

#[test]
fn test_run_task_requires_credentials() {
    let dir = TempDir::new().unwrap();
    let task = dir.path().join("task.json");
    std::fs::write(&task, r#"{"task": "quiz-app", "brief": "A quiz"}"#).unwrap();

    agent()
        .current_dir(dir.path())
        .args(["run-task", "--file", task.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("GITHUB_USERNAME is not set"));
}

#[test]
fn test_version_flag() {
    agent()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
