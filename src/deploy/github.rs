// file: src/deploy/github.rs
// version: 1.0.0
// guid: d3b61f08-2c9e-4a75-8b40-e5f7a2c91d64

//! git / gh workflows for publishing a working copy

use super::DeployInfo;
use crate::config::GitConfig;
use crate::executor::{CommandExecutor, CommandSpec};
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Publishes working copies to GitHub and turns on Pages
pub struct GitHubPublisher {
    executor: Arc<dyn CommandExecutor>,
    username: String,
    git: GitConfig,
}

impl GitHubPublisher {
    pub fn new(executor: Arc<dyn CommandExecutor>, username: impl Into<String>, git: GitConfig) -> Self {
        Self {
            executor,
            username: username.into(),
            git,
        }
    }

    pub fn repo_url(&self, repo_name: &str) -> String {
        format!("https://github.com/{}/{}", self.username, repo_name)
    }

    pub fn clone_url(&self, repo_name: &str) -> String {
        format!("{}.git", self.repo_url(repo_name))
    }

    pub fn pages_url(&self, repo_name: &str) -> String {
        format!("https://{}.github.io/{}/", self.username, repo_name)
    }

    fn git(&self, dir: &Path) -> CommandSpec {
        CommandSpec::new("git")
            .arg("-c")
            .arg(format!("user.name={}", self.git.author_name))
            .arg("-c")
            .arg(format!("user.email={}", self.git.author_email))
            .current_dir(dir)
    }

    fn gh(&self, dir: &Path) -> CommandSpec {
        CommandSpec::new("gh").current_dir(dir)
    }

    async fn head_sha(&self, dir: &Path) -> Result<String> {
        let sha = self
            .executor
            .execute_with_output(&self.git(dir).args(["rev-parse", "HEAD"]))
            .await?;
        Ok(sha.trim().to_string())
    }

    /// Round 1: create the repository from a prepared working copy and publish it
    pub async fn create_and_publish(&self, dir: &Path, repo_name: &str) -> Result<DeployInfo> {
        info!("Deploying {} to GitHub", repo_name);

        self.executor
            .execute(&self.git(dir).args(["init", "-b", "main"]))
            .await?;
        self.executor.execute(&self.git(dir).args(["add", "."])).await?;
        self.executor
            .execute(&self.git(dir).args(["commit", "-m", "Initial commit"]))
            .await?;
        let commit_sha = self.head_sha(dir).await?;

        self.executor
            .execute(
                &self
                    .gh(dir)
                    .args(["repo", "create", repo_name, "--public", "--source=."]),
            )
            .await?;
        self.executor
            .execute(&self.git(dir).args(["push", "-u", "origin", "main"]))
            .await?;

        self.enable_pages(dir, repo_name).await?;

        info!("Deployment successful. Commit SHA: {}", commit_sha);
        Ok(DeployInfo {
            repo_url: self.repo_url(repo_name),
            pages_url: self.pages_url(repo_name),
            commit_sha,
        })
    }

    /// Serve the `main` branch root through GitHub Pages
    pub async fn enable_pages(&self, dir: &Path, repo_name: &str) -> Result<()> {
        info!("Enabling GitHub Pages for {}", repo_name);
        let endpoint = format!("/repos/{}/{}/pages", self.username, repo_name);
        self.executor
            .execute(&self.gh(dir).args([
                "api",
                "--method",
                "POST",
                "-H",
                "Accept: application/vnd.github+json",
                endpoint.as_str(),
                "-f",
                "source[branch]=main",
                "-f",
                "source[path]=/",
            ]))
            .await
    }

    /// Round 2: clone the existing repository into `dest`
    pub async fn clone_repo(&self, repo_name: &str, dest: &Path) -> Result<()> {
        self.executor
            .execute(
                &CommandSpec::new("git")
                    .arg("clone")
                    .arg(self.clone_url(repo_name))
                    .arg(dest.display().to_string()),
            )
            .await?;
        info!("Repository {} cloned", repo_name);
        Ok(())
    }

    /// Round 2: commit and push whatever changed; no-op commit is skipped
    pub async fn push_revision(&self, dir: &Path, repo_name: &str) -> Result<DeployInfo> {
        self.executor.execute(&self.git(dir).args(["add", "."])).await?;

        let status = self
            .executor
            .execute_with_output(&self.git(dir).args(["status", "--porcelain"]))
            .await?;

        if status.trim().is_empty() {
            info!("No changes detected. Code is already up to date");
        } else {
            self.executor
                .execute(&self.git(dir).args(["commit", "-m", "Apply round 2 revisions"]))
                .await?;
            self.executor.execute(&self.git(dir).arg("push")).await?;
            info!("Changes pushed to GitHub");
        }

        let commit_sha = self.head_sha(dir).await?;
        info!("Revision successful. Commit SHA: {}", commit_sha);

        Ok(DeployInfo {
            repo_url: self.repo_url(repo_name),
            pages_url: self.pages_url(repo_name),
            commit_sha,
        })
    }
}
