// file: src/provision/gh_cli.rs
// version: 1.1.0
// guid: 6e2a9f14-0b7c-4d3e-8a51-f7c0b2d96e38

//! GitHub CLI installation
//!
//! Two mechanisms, picked by configuration and never mixed:
//! - `binary`: download the pinned release archive, check it against the
//!   release checksum list, unpack it and move `gh` into the install dir
//! - `package`: `apt-get install gh`

use crate::config::{Architecture, GhInstallMethod, DEFAULT_GH_RELEASE_URL};
use crate::error::AgentError;
use crate::executor::{CommandExecutor, CommandSpec};
use crate::network::ArtifactFetcher;
use crate::steps::{success_result_with_metadata, ProvisionStep, StepContext, StepResult};
use crate::utils::SystemUtils;
use crate::Result;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Name of the release archive for a version and architecture
pub fn archive_name(version: &str, arch: Architecture) -> String {
    format!("gh_{}_linux_{}.tar.gz", version, arch.as_str())
}

/// Name of the checksum list published next to the archives
pub fn checksums_name(version: &str) -> String {
    format!("gh_{}_checksums.txt", version)
}

/// Find the SHA-256 for `asset` in a `sha256sum`-style listing
pub fn find_checksum(listing: &str, asset: &str) -> Option<String> {
    listing.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let hash = parts.next()?;
        let name = parts.next()?.trim_start_matches('*');
        (name == asset).then(|| hash.to_ascii_lowercase())
    })
}

/// Hex SHA-256 of a file's contents
pub async fn sha256_file(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Locate the `gh` executable inside an unpacked release (`*/bin/gh`)
pub fn find_gh_binary(root: &Path) -> Option<PathBuf> {
    WalkDir::new(root)
        .max_depth(4)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| {
            entry.file_type().is_file()
                && entry.file_name() == "gh"
                && entry
                    .path()
                    .parent()
                    .and_then(Path::file_name)
                    .map_or(false, |parent| parent == "bin")
        })
        .map(|entry| entry.into_path())
}

/// Step 2: put the GitHub CLI on the execution path
pub struct GhCliStep {
    method: GhInstallMethod,
    version: String,
    install_dir: PathBuf,
    verify_checksum: bool,
    arch: Architecture,
    release_base_url: String,
    as_root: bool,
    executor: Arc<dyn CommandExecutor>,
    fetcher: Arc<dyn ArtifactFetcher>,
}

impl GhCliStep {
    pub fn new(
        method: GhInstallMethod,
        version: impl Into<String>,
        install_dir: impl Into<PathBuf>,
        arch: Architecture,
        executor: Arc<dyn CommandExecutor>,
        fetcher: Arc<dyn ArtifactFetcher>,
    ) -> Self {
        Self {
            method,
            version: version.into(),
            install_dir: install_dir.into(),
            verify_checksum: true,
            arch,
            release_base_url: DEFAULT_GH_RELEASE_URL.to_string(),
            as_root: SystemUtils::is_root(),
            executor,
            fetcher,
        }
    }

    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksum = enabled;
        self
    }

    pub fn with_release_base_url(mut self, url: impl Into<String>) -> Self {
        self.release_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override root detection (decides whether apt runs through sudo)
    pub fn with_root(mut self, as_root: bool) -> Self {
        self.as_root = as_root;
        self
    }

    /// Release archive URL for the configured version
    pub fn archive_url(&self) -> String {
        format!(
            "{}/v{}/{}",
            self.release_base_url,
            self.version,
            archive_name(&self.version, self.arch)
        )
    }

    fn checksums_url(&self) -> String {
        format!(
            "{}/v{}/{}",
            self.release_base_url,
            self.version,
            checksums_name(&self.version)
        )
    }

    async fn install_binary(&self) -> Result<PathBuf> {
        // Dropped at the end of this function whatever happens
        let staging = tempfile::Builder::new()
            .prefix("pages-agent-gh-")
            .tempdir()?;
        let asset = archive_name(&self.version, self.arch);
        let archive = staging.path().join(&asset);

        self.fetcher.download(&self.archive_url(), &archive).await?;

        if self.verify_checksum {
            let listing = self.fetcher.fetch_text(&self.checksums_url()).await?;
            let expected = find_checksum(&listing, &asset).ok_or_else(|| {
                AgentError::InstallationError(format!(
                    "{} is not listed in {}",
                    asset,
                    checksums_name(&self.version)
                ))
            })?;
            let actual = sha256_file(&archive).await?;
            if actual != expected {
                return Err(AgentError::ChecksumMismatch {
                    file: asset,
                    expected,
                    actual,
                });
            }
            debug!("Checksum verified for {}", asset);
        }

        self.executor
            .execute(
                &CommandSpec::new("tar")
                    .args(["-xzf", asset.as_str(), "-C", "."])
                    .current_dir(staging.path()),
            )
            .await?;

        let unpacked = find_gh_binary(staging.path()).ok_or_else(|| {
            AgentError::InstallationError(format!("No bin/gh found inside {}", asset))
        })?;

        tokio::fs::create_dir_all(&self.install_dir).await?;
        let dest = self.install_dir.join("gh");
        move_file(&unpacked, &dest).await?;
        make_executable(&dest).await?;

        if !SystemUtils::is_on_path(&self.install_dir) {
            warn!(
                "{} is not on PATH; add it so `gh` can be found",
                self.install_dir.display()
            );
        }

        Ok(dest)
    }

    fn apt(&self, args: &[&str]) -> CommandSpec {
        let spec = if self.as_root {
            CommandSpec::new("apt-get").env("DEBIAN_FRONTEND", "noninteractive")
        } else {
            // sudo resets the environment, so the variable goes on its command line
            CommandSpec::new("sudo")
                .arg("DEBIAN_FRONTEND=noninteractive")
                .arg("apt-get")
        };
        spec.args(args.iter().copied())
    }

    async fn install_package(&self) -> Result<PathBuf> {
        self.executor.execute(&self.apt(&["update"])).await?;
        self.executor
            .execute(&self.apt(&["install", "-y", "gh"]))
            .await?;

        Ok(SystemUtils::find_command("gh").unwrap_or_else(|| PathBuf::from("gh")))
    }
}

async fn move_file(from: &Path, to: &Path) -> Result<()> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    // Staging and install dir can sit on different filesystems
    tokio::fs::copy(from, to).await?;
    tokio::fs::remove_file(from).await?;
    Ok(())
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[async_trait::async_trait]
impl ProvisionStep for GhCliStep {
    fn name(&self) -> &str {
        "gh-cli"
    }

    fn description(&self) -> &str {
        match self.method {
            GhInstallMethod::Binary => "Install the GitHub CLI from the release archive",
            GhInstallMethod::Package => "Install the GitHub CLI with apt",
        }
    }

    async fn execute(&self, context: &StepContext) -> Result<StepResult> {
        debug!("Session {}: installing gh {}", context.session_id, self.version);

        let installed = match self.method {
            GhInstallMethod::Binary => self.install_binary().await?,
            GhInstallMethod::Package => self.install_package().await?,
        };

        let version_output = self
            .executor
            .execute_with_output(&CommandSpec::new(installed.display().to_string()).arg("--version"))
            .await?;
        let version_line = version_output.lines().next().unwrap_or_default().trim().to_string();
        info!("Installed {}", version_line);

        let mut metadata = HashMap::new();
        metadata.insert("path".to_string(), installed.display().to_string());
        metadata.insert("version".to_string(), version_line);

        Ok(success_result_with_metadata(
            format!("GitHub CLI installed at {}", installed.display()),
            metadata,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::ScriptedExecutor;
    use uuid::Uuid;

    struct UnreachableFetcher;

    #[async_trait::async_trait]
    impl ArtifactFetcher for UnreachableFetcher {
        async fn download(&self, url: &str, _dest: &Path) -> Result<()> {
            Err(AgentError::network(format!("cannot reach {}", url)))
        }

        async fn fetch_text(&self, url: &str) -> Result<String> {
            Err(AgentError::network(format!("cannot reach {}", url)))
        }
    }

    fn context() -> StepContext {
        StepContext {
            session_id: Uuid::new_v4(),
            step_number: 2,
            total_steps: 2,
        }
    }

    #[test]
    fn test_archive_naming() {
        assert_eq!(
            archive_name("2.62.0", Architecture::Amd64),
            "gh_2.62.0_linux_amd64.tar.gz"
        );
        assert_eq!(checksums_name("2.62.0"), "gh_2.62.0_checksums.txt");
    }

    #[test]
    fn test_archive_url() {
        let step = GhCliStep::new(
            GhInstallMethod::Binary,
            "2.62.0",
            "/tmp/bin",
            Architecture::Arm64,
            Arc::new(ScriptedExecutor::new()),
            Arc::new(UnreachableFetcher),
        );
        assert_eq!(
            step.archive_url(),
            "https://github.com/cli/cli/releases/download/v2.62.0/gh_2.62.0_linux_arm64.tar.gz"
        );
    }

    #[test]
    fn test_find_checksum() {
        let listing = "\
aaaa1111  gh_2.62.0_linux_arm64.tar.gz
BBBB2222 *gh_2.62.0_linux_amd64.tar.gz
cccc3333  gh_2.62.0_macOS_amd64.zip
";
        assert_eq!(
            find_checksum(listing, "gh_2.62.0_linux_amd64.tar.gz").as_deref(),
            Some("bbbb2222")
        );
        assert!(find_checksum(listing, "gh_2.62.0_windows_amd64.zip").is_none());
    }

    #[test]
    fn test_find_gh_binary() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("gh_2.62.0_linux_amd64").join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(dir.path().join("gh_2.62.0_linux_amd64").join("gh"), "not me").unwrap();
        std::fs::write(bin.join("gh"), "#!/bin/sh\n").unwrap();

        assert_eq!(find_gh_binary(dir.path()), Some(bin.join("gh")));
    }

    #[tokio::test]
    async fn test_unreachable_release_fails_before_extracting() {
        let executor = Arc::new(ScriptedExecutor::new());
        let install_dir = tempfile::tempdir().unwrap();
        let step = GhCliStep::new(
            GhInstallMethod::Binary,
            "2.62.0",
            install_dir.path(),
            Architecture::Amd64,
            executor.clone(),
            Arc::new(UnreachableFetcher),
        );

        let err = step.execute(&context()).await.unwrap_err();

        assert!(matches!(err, AgentError::NetworkError(_)));
        assert!(executor.commands().is_empty());
        assert!(!install_dir.path().join("gh").exists());
    }

    #[tokio::test]
    async fn test_package_install_uses_sudo_when_not_root() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.respond("gh --version", 0, "gh version 2.45.0 (2024-03-04)\n", "");
        executor.respond("/", 0, "gh version 2.45.0 (2024-03-04)\n", "");
        let step = GhCliStep::new(
            GhInstallMethod::Package,
            "2.62.0",
            "/unused",
            Architecture::Amd64,
            executor.clone(),
            Arc::new(UnreachableFetcher),
        )
        .with_root(false);

        let result = step.execute(&context()).await.unwrap();

        let commands = executor.commands();
        assert_eq!(commands[0], "sudo DEBIAN_FRONTEND=noninteractive apt-get update");
        assert_eq!(
            commands[1],
            "sudo DEBIAN_FRONTEND=noninteractive apt-get install -y gh"
        );
        assert!(commands[2].ends_with("gh --version"));
        assert_eq!(
            result.metadata.get("version").map(String::as_str),
            Some("gh version 2.45.0 (2024-03-04)")
        );
    }

    #[tokio::test]
    async fn test_package_install_stops_when_apt_fails() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.respond("apt-get update", 100, "", "Temporary failure resolving");
        let step = GhCliStep::new(
            GhInstallMethod::Package,
            "2.62.0",
            "/unused",
            Architecture::Amd64,
            executor.clone(),
            Arc::new(UnreachableFetcher),
        )
        .with_root(true);

        let err = step.execute(&context()).await.unwrap_err();

        assert_eq!(err.exit_code(), 100);
        assert_eq!(executor.commands(), vec!["apt-get update".to_string()]);
    }

    #[test]
    fn test_apt_keeps_frontend_noninteractive() {
        let step = |as_root| {
            GhCliStep::new(
                GhInstallMethod::Package,
                "2.62.0",
                "/unused",
                Architecture::Amd64,
                Arc::new(ScriptedExecutor::new()),
                Arc::new(UnreachableFetcher),
            )
            .with_root(as_root)
        };

        let direct = step(true).apt(&["update"]);
        assert_eq!(direct.display(), "apt-get update");
        assert!(direct
            .env
            .contains(&("DEBIAN_FRONTEND".to_string(), "noninteractive".to_string())));

        let via_sudo = step(false).apt(&["update"]);
        assert_eq!(via_sudo.program, "sudo");
        assert_eq!(via_sudo.args[0], "DEBIAN_FRONTEND=noninteractive");
        assert!(via_sudo.env.is_empty());
    }
}
