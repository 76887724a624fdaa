// file: src/config/mod.rs
// version: 2.1.0
// guid: a1b2c3d4-e5f6-7a8b-9c0d-1e2f3a4b5c6d

//! Configuration module for the pages agent
//!
//! Handles loading and validation of the agent configuration: GitHub account,
//! LLM credentials, HTTP service settings and host provisioning options.

pub mod loader;

pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default pinned release of the GitHub CLI installed by `provision`
pub const DEFAULT_GH_VERSION: &str = "2.62.0";

/// Where the GitHub CLI publishes its release assets
pub const DEFAULT_GH_RELEASE_URL: &str = "https://github.com/cli/cli/releases/download";

/// Supported host architectures for the GitHub CLI release archives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Architecture {
    #[serde(rename = "amd64")]
    Amd64,
    #[serde(rename = "arm64")]
    Arm64,
}

impl Architecture {
    /// Get the architecture as used in release asset names
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Amd64 => "amd64",
            Architecture::Arm64 => "arm64",
        }
    }
}

impl std::str::FromStr for Architecture {
    type Err = crate::error::AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amd64" | "x86_64" => Ok(Architecture::Amd64),
            "arm64" | "aarch64" => Ok(Architecture::Arm64),
            _ => Err(crate::error::AgentError::ValidationError(format!(
                "Unknown architecture: {}",
                s
            ))),
        }
    }
}

/// How the GitHub CLI gets onto the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GhInstallMethod {
    /// Download the pinned release archive and unpack it into the install dir
    #[default]
    Binary,
    /// Install the `gh` package through apt
    Package,
}

/// Top-level agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// GitHub account that owns the generated repositories
    pub github_username: Option<String>,
    /// Shared secret round 2 requests must present
    pub app_secret: Option<String>,
    /// Directory holding the local working copies, one per task
    pub output_dir: String,
    /// Copyright holder written into generated LICENSE files
    pub license_holder: String,
    pub gemini: GeminiConfig,
    pub git: GitConfig,
    pub server: ServerConfig,
    pub notification: NotificationConfig,
    pub provision: ProvisionConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            github_username: None,
            app_secret: None,
            output_dir: "output".to_string(),
            license_holder: "pages-agent contributors".to_string(),
            gemini: GeminiConfig::default(),
            git: GitConfig::default(),
            server: ServerConfig::default(),
            notification: NotificationConfig::default(),
            provision: ProvisionConfig::default(),
        }
    }
}

/// LLM connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Commit identity used for generated repositories
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub author_name: String,
    pub author_email: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            author_name: "pages-agent".to_string(),
            author_email: "pages-agent@users.noreply.github.com".to_string(),
        }
    }
}

/// HTTP service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Largest accepted request body; attachments travel inline as data URIs
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            max_body_bytes: 32 * 1024 * 1024,
        }
    }
}

/// Evaluation server notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub max_attempts: u32,
    pub timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_secs: 30,
        }
    }
}

/// Host provisioning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Dependency manifest, relative to the working directory
    pub manifest: PathBuf,
    pub gh_method: GhInstallMethod,
    pub gh_version: String,
    /// Directory on the execution path that receives the `gh` binary
    pub install_dir: String,
    pub verify_checksum: bool,
    /// Base URL of the release downloads; point it at a mirror to avoid github.com
    pub gh_release_url: String,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("requirements.txt"),
            gh_method: GhInstallMethod::Binary,
            gh_version: DEFAULT_GH_VERSION.to_string(),
            install_dir: "~/.local/bin".to_string(),
            verify_checksum: true,
            gh_release_url: DEFAULT_GH_RELEASE_URL.to_string(),
        }
    }
}

impl ProvisionConfig {
    /// Install directory with `~` and `$VARS` expanded
    pub fn resolved_install_dir(&self) -> crate::Result<PathBuf> {
        expand_path(&self.install_dir)
    }

    /// Validate the provisioning options
    pub fn validate(&self) -> crate::Result<()> {
        if self.gh_version.trim().is_empty() {
            return Err(crate::error::AgentError::ValidationError(
                "gh_version cannot be empty".to_string(),
            ));
        }

        if !self
            .gh_version
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.')
        {
            return Err(crate::error::AgentError::ValidationError(format!(
                "gh_version must look like 2.62.0, got '{}'",
                self.gh_version
            )));
        }

        if self.install_dir.trim().is_empty() {
            return Err(crate::error::AgentError::ValidationError(
                "install_dir cannot be empty".to_string(),
            ));
        }

        if url::Url::parse(&self.gh_release_url).is_err() {
            return Err(crate::error::AgentError::ValidationError(format!(
                "gh_release_url is not a valid URL: '{}'",
                self.gh_release_url
            )));
        }

        Ok(())
    }
}

impl AgentConfig {
    /// Working copy root with `~` and `$VARS` expanded
    pub fn resolved_output_dir(&self) -> crate::Result<PathBuf> {
        expand_path(&self.output_dir)
    }

    /// GitHub account, or a configuration error when unset
    pub fn github_username(&self) -> crate::Result<&str> {
        self.github_username
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                crate::error::AgentError::ConfigError(
                    "GITHUB_USERNAME is not set".to_string(),
                )
            })
    }

    /// Validate what `serve` and `run-task` need before accepting work
    pub fn validate_for_service(&self) -> crate::Result<()> {
        let username = self.github_username()?;
        crate::security::ValidationUtils::validate_github_username(username)?;

        if self
            .gemini
            .api_key
            .as_deref()
            .map_or(true, |key| key.is_empty())
        {
            return Err(crate::error::AgentError::ConfigError(
                "GEMINI_API_KEY is not set".to_string(),
            ));
        }

        if self.notification.max_attempts == 0 {
            return Err(crate::error::AgentError::ValidationError(
                "notification.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.app_secret.is_none() {
            tracing::warn!("APP_SECRET is not set; round 2 requests will be rejected");
        }

        Ok(())
    }
}

fn expand_path(raw: &str) -> crate::Result<PathBuf> {
    shellexpand::full(raw)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| crate::error::AgentError::ConfigError(format!("Cannot expand '{}': {}", raw, e)))
}
