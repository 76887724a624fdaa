// file: src/provision/dependencies.rs
// version: 1.0.0
// guid: 9c41e0d2-7a3b-4f58-b6e1-2d8c5f903a47

//! Dependency installation from an ecosystem manifest
//!
//! The manifest's file name picks the package manager. The install itself is
//! entirely delegated to that tool; this module only checks that the manifest
//! is there and readable, then runs the tool next to it.

use crate::error::AgentError;
use crate::executor::{CommandExecutor, CommandSpec};
use crate::steps::{success_result_with_metadata, ProvisionStep, StepContext, StepResult};
use crate::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Package managers the provisioner knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    /// `requirements.txt` style pip requirement files
    PipRequirements,
    /// `pyproject.toml`, installed as a local project
    PyProject,
    Npm,
    Bundler,
    GoModules,
    Cargo,
}

impl ManifestKind {
    /// Pick the package manager from the manifest's file name
    pub fn detect(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                AgentError::ManifestError(format!("Invalid manifest path: {}", path.display()))
            })?;

        let kind = match file_name {
            "pyproject.toml" => ManifestKind::PyProject,
            "package.json" => ManifestKind::Npm,
            "Gemfile" => ManifestKind::Bundler,
            "go.mod" => ManifestKind::GoModules,
            "Cargo.toml" => ManifestKind::Cargo,
            name if name.ends_with(".txt") => ManifestKind::PipRequirements,
            _ => {
                return Err(AgentError::ManifestError(format!(
                    "Unsupported manifest format: {}",
                    path.display()
                )))
            }
        };

        Ok(kind)
    }

    /// Name of the package manager, for logs
    pub fn manager(&self) -> &'static str {
        match self {
            ManifestKind::PipRequirements | ManifestKind::PyProject => "pip",
            ManifestKind::Npm => "npm",
            ManifestKind::Bundler => "bundler",
            ManifestKind::GoModules => "go",
            ManifestKind::Cargo => "cargo",
        }
    }

    /// Install command for the manifest, run from the manifest's directory
    pub fn install_command(&self, manifest: &Path) -> CommandSpec {
        let dir = manifest
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = manifest
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        let spec = match self {
            ManifestKind::PipRequirements => CommandSpec::new("python3")
                .args(["-m", "pip", "install", "-r"])
                .arg(file_name),
            ManifestKind::PyProject => {
                CommandSpec::new("python3").args(["-m", "pip", "install", "."])
            }
            ManifestKind::Npm => CommandSpec::new("npm").arg("install"),
            ManifestKind::Bundler => CommandSpec::new("bundle").arg("install"),
            ManifestKind::GoModules => CommandSpec::new("go").args(["mod", "download"]),
            ManifestKind::Cargo => CommandSpec::new("cargo").arg("fetch"),
        };

        spec.current_dir(dir)
    }
}

/// Make sure the manifest exists and can be read before anything runs
pub async fn check_manifest(path: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        AgentError::ManifestError(format!(
            "Dependency manifest {} is not accessible: {}",
            path.display(),
            e
        ))
    })?;

    if !metadata.is_file() {
        return Err(AgentError::ManifestError(format!(
            "Dependency manifest {} is not a regular file",
            path.display()
        )));
    }

    tokio::fs::File::open(path).await.map_err(|e| {
        AgentError::ManifestError(format!(
            "Dependency manifest {} is not readable: {}",
            path.display(),
            e
        ))
    })?;

    Ok(())
}

/// Step 1: install the manifest's dependencies
pub struct DependencyStep {
    manifest: PathBuf,
    executor: Arc<dyn CommandExecutor>,
}

impl DependencyStep {
    pub fn new(manifest: impl Into<PathBuf>, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            manifest: manifest.into(),
            executor,
        }
    }
}

#[async_trait::async_trait]
impl ProvisionStep for DependencyStep {
    fn name(&self) -> &str {
        "dependencies"
    }

    fn description(&self) -> &str {
        "Install dependencies declared in the manifest"
    }

    async fn execute(&self, context: &StepContext) -> Result<StepResult> {
        check_manifest(&self.manifest).await?;

        let kind = ManifestKind::detect(&self.manifest)?;
        let command = kind.install_command(&self.manifest);
        debug!(
            "Session {}: installing with {}",
            context.session_id,
            command.display()
        );

        info!(
            "Installing dependencies from {} with {}",
            self.manifest.display(),
            kind.manager()
        );
        self.executor.execute(&command).await?;

        let mut metadata = HashMap::new();
        metadata.insert("manager".to_string(), kind.manager().to_string());
        metadata.insert(
            "manifest".to_string(),
            self.manifest.display().to_string(),
        );

        Ok(success_result_with_metadata(
            format!("Dependencies installed from {}", self.manifest.display()),
            metadata,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::ScriptedExecutor;
    use uuid::Uuid;

    fn context() -> StepContext {
        StepContext {
            session_id: Uuid::new_v4(),
            step_number: 1,
            total_steps: 2,
        }
    }

    #[test]
    fn test_detect_manifest_kinds() {
        let cases = [
            ("requirements.txt", ManifestKind::PipRequirements),
            ("deploy/requirements-prod.txt", ManifestKind::PipRequirements),
            ("pyproject.toml", ManifestKind::PyProject),
            ("web/package.json", ManifestKind::Npm),
            ("Gemfile", ManifestKind::Bundler),
            ("go.mod", ManifestKind::GoModules),
            ("Cargo.toml", ManifestKind::Cargo),
        ];

        for (path, expected) in cases {
            assert_eq!(ManifestKind::detect(Path::new(path)).unwrap(), expected, "{}", path);
        }

        assert!(ManifestKind::detect(Path::new("environment.yml")).is_err());
    }

    #[test]
    fn test_install_command_runs_next_to_manifest() {
        let spec = ManifestKind::PipRequirements.install_command(Path::new("app/requirements.txt"));
        assert_eq!(spec.display(), "python3 -m pip install -r requirements.txt");
        assert_eq!(spec.cwd, Some(PathBuf::from("app")));

        let spec = ManifestKind::Npm.install_command(Path::new("package.json"));
        assert_eq!(spec.display(), "npm install");
        assert_eq!(spec.cwd, Some(PathBuf::from(".")));
    }

    #[tokio::test]
    async fn test_missing_manifest_runs_nothing() {
        let executor = Arc::new(ScriptedExecutor::new());
        let step = DependencyStep::new("/nonexistent/requirements.txt", executor.clone());

        let err = step.execute(&context()).await.unwrap_err();

        assert!(matches!(err, AgentError::ManifestError(_)));
        assert!(executor.commands().is_empty());
    }

    #[tokio::test]
    async fn test_directory_is_not_a_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let executor = Arc::new(ScriptedExecutor::new());
        let step = DependencyStep::new(dir.path(), executor.clone());

        assert!(step.execute(&context()).await.is_err());
        assert!(executor.commands().is_empty());
    }

    #[tokio::test]
    async fn test_install_failure_propagates_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("requirements.txt");
        std::fs::write(&manifest, "requests==2.32.3\n").unwrap();

        let executor = Arc::new(ScriptedExecutor::new());
        executor.respond("python3 -m pip", 2, "", "No matching distribution");
        let step = DependencyStep::new(&manifest, executor.clone());

        let err = step.execute(&context()).await.unwrap_err();

        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("No matching distribution"));
    }

    #[tokio::test]
    async fn test_install_success_records_manager() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("requirements.txt");
        std::fs::write(&manifest, "fastapi\n").unwrap();

        let executor = Arc::new(ScriptedExecutor::new());
        let step = DependencyStep::new(&manifest, executor.clone());

        let result = step.execute(&context()).await.unwrap();

        assert_eq!(result.metadata.get("manager").map(String::as_str), Some("pip"));
        let calls = executor.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].cwd.as_deref(), Some(dir.path()));
    }
}
