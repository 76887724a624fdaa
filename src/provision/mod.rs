// file: src/provision/mod.rs
// version: 1.1.0
// guid: 2d7f5b90-c3e1-4a6d-9f08-b14e6a2c7d55

//! Host provisioning: dependency install, then GitHub CLI install
//!
//! A fixed two-step sequence with fail-fast semantics. If the dependency
//! step fails the CLI step never runs.

pub mod dependencies;
pub mod gh_cli;

pub use dependencies::{DependencyStep, ManifestKind};
pub use gh_cli::GhCliStep;

use crate::config::{Architecture, ProvisionConfig};
use crate::executor::CommandExecutor;
use crate::network::ArtifactFetcher;
use crate::steps::{StepResult, StepRunner};
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Builds and runs the provisioning sequence
pub struct Provisioner {
    runner: StepRunner,
}

impl Provisioner {
    /// Build the sequence from configuration
    ///
    /// `working_dir` anchors a relative manifest path.
    pub fn from_config(
        config: &ProvisionConfig,
        working_dir: &Path,
        arch: Architecture,
        executor: Arc<dyn CommandExecutor>,
        fetcher: Arc<dyn ArtifactFetcher>,
    ) -> Result<Self> {
        config.validate()?;

        let manifest = working_dir.join(&config.manifest);
        let install_dir = config.resolved_install_dir()?;

        let gh = GhCliStep::new(
            config.gh_method,
            config.gh_version.clone(),
            install_dir,
            arch,
            Arc::clone(&executor),
            fetcher,
        )
        .with_checksum_verification(config.verify_checksum)
        .with_release_base_url(config.gh_release_url.clone());

        Ok(Self {
            runner: StepRunner::new(vec![
                Box::new(DependencyStep::new(manifest, executor)),
                Box::new(gh),
            ]),
        })
    }

    /// Step names in execution order
    pub fn plan(&self) -> Vec<&str> {
        self.runner.step_names()
    }

    /// Run every step; the first failure aborts the rest
    pub async fn run(&self) -> Result<Vec<StepResult>> {
        let results = self.runner.run_all().await?;
        info!("Provisioning completed ({} steps)", results.len());
        Ok(results)
    }
}
