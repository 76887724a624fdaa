// file: src/cli/commands.rs
// version: 2.0.0
// guid: g7h8i9j0-k1l2-3456-7890-123456ghijkl

//! Command implementations for the CLI

use crate::{
    config::{loader::ConfigLoader, AgentConfig, GhInstallMethod},
    error::AgentError,
    executor::LocalExecutor,
    network::NetworkDownloader,
    pipeline::{BuildPipeline, PipelineOutcome},
    provision::Provisioner,
    server,
    task::TaskRequest,
    utils::system::SystemUtils,
    Result,
};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Options for the `provision` subcommand
#[derive(Debug, Default)]
pub struct ProvisionOptions {
    pub manifest: Option<PathBuf>,
    pub gh_method: Option<GhInstallMethod>,
    pub gh_version: Option<String>,
    pub install_dir: Option<String>,
    pub skip_checksum: bool,
}

/// Load the layered configuration (file, then environment)
pub fn load_config(config_path: Option<&Path>) -> Result<AgentConfig> {
    ConfigLoader::new().resolve(config_path)
}

/// Install manifest dependencies, then the GitHub CLI
pub async fn provision_command(config_path: Option<&Path>, options: ProvisionOptions) -> Result<()> {
    let mut config = load_config(config_path)?.provision;

    if let Some(manifest) = options.manifest {
        config.manifest = manifest;
    }
    if let Some(method) = options.gh_method {
        config.gh_method = method;
    }
    if let Some(version) = options.gh_version {
        config.gh_version = version;
    }
    if let Some(install_dir) = options.install_dir {
        config.install_dir = install_dir;
    }
    if options.skip_checksum {
        warn!("Checksum verification disabled");
        config.verify_checksum = false;
    }

    let working_dir = std::env::current_dir()?;
    let arch = SystemUtils::get_system_arch()?;
    info!(
        "Provisioning host ({} architecture, manifest {})",
        arch.as_str(),
        config.manifest.display()
    );

    let provisioner = Provisioner::from_config(
        &config,
        &working_dir,
        arch,
        Arc::new(LocalExecutor::new()),
        Arc::new(NetworkDownloader::new()?),
    )?;

    provisioner.run().await?;
    info!("✓ Provisioning finished");
    Ok(())
}

/// Run the HTTP service until `shutdown` resolves
pub async fn serve_command<F>(config_path: Option<&Path>, bind: Option<String>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let mut config = load_config(config_path)?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    let pipeline = Arc::new(BuildPipeline::from_config(&config)?);
    server::serve(&config.server, pipeline, shutdown).await
}

/// Run one task from a JSON file and print the deployment as JSON
pub async fn run_task_command(config_path: Option<&Path>, file: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let body = tokio::fs::read(file).await.map_err(|e| {
        AgentError::config(format!("Failed to read task file {}: {}", file.display(), e))
    })?;
    let task = TaskRequest::from_json(&body)?;

    let pipeline = BuildPipeline::from_config(&config)?;
    let outcome = pipeline.process(task).await;

    if let Some(deploy) = outcome.deploy_info() {
        println!("{}", serde_json::to_string_pretty(deploy)?);
    }

    match outcome {
        PipelineOutcome::Notified(_) | PipelineOutcome::Deployed(_) => Ok(()),
        PipelineOutcome::NotificationFailed { reason, .. } => Err(AgentError::network(format!(
            "Deployed, but the evaluation server was not notified: {}",
            reason
        ))),
        PipelineOutcome::Rejected(reason) => Err(AgentError::validation(reason)),
        PipelineOutcome::Failed(reason) => Err(AgentError::deploy(reason)),
    }
}

/// Check system prerequisites
pub async fn check_prerequisites_command(config_path: Option<&Path>) -> Result<()> {
    info!("Checking system prerequisites for the pages agent");

    let missing = SystemUtils::check_prerequisites();
    if missing.is_empty() {
        info!("✓ All required system commands are available");
    } else {
        error!("✗ Missing required commands: {}", missing.join(", "));
        info!("Install missing tools:");
        for cmd in &missing {
            match cmd.as_str() {
                "git" => info!("  sudo apt install git"),
                "gh" => info!("  pages-agent provision"),
                _ => {}
            }
        }
    }

    if SystemUtils::is_root() {
        info!("✓ Running as root - apt installs run without sudo");
    } else {
        info!("⚠ Not running as root - package installs will use sudo");
    }

    let config = load_config(config_path)?;
    let credentials = config.validate_for_service();
    match &credentials {
        Ok(()) => info!("✓ GitHub username and Gemini API key are configured"),
        Err(e) => error!("✗ Service configuration incomplete: {}", e),
    }

    if !missing.is_empty() {
        return Err(AgentError::validation(format!(
            "missing required commands: {}",
            missing.join(", ")
        )));
    }
    credentials
}
