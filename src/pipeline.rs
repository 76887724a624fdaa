// file: src/pipeline.rs
// version: 1.0.0
// guid: f5a2e8c1-3d74-4b9f-a06e-91c7d4b28e53

//! Build pipeline: one task in, one deployed app and notification out
//!
//! Round 1 generates a page and creates the repository. Round 2 checks the
//! shared secret, clones the repository and revises the page. Either way a
//! successful deploy is reported to the task's `evaluation_url`.

use crate::config::AgentConfig;
use crate::deploy::{workspace, DeployInfo, GitHubPublisher, Workspace};
use crate::executor::{CommandExecutor, LocalExecutor};
use crate::llm::{CodeGenerator, GeminiClient, LlmCodeGenerator};
use crate::logging::with_async_operation_span;
use crate::security::ValidationUtils;
use crate::task::{
    decode_attachments, HttpNotifier, Notification, Notifier, TaskRequest, ROUND_CREATE,
    ROUND_REVISE,
};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// How a task run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Deployed and the evaluation server acknowledged the notification
    Notified(DeployInfo),
    /// Deployed; the task had no `evaluation_url`
    Deployed(DeployInfo),
    /// Deployed, but every notification attempt failed
    NotificationFailed { deploy: DeployInfo, reason: String },
    /// The task was not acceptable (missing fields, bad secret, unknown round)
    Rejected(String),
    /// Generation or deployment failed; nothing was reported
    Failed(String),
}

impl PipelineOutcome {
    pub fn deploy_info(&self) -> Option<&DeployInfo> {
        match self {
            PipelineOutcome::Notified(deploy)
            | PipelineOutcome::Deployed(deploy)
            | PipelineOutcome::NotificationFailed { deploy, .. } => Some(deploy),
            PipelineOutcome::Rejected(_) | PipelineOutcome::Failed(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            PipelineOutcome::Notified(_) | PipelineOutcome::Deployed(_)
        )
    }
}

/// Runs build tasks end to end
pub struct BuildPipeline {
    generator: Arc<dyn CodeGenerator>,
    publisher: GitHubPublisher,
    notifier: Arc<dyn Notifier>,
    workspace: Workspace,
    app_secret: Option<String>,
    license_holder: String,
}

impl BuildPipeline {
    pub fn new(
        generator: Arc<dyn CodeGenerator>,
        publisher: GitHubPublisher,
        notifier: Arc<dyn Notifier>,
        workspace: Workspace,
        app_secret: Option<String>,
        license_holder: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            publisher,
            notifier,
            workspace,
            app_secret,
            license_holder: license_holder.into(),
        }
    }

    /// Wire up the real LLM client, local git/gh execution and HTTP notifier
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        config.validate_for_service()?;

        let model = Arc::new(GeminiClient::new(&config.gemini)?);
        let executor: Arc<dyn CommandExecutor> =
            Arc::new(LocalExecutor::with_timeout(Duration::from_secs(600)));
        let notifier = HttpNotifier::new(
            Duration::from_secs(config.notification.timeout_secs),
            config.notification.max_attempts,
        )?;

        Ok(Self::new(
            Arc::new(LlmCodeGenerator::new(model)),
            GitHubPublisher::new(executor, config.github_username()?, config.git.clone()),
            Arc::new(notifier),
            Workspace::new(config.resolved_output_dir()?),
            config.app_secret.clone(),
            config.license_holder.clone(),
        ))
    }

    /// Process one task. Never panics; every failure ends up in the outcome.
    pub async fn process(&self, task: TaskRequest) -> PipelineOutcome {
        let run_id = Uuid::new_v4().to_string();
        with_async_operation_span("build", &run_id, || self.process_inner(task)).await
    }

    async fn process_inner(&self, task: TaskRequest) -> PipelineOutcome {
        let (repo_name, brief) = match (task.repo_name(), task.brief()) {
            (Some(repo), Some(brief)) => (repo.to_string(), brief.to_string()),
            _ => {
                error!("Task data is missing 'brief' or 'task'");
                return PipelineOutcome::Rejected("missing 'brief' or 'task'".to_string());
            }
        };

        if let Err(e) = ValidationUtils::validate_repo_name(&repo_name) {
            error!("Rejecting task: {}", e);
            return PipelineOutcome::Rejected(e.to_string());
        }

        let deployed = match task.round() {
            ROUND_CREATE => {
                info!("Handling round 1: creating new repo for '{}'", repo_name);
                self.create(&repo_name, &brief, &task).await
            }
            ROUND_REVISE => {
                info!("Handling round 2: revising repo for '{}'", repo_name);
                if !self.secret_matches(task.secret.as_deref()) {
                    error!("Round 2 request missing or has invalid 'secret'");
                    return PipelineOutcome::Rejected("invalid secret".to_string());
                }
                info!("Secret verified");
                self.revise(&repo_name, &brief).await
            }
            other => {
                error!("Unknown round number: {}", other);
                return PipelineOutcome::Rejected(format!("unknown round {}", other));
            }
        };

        let deploy = match deployed {
            Ok(deploy) => deploy,
            Err(e) => {
                error!("Deployment failed, no notification sent: {}", e);
                return PipelineOutcome::Failed(e.to_string());
            }
        };

        self.report(&task, deploy).await
    }

    fn secret_matches(&self, provided: Option<&str>) -> bool {
        match (self.app_secret.as_deref(), provided) {
            (Some(expected), Some(provided)) if !expected.is_empty() => {
                ValidationUtils::secrets_match(expected, provided)
            }
            _ => false,
        }
    }

    async fn create(&self, repo_name: &str, brief: &str, task: &TaskRequest) -> Result<DeployInfo> {
        let attachments = decode_attachments(&task.attachments);
        let html = self.generator.generate_page(brief, &attachments).await?;
        let readme = self.generator.generate_readme(brief, repo_name).await;

        let dir = self
            .workspace
            .prepare(repo_name, &html, &readme, &self.license_holder)
            .await?;

        self.publisher.create_and_publish(&dir, repo_name).await
    }

    async fn revise(&self, repo_name: &str, brief: &str) -> Result<DeployInfo> {
        let dir = self.workspace.reset(repo_name).await?;
        self.publisher.clone_repo(repo_name, &dir).await?;

        let existing = workspace::read_page(&dir).await?;
        let html = self.generator.revise_page(&existing, brief).await?;
        workspace::write_page(&dir, &html).await?;

        let readme = self.generator.generate_readme(brief, repo_name).await;
        workspace::write_readme(&dir, &readme).await?;

        self.publisher.push_revision(&dir, repo_name).await
    }

    async fn report(&self, task: &TaskRequest, deploy: DeployInfo) -> PipelineOutcome {
        let Some(url) = task.evaluation_url.as_deref().filter(|u| !u.is_empty()) else {
            warn!("No evaluation_url found. Skipping notification");
            return PipelineOutcome::Deployed(deploy);
        };

        let notification = Notification::new(task, &deploy);
        info!("Notifying evaluation server for task {:?}", notification.task);

        match self.notifier.notify(url, &notification).await {
            Ok(()) => PipelineOutcome::Notified(deploy),
            Err(e) => {
                error!("Failed to notify evaluation server: {}", e);
                PipelineOutcome::NotificationFailed {
                    deploy,
                    reason: e.to_string(),
                }
            }
        }
    }
}
