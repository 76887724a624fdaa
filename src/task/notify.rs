// file: src/task/notify.rs
// version: 1.1.0
// guid: 7a3c91e5-d04b-4f6a-8e27-3b9f0c5d1a82

//! Evaluation server notifications

use super::TaskRequest;
use crate::deploy::DeployInfo;
use crate::error::AgentError;
use crate::security::ValidationUtils;
use crate::utils::retry_with_backoff;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Payload POSTed to `evaluation_url` after a successful deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub email: Option<String>,
    pub task: Option<String>,
    pub round: Option<i64>,
    pub nonce: Option<String>,
    pub repo_url: String,
    pub commit_sha: String,
    pub pages_url: String,
}

impl Notification {
    /// Echo the request's identifying fields alongside the deploy result
    pub fn new(task: &TaskRequest, deploy: &DeployInfo) -> Self {
        Self {
            email: task.email.clone(),
            task: task.task.clone(),
            round: task.round,
            nonce: task.nonce.clone(),
            repo_url: deploy.repo_url.clone(),
            commit_sha: deploy.commit_sha.clone(),
            pages_url: deploy.pages_url.clone(),
        }
    }
}

/// Delivers notifications to the evaluation server
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, url: &str, notification: &Notification) -> Result<()>;
}

/// Notifier that POSTs JSON over HTTP with retries
pub struct HttpNotifier {
    client: reqwest::Client,
    max_attempts: u32,
    initial_delay: Duration,
}

impl HttpNotifier {
    pub fn new(timeout: Duration, max_attempts: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pages-agent/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            max_attempts,
            initial_delay: Duration::from_secs(1),
        })
    }

    /// Change the first retry delay (doubles after each failure)
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    async fn post_once(&self, url: &reqwest::Url, notification: &Notification) -> Result<()> {
        let response = self
            .client
            .post(url.clone())
            .json(notification)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::NetworkError(format!(
                "Evaluation server answered {}: {}",
                status,
                body.trim()
            )));
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, url: &str, notification: &Notification) -> Result<()> {
        let target = ValidationUtils::validate_callback_url(url)?;

        retry_with_backoff(
            || self.post_once(&target, notification),
            self.max_attempts,
            self.initial_delay,
            "evaluation server notification",
        )
        .await?;

        info!("Notified evaluation server at {}", target);
        Ok(())
    }
}
