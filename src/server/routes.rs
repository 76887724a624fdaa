// file: src/server/routes.rs
// version: 1.1.0
// guid: 9e41b7c2-05d8-4f3a-b6e9-7a2c18d4f650

//! Request handlers

use crate::pipeline::{BuildPipeline, PipelineOutcome};
use crate::task::TaskRequest;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Background builds started by the server
#[derive(Clone, Default)]
pub struct BuildTracker {
    builds: Arc<Mutex<JoinSet<()>>>,
}

impl BuildTracker {
    fn lock(&self) -> std::sync::MutexGuard<'_, JoinSet<()>> {
        self.builds.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn spawn<F>(&self, build: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut builds = self.lock();
        // Reap finished builds so the set only holds running ones
        while builds.try_join_next().is_some() {}
        builds.spawn(build);
    }

    /// Builds started and not yet reaped
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for every tracked build to finish
    pub async fn drain(&self) {
        loop {
            let mut builds = std::mem::take(&mut *self.lock());
            if builds.is_empty() {
                return;
            }
            while let Some(joined) = builds.join_next().await {
                if let Err(e) = joined {
                    error!("Build task ended abnormally: {}", e);
                }
            }
        }
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pipeline: Option<Arc<BuildPipeline>>,
    builds: BuildTracker,
    max_body_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: Arc<BuildPipeline>, max_body_bytes: usize) -> Self {
        Self {
            pipeline: Some(pipeline),
            builds: BuildTracker::default(),
            max_body_bytes,
        }
    }

    /// State that accepts requests but never runs them
    #[cfg(test)]
    fn detached() -> Self {
        Self {
            pipeline: None,
            builds: BuildTracker::default(),
            max_body_bytes: crate::config::ServerConfig::default().max_body_bytes,
        }
    }

    pub fn builds(&self) -> BuildTracker {
        self.builds.clone()
    }
}

pub fn router(state: AppState) -> Router {
    let max_body_bytes = state.max_body_bytes;
    Router::new()
        .route("/", get(health))
        .route("/api-endpoint", post(receive_task))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "pages-agent is running." }))
}

async fn receive_task(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let task = match TaskRequest::from_json(&body) {
        Ok(task) => task,
        Err(e) => {
            warn!("Rejected request body: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": format!("Invalid request body: {}", e) })),
            );
        }
    };

    info!(
        "Received task {:?} (round {})",
        task.repo_name().unwrap_or("<missing>"),
        task.round()
    );

    if let Some(pipeline) = state.pipeline {
        state.builds.spawn(async move {
            match pipeline.process(task).await {
                PipelineOutcome::Notified(deploy) | PipelineOutcome::Deployed(deploy) => {
                    info!("Task finished: {}", deploy.pages_url)
                }
                outcome => warn!("Task did not complete: {:?}", outcome),
            }
        });
    }

    (
        StatusCode::OK,
        Json(json!({ "message": "Task received and is being processed." })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::Response;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "status": "pages-agent is running." })
        );
    }

    #[tokio::test]
    async fn test_accepts_task() {
        let body = Bytes::from_static(br#"{"task": "quiz-app", "brief": "A quiz", "round": 1}"#);

        let response = receive_task(State(AppState::detached()), body)
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["message"],
            "Task received and is being processed."
        );
    }

    #[tokio::test]
    async fn test_accepts_null_attachments() {
        let body = Bytes::from_static(
            br#"{"task": "quiz-app", "brief": "A quiz", "attachments": null}"#,
        );

        let response = receive_task(State(AppState::detached()), body)
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rejects_malformed_body() {
        let body = Bytes::from_static(b"{not json");

        let response = receive_task(State(AppState::detached()), body)
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let detail = body_json(response).await["detail"].as_str().unwrap().to_string();
        assert!(detail.starts_with("Invalid request body: "));
    }

    #[tokio::test]
    async fn test_rejects_array_body() {
        let body = Bytes::from_static(b"[]");

        let response = receive_task(State(AppState::detached()), body)
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tracker_drain_waits_for_running_builds() {
        let tracker = BuildTracker::default();
        let finished = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let finished = finished.clone();
            tracker.spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                finished.fetch_add(1, Ordering::SeqCst);
            });
        }
        tracker.drain().await;

        assert_eq!(finished.load(Ordering::SeqCst), 3);
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn test_tracker_reaps_finished_builds() {
        let tracker = BuildTracker::default();
        tracker.spawn(async {});
        tokio::time::sleep(Duration::from_millis(20)).await;

        tracker.spawn(async {
            tokio::time::sleep(Duration::from_millis(200)).await;
        });

        assert_eq!(tracker.len(), 1);
        tracker.drain().await;
    }
}
