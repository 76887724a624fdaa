// file: src/server/mod.rs
// version: 1.1.0
// guid: 3c8e0a5d-71f2-4b96-a4d3-e26b9f07c184

//! HTTP front end that accepts build tasks

pub mod routes;

pub use routes::{router, AppState, BuildTracker};

use crate::config::ServerConfig;
use crate::error::AgentError;
use crate::pipeline::BuildPipeline;
use crate::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Bind the configured address and serve until `shutdown` resolves
pub async fn serve<F>(config: &ServerConfig, pipeline: Arc<BuildPipeline>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(&config.bind)
        .await
        .map_err(|e| AgentError::network(format!("Failed to bind {}: {}", config.bind, e)))?;
    info!("Listening on {}", config.bind);

    serve_on(listener, AppState::new(pipeline, config.max_body_bytes), shutdown).await
}

/// Serve on an already bound listener.
///
/// After `shutdown` resolves, open connections are drained and then every
/// build still running is awaited, so no deploy is cut off half way.
pub async fn serve_on<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let builds = state.builds();

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    if !builds.is_empty() {
        info!("Waiting for {} running build(s) to finish", builds.len());
    }
    builds.drain().await;

    info!("Server stopped");
    Ok(())
}
