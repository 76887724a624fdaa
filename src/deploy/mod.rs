// file: src/deploy/mod.rs
// version: 1.0.0
// guid: 86f1c4a7-0e3b-4d92-a5f6-7b2e9d03c158

//! Publishing generated apps to GitHub Pages

pub mod github;
pub mod workspace;

pub use github::GitHubPublisher;
pub use workspace::Workspace;

use serde::{Deserialize, Serialize};

/// Where a deployed app ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployInfo {
    pub repo_url: String,
    pub pages_url: String,
    pub commit_sha: String,
}
