// file: src/security/validation.rs
// version: 2.1.0
// guid: r8s9t0u1-v2w3-4567-8901-234567rstuvw

//! Input validation utilities
//!
//! Task names become directory names and command arguments, so they are
//! checked here before anything touches the filesystem or spawns `git`/`gh`.

use crate::Result;
use url::Url;

/// Utility functions for input validation
pub struct ValidationUtils;

impl ValidationUtils {
    /// Validate a GitHub repository name
    pub fn validate_repo_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(crate::error::AgentError::ValidationError(
                "Repository name cannot be empty".to_string(),
            ));
        }

        if name.len() > 100 {
            return Err(crate::error::AgentError::ValidationError(
                "Repository name cannot exceed 100 characters".to_string(),
            ));
        }

        if name == "." || name == ".." {
            return Err(crate::error::AgentError::ValidationError(format!(
                "Repository name '{}' is reserved",
                name
            )));
        }

        // `gh repo create <name>` would read a leading hyphen as a flag
        if name.starts_with('-') {
            return Err(crate::error::AgentError::ValidationError(format!(
                "Repository name '{}' cannot start with a hyphen",
                name
            )));
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(crate::error::AgentError::ValidationError(format!(
                "Repository name '{}' contains invalid characters",
                name
            )));
        }

        Ok(())
    }

    /// Validate a GitHub account name
    pub fn validate_github_username(username: &str) -> Result<()> {
        if username.is_empty() || username.len() > 39 {
            return Err(crate::error::AgentError::ValidationError(
                "GitHub username must be 1-39 characters".to_string(),
            ));
        }

        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(crate::error::AgentError::ValidationError(format!(
                "GitHub username '{}' contains invalid characters",
                username
            )));
        }

        if username.starts_with('-') || username.ends_with('-') {
            return Err(crate::error::AgentError::ValidationError(
                "GitHub username cannot start or end with hyphen".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate a notification target URL (http or https only)
    pub fn validate_callback_url(raw: &str) -> Result<Url> {
        let url = Url::parse(raw).map_err(|e| {
            crate::error::AgentError::ValidationError(format!(
                "Invalid evaluation URL '{}': {}",
                raw, e
            ))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(crate::error::AgentError::ValidationError(format!(
                "Unsupported evaluation URL scheme: {}",
                other
            ))),
        }
    }

    /// Compare two secrets without short-circuiting on the first difference
    pub fn secrets_match(expected: &str, provided: &str) -> bool {
        let expected = expected.as_bytes();
        let provided = provided.as_bytes();

        if expected.len() != provided.len() {
            return false;
        }

        expected
            .iter()
            .zip(provided)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}
