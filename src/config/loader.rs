// file: src/config/loader.rs
// version: 2.1.0
// guid: d4e5f6g7-h8i9-0123-4567-890123defghi

//! Configuration file loading and environment variable substitution

use super::AgentConfig;
use crate::Result;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
    env_vars: HashMap<String, String>,
}

impl ConfigLoader {
    /// Create a new config loader from the process environment
    pub fn new() -> Self {
        Self {
            env_vars: std::env::vars().collect(),
        }
    }

    /// Create a loader that sees only the given variables
    pub fn with_env(env_vars: HashMap<String, String>) -> Self {
        Self { env_vars }
    }

    /// Load agent configuration from a YAML file
    pub fn load_agent_config<P: AsRef<Path>>(&self, path: P) -> Result<AgentConfig> {
        let content = fs::read_to_string(&path).map_err(|e| {
            crate::error::AgentError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let expanded = self.expand_env_vars(&content)?;
        let config: AgentConfig = serde_yaml::from_str(&expanded)?;
        config.provision.validate()?;

        Ok(config)
    }

    /// Resolve the effective configuration: file (if any), then environment
    pub fn resolve(&self, path: Option<&Path>) -> Result<AgentConfig> {
        let mut config = match path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                self.load_agent_config(path)?
            }
            None => AgentConfig::default(),
        };

        self.apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Overlay well-known environment variables onto a configuration
    pub fn apply_env_overrides(&self, config: &mut AgentConfig) {
        if let Some(value) = self.non_empty("GITHUB_USERNAME") {
            config.github_username = Some(value);
        }
        if let Some(value) = self.non_empty("GEMINI_API_KEY") {
            config.gemini.api_key = Some(value);
        }
        if let Some(value) = self.non_empty("GEMINI_MODEL") {
            config.gemini.model = value;
        }
        if let Some(value) = self.non_empty("APP_SECRET") {
            config.app_secret = Some(value);
        }
        if let Some(value) = self.non_empty("PAGES_AGENT_OUTPUT_DIR") {
            config.output_dir = value;
        }
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.env_vars
            .get(key)
            .filter(|value| !value.is_empty())
            .cloned()
    }

    /// Expand environment variables in configuration content
    fn expand_env_vars(&self, content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| {
            crate::error::AgentError::ConfigError(format!("Invalid regex pattern: {}", e))
        })?;

        let mut result = content.to_string();
        let mut missing_vars = Vec::new();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];

            if let Some(value) = self.env_vars.get(var_name) {
                result = result.replace(placeholder, value);
            } else if !missing_vars.iter().any(|v| v == var_name) {
                missing_vars.push(var_name.to_string());
            }
        }

        if !missing_vars.is_empty() {
            return Err(crate::error::AgentError::ConfigError(format!(
                "Missing environment variables: {}",
                missing_vars.join(", ")
            )));
        }

        Ok(result)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GhInstallMethod;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_env_var_expansion() {
        let loader = ConfigLoader::with_env(HashMap::from([(
            "TEST_VAR".to_string(),
            "test_value".to_string(),
        )]));

        let content = "key: ${TEST_VAR}";
        let result = loader.expand_env_vars(content).unwrap();
        assert_eq!(result, "key: test_value");
    }

    #[test]
    fn test_missing_env_var() {
        let loader = ConfigLoader::with_env(HashMap::new());
        let content = "key: ${MISSING_VAR}\nother: ${MISSING_VAR}";

        let result = loader.expand_env_vars(content);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("Missing environment variables: MISSING_VAR"));
        assert_eq!(message.matches("MISSING_VAR").count(), 1);
    }

    #[test]
    fn test_load_agent_config() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
github_username: ${{GH_USER}}
app_secret: hunter2
output_dir: /srv/pages
gemini:
  api_key: ${{KEY}}
  model: gemini-2.5-pro
provision:
  manifest: package.json
  gh_method: package
  gh_version: "2.40.1"
  gh_release_url: https://mirror.example.com/gh/
"#
        )
        .unwrap();

        let mut env = HashMap::new();
        env.insert("GH_USER".to_string(), "octocat".to_string());
        env.insert("KEY".to_string(), "abc123".to_string());
        let loader = ConfigLoader::with_env(env);

        let config = loader.load_agent_config(file.path())?;

        assert_eq!(config.github_username.as_deref(), Some("octocat"));
        assert_eq!(config.gemini.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.gemini.model, "gemini-2.5-pro");
        assert_eq!(config.output_dir, "/srv/pages");
        assert_eq!(config.provision.gh_method, GhInstallMethod::Package);
        assert_eq!(config.provision.gh_version, "2.40.1");
        assert_eq!(
            config.provision.gh_release_url,
            "https://mirror.example.com/gh/"
        );
        // Unset sections keep their defaults
        assert_eq!(config.notification.max_attempts, 3);
        assert_eq!(config.server.bind, "0.0.0.0:8000");
        assert_eq!(config.server.max_body_bytes, 32 * 1024 * 1024);

        Ok(())
    }

    #[test]
    fn test_resolve_applies_env_overrides() -> Result<()> {
        let mut env = HashMap::new();
        env.insert("GITHUB_USERNAME".to_string(), "octocat".to_string());
        env.insert("GEMINI_API_KEY".to_string(), "from-env".to_string());
        env.insert("APP_SECRET".to_string(), String::new());
        let loader = ConfigLoader::with_env(env);

        let config = loader.resolve(None)?;

        assert_eq!(config.github_username.as_deref(), Some("octocat"));
        assert_eq!(config.gemini.api_key.as_deref(), Some("from-env"));
        assert!(config.app_secret.is_none());
        Ok(())
    }

    #[test]
    fn test_missing_config_file() {
        let loader = ConfigLoader::with_env(HashMap::new());
        let err = loader
            .load_agent_config("/nonexistent/pages-agent.yaml")
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
