// file: src/executor.rs
// version: 3.1.0
// guid: bb371682-35cb-4f34-b318-8bf69ec125bd

//! Command execution for provisioning and git/gh workflows
//!
//! Commands are described as program + argument vectors and never go through
//! a shell, so task-supplied names cannot inject extra commands.

use crate::error::AgentError;
use crate::Result;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error};

/// A command to run: program, arguments, working directory and extra env
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Human-readable command line for logs and errors
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    fn into_error(self, spec: &CommandSpec) -> AgentError {
        AgentError::ProcessError {
            command: spec.display(),
            exit_code: self.exit_code,
            stderr: if self.stderr.trim().is_empty() {
                self.stdout
            } else {
                self.stderr
            },
        }
    }
}

/// Trait for executing commands on the local host
#[async_trait::async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a command to completion; a non-zero exit is not an error here
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;

    /// Run a command, failing on a non-zero exit
    async fn execute(&self, spec: &CommandSpec) -> Result<()> {
        self.execute_with_output(spec).await.map(|_| ())
    }

    /// Run a command and return its stdout, failing on a non-zero exit
    async fn execute_with_output(&self, spec: &CommandSpec) -> Result<String> {
        let output = self.run(spec).await?;

        if !output.success() {
            error!(
                "Command '{}' failed with exit code {:?}",
                spec.display(),
                output.exit_code
            );
            if !output.stderr.trim().is_empty() {
                error!("STDERR: {}", output.stderr.trim());
            }
            return Err(output.into_error(spec));
        }

        Ok(output.stdout)
    }
}

/// Executor that spawns real processes
#[derive(Debug, Clone, Default)]
pub struct LocalExecutor {
    timeout: Option<Duration>,
}

impl LocalExecutor {
    /// Create a new local executor without a time limit
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// Kill commands that run longer than `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

#[async_trait::async_trait]
impl CommandExecutor for LocalExecutor {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!("Executing local command: {}", spec.display());

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &spec.env {
            command.env(key, value);
        }

        let child = command.spawn().map_err(|e| AgentError::ProcessError {
            command: spec.display(),
            exit_code: None,
            stderr: format!("Failed to execute command: {}", e),
        })?;

        let waited = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| AgentError::ProcessError {
                    command: spec.display(),
                    exit_code: None,
                    stderr: format!("Timed out after {} seconds", limit.as_secs()),
                })?,
            None => child.wait_with_output().await,
        };

        let output = waited.map_err(|e| AgentError::ProcessError {
            command: spec.display(),
            exit_code: None,
            stderr: format!("Failed to wait for command: {}", e),
        })?;

        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        debug!(
            "Command '{}' finished with exit code {:?}",
            spec.display(),
            result.exit_code
        );
        Ok(result)
    }
}
