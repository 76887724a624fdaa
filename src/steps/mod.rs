// file: src/steps/mod.rs
// version: 2.1.0
// guid: h8i9j0k1-l2m3-4567-8901-bcdef234567

//! Linear, fail-fast step execution
//!
//! Steps run strictly in order. The first step that returns an error stops
//! the run; nothing after it executes and the error is handed back unchanged
//! so its exit code can reach the caller.

use crate::Result;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{error, info};
use uuid::Uuid;

/// Context passed to each step
#[derive(Debug, Clone)]
pub struct StepContext {
    /// Current run ID
    pub session_id: Uuid,

    /// Current step number (1-based)
    pub step_number: usize,

    /// Total number of steps
    pub total_steps: usize,
}

/// Result of executing a step
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Status of the step execution
    pub status: StepStatus,

    /// Human-readable message describing the result
    pub message: String,

    /// Time taken to execute the step
    pub execution_time: Duration,

    /// Additional metadata from the step execution
    pub metadata: HashMap<String, String>,
}

/// Status of a finished step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    /// Step completed successfully
    Completed,
}

/// Trait for provisioning steps
#[async_trait::async_trait]
pub trait ProvisionStep: Send + Sync {
    /// Get the name of this step
    fn name(&self) -> &str;

    /// Get a description of what this step does
    fn description(&self) -> &str;

    /// Execute the step
    async fn execute(&self, context: &StepContext) -> Result<StepResult>;
}

/// Helper for creating successful step results
pub fn success_result(message: impl Into<String>) -> StepResult {
    StepResult {
        status: StepStatus::Completed,
        message: message.into(),
        execution_time: Duration::ZERO,
        metadata: HashMap::new(),
    }
}

/// Helper for creating successful step results with metadata
pub fn success_result_with_metadata(
    message: impl Into<String>,
    metadata: HashMap<String, String>,
) -> StepResult {
    StepResult {
        metadata,
        ..success_result(message)
    }
}

/// Runs a fixed list of steps in order
pub struct StepRunner {
    steps: Vec<Box<dyn ProvisionStep>>,
}

impl StepRunner {
    pub fn new(steps: Vec<Box<dyn ProvisionStep>>) -> Self {
        Self { steps }
    }

    /// Names of the steps in execution order
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Run every step, stopping at the first failure
    pub async fn run_all(&self) -> Result<Vec<StepResult>> {
        let session_id = Uuid::new_v4();
        let total_steps = self.steps.len();
        let mut results = Vec::with_capacity(total_steps);

        for (index, step) in self.steps.iter().enumerate() {
            let context = StepContext {
                session_id,
                step_number: index + 1,
                total_steps,
            };

            info!(
                "[{}/{}] {}: {}",
                context.step_number,
                total_steps,
                step.name(),
                step.description()
            );

            let started = Instant::now();
            match step.execute(&context).await {
                Ok(mut result) => {
                    result.execution_time = started.elapsed();
                    info!(
                        "[{}/{}] {} ({:.1}s)",
                        context.step_number,
                        total_steps,
                        result.message,
                        result.execution_time.as_secs_f64()
                    );
                    results.push(result);
                }
                Err(e) => {
                    error!(
                        "[{}/{}] {} failed: {}",
                        context.step_number,
                        total_steps,
                        step.name(),
                        e
                    );
                    return Err(e);
                }
            }
        }

        Ok(results)
    }
}
