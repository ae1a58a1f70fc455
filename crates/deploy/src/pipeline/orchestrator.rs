//! Runs a scenario step by step, threading each step's outputs into later steps.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::{Bindable, DeploymentStep, Operation, PipelineContext, Scenario, StepKind, StepResult};
use crate::{
    DeployError,
    chain::ChainClient,
    contracts::{Validate, validate_address},
    executor::DeployContext,
};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    /// Step `step` (0-based) is in flight.
    Running { step: usize },
    Completed,
    /// The run stopped. `step` is `None` when the scenario was rejected before any step ran.
    Aborted { step: Option<usize> },
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::NotStarted => write!(f, "not started"),
            RunState::Running { step } => write!(f, "running step {}", step),
            RunState::Completed => write!(f, "completed"),
            RunState::Aborted { step: Some(step) } => write!(f, "aborted at step {}", step),
            RunState::Aborted { step: None } => write!(f, "aborted before the first step"),
        }
    }
}

/// A completed step and what it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub name: String,
    pub result: StepResult,
}

impl StepRecord {
    pub fn kind(&self) -> StepKind {
        self.result.kind()
    }
}

fn records(ctx: PipelineContext) -> Vec<StepRecord> {
    ctx.into_entries()
        .into_iter()
        .map(|(name, result)| StepRecord { name, result })
        .collect()
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub scenario: String,
    pub steps: Vec<StepRecord>,
}

impl RunReport {
    pub fn get(&self, name: &str) -> Option<&StepResult> {
        self.steps
            .iter()
            .find(|record| record.name == name)
            .map(|record| &record.result)
    }

    pub fn code_id(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(StepResult::code_id)
    }

    pub fn contract_address(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(StepResult::contract_address)
    }
}

/// A run that stopped on its first failure.
///
/// Steps completed before the failure stay on chain. Nothing is rolled back.
#[derive(Debug, thiserror::Error)]
#[error(
    "scenario `{scenario}` aborted {}: {error}",
    position(.step_index, .step_name, .completed)
)]
pub struct RunAborted {
    pub scenario: String,
    pub step_index: Option<usize>,
    pub step_name: Option<String>,
    /// Steps that completed, in order.
    pub completed: Vec<StepRecord>,
    #[source]
    pub error: DeployError,
}

fn position(index: &Option<usize>, name: &Option<String>, completed: &[StepRecord]) -> String {
    match (index, name) {
        (Some(index), Some(name)) => format!(
            "at step {} (`{}`) after {} completed step(s)",
            index,
            name,
            completed.len()
        ),
        _ => "before the first step".to_string(),
    }
}

impl RunAborted {
    /// Name of the last step that completed, if any.
    pub fn last_completed(&self) -> Option<&str> {
        self.completed.last().map(|record| record.name.as_str())
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }
}

/// Drives one scenario run at a time over a shared [`DeployContext`].
///
/// Each run owns a fresh [`PipelineContext`] that is dropped when the run ends.
#[derive(Debug)]
pub struct Orchestrator<'a, C> {
    deploy: &'a DeployContext<C>,
    state: RunState,
}

impl<'a, C: ChainClient> Orchestrator<'a, C> {
    pub fn new(deploy: &'a DeployContext<C>) -> Self {
        Self {
            deploy,
            state: RunState::NotStarted,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Validate the scenario, then run its steps strictly in order.
    ///
    /// The first failing step aborts the run.
    pub async fn run(&mut self, scenario: Scenario) -> Result<RunReport, RunAborted> {
        if let Err(error) = scenario.validate() {
            tracing::error!(scenario = %scenario.name, err = %error, "Scenario rejected");
            self.state = RunState::Aborted { step: None };
            return Err(RunAborted {
                scenario: scenario.name,
                step_index: None,
                step_name: None,
                completed: Vec::new(),
                error,
            });
        }

        let Scenario { name, steps } = scenario;
        let total = steps.len();
        let mut ctx = PipelineContext::default();

        tracing::info!(scenario = %name, steps = total, "Starting scenario...");

        for (index, step) in steps.into_iter().enumerate() {
            self.state = RunState::Running { step: index };
            let step_name = step.name.clone();

            tracing::info!(
                step = index + 1,
                total,
                name = %step_name,
                kind = %step.kind(),
                "{}",
                step.operation.describe()
            );

            let outcome = match self.run_step(step, &ctx).await {
                Ok(result) => ctx.insert(step_name.clone(), result).map_err(|duplicate| {
                    DeployError::InvalidScenario {
                        scenario: name.clone(),
                        reason: format!("duplicate step name `{}`", duplicate),
                    }
                }),
                Err(error) => Err(error),
            };

            if let Err(error) = outcome {
                tracing::error!(
                    scenario = %name,
                    step = %step_name,
                    completed = ctx.len(),
                    last_completed = ?ctx.last(),
                    err = %error,
                    "Scenario aborted"
                );
                self.state = RunState::Aborted { step: Some(index) };
                return Err(RunAborted {
                    scenario: name,
                    step_index: Some(index),
                    step_name: Some(step_name),
                    completed: records(ctx),
                    error,
                });
            }
        }

        self.state = RunState::Completed;
        tracing::info!(scenario = %name, steps = total, "Scenario completed");

        Ok(RunReport {
            scenario: name,
            steps: records(ctx),
        })
    }

    /// Bind, validate and submit one step.
    async fn run_step(
        &self,
        step: DeploymentStep,
        ctx: &PipelineContext,
    ) -> Result<StepResult, DeployError> {
        let DeploymentStep {
            name,
            mut operation,
        } = step;
        operation.bind(&name, ctx)?;

        let executor = self.deploy.executor();

        match operation {
            Operation::Upload { artifact } => executor.upload_code(&artifact).await,
            Operation::Instantiate {
                code_id,
                msg,
                label,
                admin,
            } => {
                let code_id = code_id.into_value(&name)?;
                let admin = admin.map(|admin| admin.into_value(&name)).transpose()?;
                if let Some(admin) = &admin {
                    self.check_address(&name, admin)?;
                }
                let payload = self.payload(&name, &msg)?;
                executor
                    .instantiate(code_id, &payload, label.as_deref(), admin.as_deref())
                    .await
            }
            Operation::Execute {
                contract,
                msg,
                native_amount,
            } => {
                let contract = contract.into_value(&name)?;
                self.check_address(&name, &contract)?;
                let payload = self.payload(&name, &msg)?;
                executor.execute(&contract, &payload, native_amount).await
            }
            Operation::Query { contract, msg } => {
                let contract = contract.into_value(&name)?;
                self.check_address(&name, &contract)?;
                let payload = self.payload(&name, &msg)?;
                let data = executor.query(&contract, &payload).await?;
                Ok(StepResult::Queried { data })
            }
        }
    }

    fn check_address(&self, step: &str, address: &str) -> Result<(), DeployError> {
        validate_address(address, self.deploy.address_prefix()).map_err(|reason| {
            DeployError::InvalidMessage {
                step: step.to_string(),
                reason,
            }
        })
    }

    /// Validate a bound message and turn it into the JSON payload.
    fn payload<M: Validate + Serialize>(&self, step: &str, msg: &M) -> Result<Value, DeployError> {
        msg.validate(self.deploy.address_prefix())
            .map_err(|reason| DeployError::InvalidMessage {
                step: step.to_string(),
                reason,
            })?;

        serde_json::to_value(msg).map_err(|source| DeployError::Payload {
            step: step.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_state_display() {
        assert_eq!(RunState::Running { step: 2 }.to_string(), "running step 2");
        assert_eq!(
            RunState::Aborted { step: None }.to_string(),
            "aborted before the first step"
        );
    }

    #[test]
    fn test_run_aborted_message() {
        let aborted = RunAborted {
            scenario: "bootstrap".to_string(),
            step_index: Some(3),
            step_name: Some("instantiate-collector".to_string()),
            completed: Vec::new(),
            error: DeployError::InvalidFunds {
                contract: "aura1feed".to_string(),
            },
        };

        assert_eq!(
            aborted.to_string(),
            "scenario `bootstrap` aborted at step 3 (`instantiate-collector`) after 0 completed step(s): \
             native amount attached to `aura1feed` must be greater than zero"
        );
        assert_eq!(aborted.last_completed(), None);
    }
}
