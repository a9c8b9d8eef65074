use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::engine::context::RunContext;
use crate::error::{SowError, SowResult};
use crate::types::{Agent, AssignedTask, HaltReason, ProgressKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Process {
    #[default]
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub role: String,
    pub description: String,
    pub output: String,
}

/// Runs one assigned task for an agent. `prior_outputs` holds every earlier
/// task's output in the run, oldest first.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(
        &self,
        agent: &Agent,
        task: &AssignedTask,
        prior_outputs: &[TaskOutput],
    ) -> Result<String>;
}

/// Sequential driver over an ordered agent and task list.
pub struct Crew<'a> {
    agents: &'a [Agent],
    tasks: &'a [AssignedTask],
    process: Process,
    executor: &'a dyn TaskExecutor,
}

impl<'a> Crew<'a> {
    pub fn new(
        agents: &'a [Agent],
        tasks: &'a [AssignedTask],
        process: Process,
        executor: &'a dyn TaskExecutor,
    ) -> Self {
        Self {
            agents,
            tasks,
            process,
            executor,
        }
    }

    /// Executes every task in order and returns the last task's output.
    pub async fn kickoff(&self, ctx: &RunContext) -> SowResult<String> {
        log::debug!(
            "Crew kickoff: {:?} process, {} agents, {} tasks",
            self.process,
            self.agents.len(),
            self.tasks.len()
        );
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());

        for task in self.tasks {
            if ctx.is_stopped() {
                ctx.emit(ProgressKind::RunHalted {
                    reason: HaltReason::Stopped,
                })?;
                return Err(SowError::Cancelled);
            }

            let agent = self
                .agents
                .iter()
                .find(|a| a.role == task.role)
                .ok_or_else(|| SowError::UnknownRole(task.role.clone()))?;

            ctx.emit(ProgressKind::TaskAssigned {
                role: agent.role.clone(),
                task: task.description.clone(),
            })?;

            match self.executor.execute(agent, task, &outputs).await {
                Ok(output) => {
                    ctx.emit(ProgressKind::TaskCompleted {
                        role: agent.role.clone(),
                        task: task.description.clone(),
                    })?;
                    outputs.push(TaskOutput {
                        role: agent.role.clone(),
                        description: task.description.clone(),
                        output,
                    });
                }
                Err(e) => {
                    let reason = format!("{:#}", e);
                    ctx.emit(ProgressKind::TaskFailed {
                        role: agent.role.clone(),
                        task: task.description.clone(),
                        error: reason.clone(),
                    })?;
                    ctx.emit(ProgressKind::RunHalted {
                        reason: HaltReason::Failed,
                    })?;
                    return Err(SowError::ExecutionEngine {
                        role: agent.role.clone(),
                        task: task.description.clone(),
                        reason,
                    });
                }
            }
        }

        let result = outputs.pop().map(|o| o.output).unwrap_or_default();
        ctx.emit(ProgressKind::RunCompleted {
            result: result.clone(),
        })?;
        Ok(result)
    }
}
