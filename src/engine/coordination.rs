use serde::Serialize;

use crate::engine::context::RunContext;
use crate::engine::crew::{Crew, Process, TaskExecutor};
use crate::error::SowResult;
use crate::factory::AgentFactory;
use crate::types::{Agent, AgentSummary, AssignedTask, ProgressKind, RoleMap, RunRecord, TaskSet, TeamMember};

/// Agents and their tasks, in roster order, ready for a crew.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionPlan {
    pub agents: Vec<Agent>,
    pub tasks: Vec<AssignedTask>,
    pub process: Process,
}

impl ExecutionPlan {
    pub fn agent(&self, role: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.role == role)
    }

    pub fn tasks_for<'a>(&'a self, role: &'a str) -> impl Iterator<Item = &'a AssignedTask> + 'a {
        self.tasks.iter().filter(move |t| t.role == role)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

pub struct AssignmentCoordinator;

impl AssignmentCoordinator {
    /// One agent per roster role that has tasks; roles without tasks are skipped.
    pub fn assign(members: &[TeamMember], tasks: &TaskSet) -> ExecutionPlan {
        let mut agents = Vec::new();
        let mut assigned = Vec::new();

        for member in members {
            let role_tasks = match tasks.get(&member.role) {
                Some(list) if !list.is_empty() => list,
                _ => {
                    log::debug!("No tasks for {}, skipping agent", member.role);
                    continue;
                }
            };

            let agent = AgentFactory::create(member);
            assigned.extend(AgentFactory::tasks_for(&agent, role_tasks));
            agents.push(agent);
        }

        ExecutionPlan {
            agents,
            tasks: assigned,
            process: Process::Sequential,
        }
    }

    /// Builds the plan, announces each agent, runs the crew and assembles the
    /// record. The context is reset first so every run starts from Waiting.
    pub async fn run_team(
        members: &[TeamMember],
        tasks: &TaskSet,
        executor: &dyn TaskExecutor,
        ctx: &RunContext,
    ) -> SowResult<RunRecord> {
        ctx.reset();
        let plan = Self::assign(members, tasks);
        log::info!(
            "Starting sequential run with {} agents and {} tasks",
            plan.agents.len(),
            plan.tasks.len()
        );

        for agent in &plan.agents {
            ctx.emit(ProgressKind::AgentCreated {
                role: agent.role.clone(),
                name: agent.name.clone(),
                task_count: plan.tasks_for(&agent.role).count(),
            })?;
        }

        let crew = Crew::new(&plan.agents, &plan.tasks, plan.process, executor);
        let execution_result = crew.kickoff(ctx).await?;

        Ok(Self::record(&plan, tasks, execution_result))
    }

    pub fn record(plan: &ExecutionPlan, tasks: &TaskSet, execution_result: String) -> RunRecord {
        let agents: RoleMap<AgentSummary> = plan
            .agents
            .iter()
            .map(|agent| {
                let count = plan.tasks_for(&agent.role).count();
                (agent.role.clone(), AgentSummary::from_agent(agent, count))
            })
            .collect();

        RunRecord {
            agents,
            tasks: tasks.clone(),
            execution_result,
        }
    }
}
