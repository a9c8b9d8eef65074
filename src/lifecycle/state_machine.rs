use serde::{Deserialize, Serialize};

use crate::error::{SowError, SowResult};
use crate::types::{ExecutionStatus, ProgressKind, RoleMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleStatus {
    pub status: ExecutionStatus,
    pub current_task: Option<String>,
    pub completed_tasks: usize,
    pub total_tasks: usize,
}

impl Default for RoleStatus {
    fn default() -> Self {
        Self {
            status: ExecutionStatus::Waiting,
            current_task: None,
            completed_tasks: 0,
            total_tasks: 0,
        }
    }
}

/// Per-role execution status, in roster order. Only typed progress events
/// move a role between states.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusBoard {
    roles: RoleMap<RoleStatus>,
}

impl StatusBoard {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles
                .into_iter()
                .map(|r| (r.into(), RoleStatus::default()))
                .collect(),
        }
    }

    pub fn get(&self, role: &str) -> Option<&RoleStatus> {
        self.roles.get(role)
    }

    pub fn status(&self, role: &str) -> Option<ExecutionStatus> {
        self.roles.get(role).map(|s| s.status)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RoleStatus)> {
        self.roles.iter()
    }

    pub fn reset(&mut self) {
        for (_, status) in self.roles.iter_mut() {
            *status = RoleStatus::default();
        }
    }

    /// Applies one event. A rejected event leaves the board untouched.
    pub fn apply(&mut self, event: &ProgressKind) -> SowResult<()> {
        match event {
            ProgressKind::RunCompleted { .. } => Ok(()),
            ProgressKind::RunHalted { .. } => {
                for (_, role) in self.roles.iter_mut() {
                    match role.status {
                        ExecutionStatus::Ready => role.status = ExecutionStatus::Waiting,
                        // Partly done: idle again, finished count kept
                        ExecutionStatus::Working => {
                            role.status = ExecutionStatus::Ready;
                            role.current_task = None;
                        }
                        _ => {}
                    }
                }
                Ok(())
            }
            ProgressKind::AgentCreated {
                role, task_count, ..
            } => {
                let current = self.role_mut(role, event)?;
                match current.status {
                    ExecutionStatus::Waiting => {
                        current.status = ExecutionStatus::Ready;
                        current.total_tasks = *task_count;
                        current.completed_tasks = 0;
                        Ok(())
                    }
                    state => Err(invalid(role, state, event)),
                }
            }
            ProgressKind::TaskAssigned { role, task } => {
                let current = self.role_mut(role, event)?;
                match current.status {
                    ExecutionStatus::Ready | ExecutionStatus::Working => {
                        current.status = ExecutionStatus::Working;
                        current.current_task = Some(task.clone());
                        Ok(())
                    }
                    state => Err(invalid(role, state, event)),
                }
            }
            ProgressKind::TaskCompleted { role, .. } => {
                let current = self.role_mut(role, event)?;
                match current.status {
                    ExecutionStatus::Working => {
                        current.completed_tasks += 1;
                        current.current_task = None;
                        if current.completed_tasks >= current.total_tasks {
                            current.status = ExecutionStatus::Completed;
                        }
                        Ok(())
                    }
                    state => Err(invalid(role, state, event)),
                }
            }
            ProgressKind::TaskFailed { role, .. } => {
                let current = self.role_mut(role, event)?;
                match current.status {
                    ExecutionStatus::Ready | ExecutionStatus::Working => {
                        current.status = ExecutionStatus::Failed;
                        current.current_task = None;
                        Ok(())
                    }
                    state => Err(invalid(role, state, event)),
                }
            }
        }
    }

    fn role_mut(&mut self, role: &str, event: &ProgressKind) -> SowResult<&mut RoleStatus> {
        let current = self
            .roles
            .get_mut(role)
            .ok_or_else(|| SowError::UnknownRole(role.to_string()))?;
        if current.status.is_terminal() {
            return Err(invalid(role, current.status, event));
        }
        Ok(current)
    }
}

fn invalid(role: &str, state: ExecutionStatus, event: &ProgressKind) -> SowError {
    SowError::InvalidTransition {
        role: role.to_string(),
        state,
        event: event.name(),
    }
}
