pub mod agent;
pub mod event;
pub mod member;
pub mod record;
pub mod role_map;
pub mod task;

pub use agent::Agent;
pub use event::{HaltReason, ProgressEvent, ProgressKind};
pub use member::TeamMember;
pub use record::{AgentSummary, RunRecord};
pub use role_map::RoleMap;
pub use task::{AssignedTask, RoleTasks, TaskSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RunId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Waiting,   // No agent yet, or reset after a halt
    Ready,     // Agent constructed
    Working,   // At least one task assigned
    Completed, // Terminal
    Failed,    // Terminal
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ExecutionStatus::Waiting => "Waiting",
            ExecutionStatus::Ready => "Ready",
            ExecutionStatus::Working => "Working",
            ExecutionStatus::Completed => "Completed",
            ExecutionStatus::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}
