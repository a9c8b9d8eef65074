use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

use crate::engine::{ChunkFailure, RunContext};
use crate::types::{RunId, RunRecord, TaskSet, TeamMember};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    Analyzed,
    Executing,
    Completed,
    Failed { error: String },
    Stopped,
}

impl SessionState {
    pub fn is_executing(&self) -> bool {
        matches!(self, SessionState::Executing)
    }
}

/// One analyzed SOW and, once executed, its outcome.
#[derive(Debug)]
pub struct RunSession {
    pub id: RunId,
    pub members: Vec<TeamMember>,
    pub tasks: TaskSet,
    pub chunks: usize,
    pub failures: Vec<ChunkFailure>,
    pub context: Arc<RunContext>,
    pub created_at: DateTime<Utc>,
    state: RwLock<SessionState>,
    record: RwLock<Option<RunRecord>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub id: RunId,
    #[serde(flatten)]
    pub state: SessionState,
    pub roles: usize,
    pub total_tasks: usize,
    pub chunks: usize,
    pub failed_calls: usize,
    pub created_at: DateTime<Utc>,
}

impl RunSession {
    pub fn new(
        members: Vec<TeamMember>,
        tasks: TaskSet,
        chunks: usize,
        failures: Vec<ChunkFailure>,
        context: Arc<RunContext>,
    ) -> Self {
        Self {
            id: context.id(),
            members,
            tasks,
            chunks,
            failures,
            context,
            created_at: Utc::now(),
            state: RwLock::new(SessionState::Analyzed),
            record: RwLock::new(None),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn set_state(&self, state: SessionState) {
        *self.state.write() = state;
    }

    /// Moves to Executing unless a run is already in flight.
    pub fn try_begin_execution(&self) -> bool {
        let mut state = self.state.write();
        if state.is_executing() {
            return false;
        }
        *state = SessionState::Executing;
        *self.record.write() = None;
        self.context.clear_stop();
        true
    }

    pub fn record(&self) -> Option<RunRecord> {
        self.record.read().clone()
    }

    pub fn complete(&self, record: RunRecord) {
        *self.record.write() = Some(record);
        self.set_state(SessionState::Completed);
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            id: self.id,
            state: self.state(),
            roles: self.tasks.role_count(),
            total_tasks: self.tasks.total_tasks(),
            chunks: self.chunks,
            failed_calls: self.failures.len(),
            created_at: self.created_at,
        }
    }
}
