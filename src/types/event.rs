use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    Stopped,
    Failed,
}

/// Typed progress vocabulary emitted by the coordinator. Display layers map
/// these to status transitions directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressKind {
    AgentCreated {
        role: String,
        name: String,
        task_count: usize,
    },
    TaskAssigned {
        role: String,
        task: String,
    },
    TaskCompleted {
        role: String,
        task: String,
    },
    TaskFailed {
        role: String,
        task: String,
        error: String,
    },
    RunCompleted {
        result: String,
    },
    RunHalted {
        reason: HaltReason,
    },
}

impl ProgressKind {
    pub fn role(&self) -> Option<&str> {
        match self {
            ProgressKind::AgentCreated { role, .. }
            | ProgressKind::TaskAssigned { role, .. }
            | ProgressKind::TaskCompleted { role, .. }
            | ProgressKind::TaskFailed { role, .. } => Some(role),
            ProgressKind::RunCompleted { .. } | ProgressKind::RunHalted { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProgressKind::AgentCreated { .. } => "AgentCreated",
            ProgressKind::TaskAssigned { .. } => "TaskAssigned",
            ProgressKind::TaskCompleted { .. } => "TaskCompleted",
            ProgressKind::TaskFailed { .. } => "TaskFailed",
            ProgressKind::RunCompleted { .. } => "RunCompleted",
            ProgressKind::RunHalted { .. } => "RunHalted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(flatten)]
    pub kind: ProgressKind,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn now(kind: ProgressKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let event = ProgressEvent::now(ProgressKind::TaskAssigned {
            role: "QA Engineer".to_string(),
            task: "Write regression suite".to_string(),
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TaskAssigned");
        assert_eq!(json["role"], "QA Engineer");
        assert_eq!(json["task"], "Write regression suite");
        assert!(json["timestamp"].is_string());

        let back: ProgressEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_run_events_have_no_role() {
        let kind = ProgressKind::RunHalted {
            reason: HaltReason::Stopped,
        };
        assert_eq!(kind.role(), None);
        assert_eq!(kind.name(), "RunHalted");
    }
}
