use serde::{Deserialize, Serialize};

use crate::types::{RoleTasks, TaskSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupePolicy {
    /// Keep the first occurrence of each task, in discovery order
    #[default]
    PreserveOrder,
    /// Set semantics; output sorted for determinism
    Unordered,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskAggregator {
    policy: DedupePolicy,
}

impl TaskAggregator {
    pub fn new(policy: DedupePolicy) -> Self {
        Self { policy }
    }

    /// Appends incoming tasks to their role, skipping any task the role
    /// already holds. Roles the set does not know are dropped.
    pub fn merge(&self, mut existing: TaskSet, incoming: RoleTasks) -> TaskSet {
        for (role, tasks) in incoming {
            let Some(current) = existing.get_mut(&role) else {
                log::debug!("Ignoring {} tasks for unknown role {}", tasks.len(), role);
                continue;
            };
            for task in tasks {
                if !current.contains(&task) {
                    current.push(task);
                }
            }
        }
        existing
    }

    /// Appends without deduplicating; pair with [`TaskAggregator::finalize`].
    pub fn collect(&self, mut existing: TaskSet, incoming: RoleTasks) -> TaskSet {
        for (role, tasks) in incoming {
            match existing.get_mut(&role) {
                Some(current) => current.extend(tasks),
                None => log::debug!("Ignoring {} tasks for unknown role {}", tasks.len(), role),
            }
        }
        existing
    }

    pub fn finalize(&self, mut tasks: TaskSet) -> TaskSet {
        match self.policy {
            DedupePolicy::PreserveOrder => {
                tasks.dedupe();
            }
            DedupePolicy::Unordered => {
                for (_, list) in tasks.iter_mut() {
                    list.sort();
                    list.dedup();
                }
            }
        }
        tasks
    }
}
