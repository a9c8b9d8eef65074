use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

use super::{RoleMap, TeamMember};

/// Raw tasks for one generation call, keyed by role.
pub type RoleTasks = BTreeMap<String, Vec<String>>;

/// Tasks per role, in roster order. Every known role has an entry, even when
/// no tasks were generated for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskSet(RoleMap<Vec<String>>);

impl TaskSet {
    pub fn for_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(roles.into_iter().map(|r| (r.into(), Vec::new())).collect())
    }

    pub fn from_members(members: &[TeamMember]) -> Self {
        Self::for_roles(members.iter().map(|m| m.role.clone()))
    }

    pub fn get(&self, role: &str) -> Option<&[String]> {
        self.0.get(role).map(|tasks| tasks.as_slice())
    }

    pub fn get_mut(&mut self, role: &str) -> Option<&mut Vec<String>> {
        self.0.get_mut(role)
    }

    pub fn contains_role(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.0.roles()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(role, tasks)| (role, tasks.as_slice()))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Vec<String>)> {
        self.0.iter_mut()
    }

    pub fn role_count(&self) -> usize {
        self.0.len()
    }

    pub fn total_tasks(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// True when no role has a single task.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// Drops repeated tasks within each role, keeping the first occurrence.
    /// Returns how many were removed.
    pub fn dedupe(&mut self) -> usize {
        let mut removed = 0;
        for (_, list) in self.0.iter_mut() {
            let before = list.len();
            let mut seen = HashSet::new();
            list.retain(|task| seen.insert(task.clone()));
            removed += before - list.len();
        }
        removed
    }

    /// Restricts this set to exactly the roster's roles: unknown roles are dropped and
    /// missing roles get an empty list. Used when loading a saved distribution, so
    /// repeated tasks are dropped here as well.
    pub fn aligned_to(mut self, members: &[TeamMember]) -> Self {
        let mut aligned: TaskSet = members
            .iter()
            .map(|m| {
                let tasks = self.0.remove(&m.role).unwrap_or_default();
                (m.role.clone(), tasks)
            })
            .collect::<RoleMap<_>>()
            .into();

        let removed = aligned.dedupe();
        if removed > 0 {
            log::warn!("Dropped {} duplicate tasks from the loaded distribution", removed);
        }
        aligned
    }
}

impl From<RoleMap<Vec<String>>> for TaskSet {
    fn from(map: RoleMap<Vec<String>>) -> Self {
        Self(map)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedTask {
    pub id: Uuid,
    /// Role of the agent this task is bound to
    pub role: String,
    pub description: String,
    pub expected_output: String,
}

impl AssignedTask {
    pub fn new(role: impl Into<String>, description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            id: Uuid::new_v4(),
            role: role.into(),
            expected_output: format!("Complete the task: {}", description),
            description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_roles_starts_empty() {
        let set = TaskSet::for_roles(["Backend Developer", "QA Engineer"]);
        assert_eq!(set.role_count(), 2);
        assert!(set.is_empty());
        assert_eq!(set.get("QA Engineer"), Some(&[][..]));
        assert_eq!(set.get("Designer"), None);
    }

    #[test]
    fn test_serializes_in_roster_order() {
        let mut set = TaskSet::for_roles(["Zed", "Amy"]);
        set.get_mut("Amy").unwrap().push("write tests".to_string());

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"Zed":[],"Amy":["write tests"]}"#);
    }

    #[test]
    fn test_aligned_to_drops_repeated_tasks() {
        let members = vec![
            TeamMember::new("R", "Rae", "d", vec![], vec![]),
            TeamMember::new("S", "Sol", "d", vec![], vec![]),
        ];
        let set: TaskSet = serde_json::from_str(r#"{"R": ["a", "a", "b", "a"], "Ghost": ["x"]}"#).unwrap();

        let aligned = set.aligned_to(&members);
        assert_eq!(aligned.get("R").unwrap(), &["a", "b"]);
        assert_eq!(aligned.get("S"), Some(&[][..]));
        assert!(!aligned.contains_role("Ghost"));
        assert_eq!(aligned.total_tasks(), 2);
    }

    #[test]
    fn test_assigned_task_expected_output() {
        let task = AssignedTask::new("Backend Developer", "Implement login endpoint");
        assert_eq!(task.expected_output, "Complete the task: Implement login endpoint");
        assert_eq!(task.role, "Backend Developer");
    }
}
