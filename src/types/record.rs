use serde::{Deserialize, Serialize};

use super::{Agent, RoleMap, TaskSet};

/// Persisted outcome of a run. Field names are the compatibility contract.
/// Each agent's `name` carries the member's display name rather than the
/// role; records that store the role there still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub agents: RoleMap<AgentSummary>,
    pub tasks: TaskSet,
    pub execution_result: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSummary {
    /// Display name of the team member (the role is the map key)
    pub name: String,
    pub goal: String,
    pub backstory: String,
    pub tools: Vec<String>,
    pub assigned_task_count: usize,
}

impl AgentSummary {
    pub fn from_agent(agent: &Agent, assigned_task_count: usize) -> Self {
        Self {
            name: agent.name.clone(),
            goal: agent.goal.clone(),
            backstory: agent.backstory.clone(),
            tools: agent.tools.iter().map(|t| t.as_str().to_string()).collect(),
            assigned_task_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolKind;

    #[test]
    fn test_record_field_names() {
        let agent = Agent {
            role: "Backend Developer".to_string(),
            name: "Dana".to_string(),
            goal: "goal".to_string(),
            backstory: "story".to_string(),
            tools: vec![ToolKind::PythonSdk],
        };
        let mut agents = RoleMap::new();
        agents.insert("Backend Developer", AgentSummary::from_agent(&agent, 2));

        let record = RunRecord {
            agents,
            tasks: TaskSet::for_roles(["Backend Developer"]),
            execution_result: "done".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        let summary = &json["agents"]["Backend Developer"];
        assert_eq!(summary["name"], "Dana");
        assert_eq!(summary["tools"][0], "Python SDK");
        assert_eq!(summary["assigned_task_count"], 2);
        assert!(json["tasks"]["Backend Developer"].is_array());
        assert_eq!(json["execution_result"], "done");
    }

    #[test]
    fn test_record_with_role_as_name_loads() {
        let raw = r#"{
            "agents": {"QA Engineer": {"name": "QA Engineer", "goal": "g", "backstory": "b",
                                       "tools": ["Cursor"], "assigned_task_count": 1}},
            "tasks": {"QA Engineer": ["t"]},
            "execution_result": "ok"
        }"#;
        let record: RunRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.agents.get("QA Engineer").unwrap().name, "QA Engineer");
    }
}
