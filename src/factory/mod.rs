use crate::types::{Agent, AssignedTask, TeamMember};

/// Derives execution-time agents and tasks from roster entries.
pub struct AgentFactory;

impl AgentFactory {
    pub fn create(member: &TeamMember) -> Agent {
        Agent {
            role: member.role.clone(),
            name: member.name.clone(),
            goal: Self::goal_for(&member.role),
            backstory: Self::backstory_for(member),
            tools: member.tools.clone(),
        }
    }

    pub fn tasks_for(agent: &Agent, tasks: &[String]) -> Vec<AssignedTask> {
        tasks
            .iter()
            .map(|description| AssignedTask::new(agent.role.clone(), description.clone()))
            .collect()
    }

    fn goal_for(role: &str) -> String {
        format!("Successfully complete all assigned tasks for the {} role", role)
    }

    fn backstory_for(member: &TeamMember) -> String {
        format!(
            "{}. My objectives are: {}",
            member.description,
            member.objectives.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolKind;

    fn member() -> TeamMember {
        TeamMember::new(
            "QA Engineer",
            "Sam",
            "Guards release quality",
            vec!["Automate regression".to_string(), "Track defects".to_string()],
            vec![ToolKind::Postman, ToolKind::PythonSdk],
        )
    }

    #[test]
    fn test_create_agent() {
        let agent = AgentFactory::create(&member());
        assert_eq!(agent.role, "QA Engineer");
        assert_eq!(agent.name, "Sam");
        assert_eq!(
            agent.goal,
            "Successfully complete all assigned tasks for the QA Engineer role"
        );
        assert_eq!(
            agent.backstory,
            "Guards release quality. My objectives are: Automate regression, Track defects"
        );
        assert!(agent.has_tool(ToolKind::Postman));
        assert!(!agent.has_tool(ToolKind::Cursor));
    }

    #[test]
    fn test_tasks_for_agent() {
        let agent = AgentFactory::create(&member());
        let tasks = AgentFactory::tasks_for(&agent, &["Write smoke tests".to_string()]);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].role, "QA Engineer");
        assert_eq!(tasks[0].expected_output, "Complete the task: Write smoke tests");
    }
}
