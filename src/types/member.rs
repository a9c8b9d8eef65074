use serde::{Deserialize, Serialize};

use crate::tools::ToolKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub role: String,
    pub name: String,
    pub description: String,
    pub objectives: Vec<String>,
    pub tools: Vec<ToolKind>,
    /// Filled in after task generation
    #[serde(default)]
    pub tasks: Vec<String>,
}

impl TeamMember {
    pub fn new(
        role: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        objectives: Vec<String>,
        tools: Vec<ToolKind>,
    ) -> Self {
        Self {
            role: role.into(),
            name: name.into(),
            description: description.into(),
            objectives,
            tools,
            tasks: Vec::new(),
        }
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.as_str()).collect()
    }

    /// Role block embedded in generation prompts.
    pub fn prompt_profile(&self) -> String {
        format!(
            "Role: {}\nName: {}\nDescription: {}\nObjectives: {}\nTools: {}\n",
            self.role,
            self.name,
            self.description,
            self.objectives.join(", "),
            self.tool_names().join(", ")
        )
    }
}
