use serde::{Deserialize, Serialize};

use crate::tools::ToolKind;

/// Execution-time view of a team member. Built once per run by the factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub role: String,
    pub name: String,
    pub goal: String,
    pub backstory: String,
    pub tools: Vec<ToolKind>,
}

impl Agent {
    pub fn has_tool(&self, tool: ToolKind) -> bool {
        self.tools.contains(&tool)
    }
}
