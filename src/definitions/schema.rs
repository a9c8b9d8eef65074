use serde::{Deserialize, Serialize};

use crate::error::{SowError, SowResult};
use crate::tools::resolve_tools;
use crate::types::TeamMember;

/// One record of the team configuration file, as written by a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberDefinition {
    // Required, but kept optional here so a missing field can be reported
    // with the record index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub objectives: Vec<String>,

    // Display names, resolved against the tool catalog
    #[serde(default)]
    pub tools: Vec<String>,
}

impl MemberDefinition {
    pub fn new(role: &str, name: &str, description: &str, objectives: &[&str], tools: &[&str]) -> Self {
        Self {
            role: Some(role.to_string()),
            name: Some(name.to_string()),
            description: description.to_string(),
            objectives: objectives.iter().map(|s| s.to_string()).collect(),
            tools: tools.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn into_member(self, index: usize) -> SowResult<TeamMember> {
        let role = required(self.role, "role", index)?;
        let name = required(self.name, "name", index)?;
        let tools = resolve_tools(&self.tools);

        Ok(TeamMember::new(
            role,
            name,
            self.description,
            self.objectives,
            tools,
        ))
    }
}

fn required(value: Option<String>, field: &str, index: usize) -> SowResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(SowError::Configuration(format!(
            "team member #{} is missing required field '{}'",
            index + 1,
            field
        ))),
    }
}
