use std::collections::HashSet;
use std::path::Path;

use super::schema::MemberDefinition;
use crate::error::{SowError, SowResult};
use crate::types::{TaskSet, TeamMember};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamFormat {
    Json,
    Yaml,
}

impl TeamFormat {
    pub fn from_path(path: &Path) -> SowResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(TeamFormat::Json),
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Ok(TeamFormat::Yaml)
            }
            _ => Err(SowError::Configuration(format!(
                "unsupported team file format: {} (expected .json, .yaml or .yml)",
                path.display()
            ))),
        }
    }
}

/// Team roster loaded from configuration. Roster order is preserved and is
/// the order used for task sets, agents and execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRegistry {
    members: Vec<TeamMember>,
}

impl TeamRegistry {
    pub fn load(path: &Path) -> SowResult<Self> {
        if !path.exists() {
            return Err(SowError::Configuration(format!(
                "team file not found: {}",
                path.display()
            )));
        }
        let format = TeamFormat::from_path(path)?;
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SowError::Configuration(format!("cannot read team file {}: {}", path.display(), e))
        })?;

        let registry = Self::parse(&raw, format)?;
        log::info!(
            "Loaded {} team members from {}",
            registry.members.len(),
            path.display()
        );
        Ok(registry)
    }

    pub fn parse(raw: &str, format: TeamFormat) -> SowResult<Self> {
        let definitions: Vec<MemberDefinition> = match format {
            TeamFormat::Json => serde_json::from_str(raw)
                .map_err(|e| SowError::Configuration(format!("malformed team JSON: {}", e)))?,
            TeamFormat::Yaml => serde_yaml::from_str(raw)
                .map_err(|e| SowError::Configuration(format!("malformed team YAML: {}", e)))?,
        };
        Self::from_definitions(definitions)
    }

    pub fn from_definitions(definitions: Vec<MemberDefinition>) -> SowResult<Self> {
        let members = definitions
            .into_iter()
            .enumerate()
            .map(|(index, definition)| definition.into_member(index))
            .collect::<SowResult<Vec<_>>>()?;
        Self::from_members(members)
    }

    /// Builds a roster from already-resolved members. Roles must be unique.
    pub fn from_members(members: Vec<TeamMember>) -> SowResult<Self> {
        if members.is_empty() {
            return Err(SowError::Configuration(
                "team configuration has no members".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for member in &members {
            if !seen.insert(member.role.as_str()) {
                return Err(SowError::Configuration(format!(
                    "duplicate role in team configuration: {}",
                    member.role
                )));
            }
        }

        Ok(Self { members })
    }

    pub fn members(&self) -> &[TeamMember] {
        &self.members
    }

    pub fn member(&self, role: &str) -> Option<&TeamMember> {
        self.members.iter().find(|m| m.role == role)
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.role.as_str())
    }

    /// Copies each role's generated tasks onto its member.
    pub fn attach_tasks(&mut self, tasks: &TaskSet) {
        for member in &mut self.members {
            member.tasks = tasks.get(&member.role).map(<[String]>::to_vec).unwrap_or_default();
        }
    }

    pub fn into_members(self) -> Vec<TeamMember> {
        self.members
    }
}
