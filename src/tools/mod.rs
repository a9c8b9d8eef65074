use serde::{Deserialize, Serialize};

/// Closed catalog of tools a team member can be configured with. Tool use is
/// simulated: invoking one only reports what it would have been used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolKind {
    #[serde(rename = "Cursor")]
    Cursor,
    #[serde(rename = "GitHub")]
    GitHub,
    #[serde(rename = "Postman")]
    Postman,
    #[serde(rename = "Python SDK")]
    PythonSdk,
    #[serde(rename = "Node.js SDK")]
    NodeSdk,
}

impl ToolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::Cursor => "Cursor",
            ToolKind::GitHub => "GitHub",
            ToolKind::Postman => "Postman",
            ToolKind::PythonSdk => "Python SDK",
            ToolKind::NodeSdk => "Node.js SDK",
        }
    }

    /// Exact, case-sensitive lookup by display name.
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "Cursor" => Some(ToolKind::Cursor),
            "GitHub" => Some(ToolKind::GitHub),
            "Postman" => Some(ToolKind::Postman),
            "Python SDK" => Some(ToolKind::PythonSdk),
            "Node.js SDK" => Some(ToolKind::NodeSdk),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::Cursor => "IDE tool for code editing and development",
            ToolKind::GitHub => "Version control and code repository management",
            ToolKind::Postman => "API testing and development tool",
            ToolKind::PythonSdk => "Python development tools and libraries",
            ToolKind::NodeSdk => "Node.js development tools and libraries",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            ToolKind::Cursor,
            ToolKind::GitHub,
            ToolKind::Postman,
            ToolKind::PythonSdk,
            ToolKind::NodeSdk,
        ]
    }

    pub fn invoke(&self, query: &str) -> String {
        format!("Using {} for: {}", self.as_str(), query)
    }
}

/// Resolves configured tool names against the catalog. Unknown names are
/// dropped without error; duplicates collapse to the first occurrence.
pub fn resolve_tools<S: AsRef<str>>(names: &[S]) -> Vec<ToolKind> {
    let mut resolved = Vec::new();
    for name in names {
        match ToolKind::from_name(name.as_ref()) {
            Some(tool) if !resolved.contains(&tool) => resolved.push(tool),
            Some(_) => {}
            None => log::debug!("Ignoring unknown tool: {}", name.as_ref()),
        }
    }
    resolved
}
