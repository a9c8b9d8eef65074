use std::path::Path;

use super::schema::MemberDefinition;
use crate::error::{SowError, SowResult};

/// Sample roster written by `sowcrew init`. Never substituted for a missing
/// team file at run time.
pub fn default_team() -> Vec<MemberDefinition> {
    vec![
        MemberDefinition::new(
            "Project Manager",
            "Avery",
            "Coordinates delivery, scope and stakeholder communication",
            &[
                "Break the SOW into milestones",
                "Track risks and dependencies",
            ],
            &["GitHub"],
        ),
        MemberDefinition::new(
            "Backend Developer",
            "Dana",
            "Designs and implements server-side services and data models",
            &["Deliver reliable APIs", "Keep the data model consistent"],
            &["Cursor", "GitHub", "Postman", "Python SDK"],
        ),
        MemberDefinition::new(
            "Frontend Developer",
            "Jordan",
            "Builds the user-facing application",
            &["Implement accessible UI flows", "Integrate with backend APIs"],
            &["Cursor", "GitHub", "Node.js SDK"],
        ),
        MemberDefinition::new(
            "QA Engineer",
            "Sam",
            "Verifies functionality against the acceptance criteria",
            &["Write test plans", "Automate regression tests"],
            &["Postman", "GitHub", "Python SDK"],
        ),
    ]
}

/// Writes the sample roster as JSON unless the file already exists.
/// Returns whether a file was written.
pub fn write_default_team(path: &Path) -> SowResult<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| persistence_error(path, e))?;
    }

    let json = serde_json::to_string_pretty(&default_team())
        .map_err(|e| persistence_error(path, e))?;
    std::fs::write(path, json).map_err(|e| persistence_error(path, e))?;
    Ok(true)
}

fn persistence_error(path: &Path, err: impl std::fmt::Display) -> SowError {
    SowError::Persistence {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
