use std::path::PathBuf;

use thiserror::Error;

use crate::types::ExecutionStatus;

pub type SowResult<T> = std::result::Result<T, SowError>;

#[derive(Debug, Error)]
pub enum SowError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("SOW document not found at {}", .0.display())]
    DocumentNotFound(PathBuf),

    #[error("failed to read SOW document {}: {reason}", .path.display())]
    DocumentRead { path: PathBuf, reason: String },

    #[error("SOW document contains no text")]
    DocumentEmpty,

    #[error("could not parse generated tasks for chunk {chunk}{}: {reason}", role_suffix(.role))]
    GenerationParse {
        chunk: usize,
        role: Option<String>,
        reason: String,
    },

    #[error("generation request failed for chunk {chunk}{}: {reason}", role_suffix(.role))]
    GenerationTransport {
        chunk: usize,
        role: Option<String>,
        reason: String,
    },

    #[error("no tasks were generated for any role ({chunks} chunks analyzed, {failures} failed)")]
    EmptyResult { chunks: usize, failures: usize },

    #[error("execution failed for {role} on task \"{task}\": {reason}")]
    ExecutionEngine {
        role: String,
        task: String,
        reason: String,
    },

    #[error("invalid status transition for {role}: {event} while {state:?}")]
    InvalidTransition {
        role: String,
        state: ExecutionStatus,
        event: &'static str,
    },

    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("run was stopped before completion")]
    Cancelled,

    #[error("failed to persist results to {}: {reason}", .path.display())]
    Persistence { path: PathBuf, reason: String },
}

fn role_suffix(role: &Option<String>) -> String {
    role.as_ref()
        .map(|r| format!(" ({})", r))
        .unwrap_or_default()
}

impl SowError {
    /// Chunk- and call-level failures are absorbed by the analyzer; everything
    /// else terminates the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SowError::GenerationParse { .. } | SowError::GenerationTransport { .. }
        )
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self {
            SowError::Configuration(_) => {
                Some("Check the team file and sowcrew.toml, or run `sowcrew init` to create a sample configuration.")
            }
            SowError::DocumentNotFound(_) => {
                Some("Place the SOW file in the docs directory or pass the correct path.")
            }
            SowError::DocumentRead { .. } => {
                Some("Make sure the file is a readable UTF-8 text document and is not open in another program.")
            }
            SowError::DocumentEmpty => Some("The document has no non-blank paragraphs to analyze."),
            SowError::GenerationTransport { .. } => {
                Some("Check your model provider credentials (e.g. OPENAI_API_KEY) and network access.")
            }
            SowError::EmptyResult { failures, .. } if *failures > 0 => {
                Some("Every generation request failed. Check your model provider credentials (e.g. OPENAI_API_KEY) and quota.")
            }
            SowError::EmptyResult { .. } => {
                Some("The model returned no tasks. Check that the SOW describes concrete deliverables for the configured roles.")
            }
            SowError::ExecutionEngine { .. } => {
                Some("Inspect the run log for the failing task; check provider credentials and rate limits.")
            }
            SowError::Persistence { .. } => Some("Check that the output directory exists and is writable."),
            _ => None,
        }
    }

    /// Message plus remediation hint, suitable for showing to a user.
    pub fn display_with_hint(&self) -> String {
        match self.hint() {
            Some(hint) => format!("{}\n{}", self, hint),
            None => self.to_string(),
        }
    }
}
