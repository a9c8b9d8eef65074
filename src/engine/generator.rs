use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::document::Chunk;
use crate::error::{SowError, SowResult};
use crate::providers::{LLMProvider, Message};
use crate::types::{RoleTasks, TeamMember};

const GENERATION_SYSTEM_PROMPT: &str = r#"You are a delivery lead turning Statement of Work documents into concrete engineering tasks.
Return only valid JSON, with no markdown code fences or explanation."#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// One request per chunk covering every role
    TeamWide,
    /// One request per chunk per role
    PerRole,
}

/// What a single generation request is about.
#[derive(Debug, Clone, Copy)]
pub enum GenerationContext<'a> {
    Team(&'a [TeamMember]),
    Role(&'a TeamMember),
}

impl GenerationContext<'_> {
    fn role(&self) -> Option<&str> {
        match self {
            GenerationContext::Team(_) => None,
            GenerationContext::Role(member) => Some(&member.role),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

pub struct TaskGenerator {
    llm_provider: Arc<dyn LLMProvider>,
    retry: RetryPolicy,
}

impl TaskGenerator {
    pub fn new(llm_provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            llm_provider,
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(llm_provider: Arc<dyn LLMProvider>, config: &GenerationConfig) -> Self {
        Self::new(llm_provider).with_retry(RetryPolicy {
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Issues one generation request for `chunk` and parses the task list.
    pub async fn generate(
        &self,
        chunk: &Chunk,
        context: GenerationContext<'_>,
    ) -> SowResult<RoleTasks> {
        let prompt = match context {
            GenerationContext::Team(members) => self.build_team_prompt(chunk, members),
            GenerationContext::Role(member) => self.build_role_prompt(chunk, member),
        };
        let messages = vec![
            Message::system(GENERATION_SYSTEM_PROMPT.to_string()),
            Message::user(prompt),
        ];

        let response = self
            .complete_with_retry(messages, chunk, context.role())
            .await?;

        match context {
            GenerationContext::Team(_) => parse_team_tasks(&response),
            GenerationContext::Role(member) => parse_role_tasks(&response, &member.role).map(
                |tasks| {
                    let mut map = RoleTasks::new();
                    map.insert(member.role.clone(), tasks);
                    map
                },
            ),
        }
        .map_err(|reason| SowError::GenerationParse {
            chunk: chunk.index + 1,
            role: context.role().map(str::to_string),
            reason,
        })
    }

    async fn complete_with_retry(
        &self,
        messages: Vec<Message>,
        chunk: &Chunk,
        role: Option<&str>,
    ) -> SowResult<String> {
        let mut attempt = 0;
        loop {
            match self.llm_provider.complete(messages.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.retry.max_retries => {
                    let delay = self.retry.backoff * 2u32.saturating_pow(attempt);
                    log::warn!(
                        "Generation request for chunk {} failed (attempt {}), retrying in {:?}: {}",
                        chunk.label(),
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(SowError::GenerationTransport {
                        chunk: chunk.index + 1,
                        role: role.map(str::to_string),
                        reason: e.to_string(),
                    })
                }
            }
        }
    }

    fn build_team_prompt(&self, chunk: &Chunk, members: &[TeamMember]) -> String {
        let team_info = members
            .iter()
            .map(TeamMember::prompt_profile)
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"Based on the following section of the SOW document, generate specific, actionable tasks for each team member.
Focus on concrete, project-specific tasks rather than general responsibilities.

Team Members Information:
{team_info}
SOW Content (Section {section}):
{text}

Generate a JSON object where:
- Keys are team member roles, exactly as written above
- Values are arrays of specific, actionable tasks for that role

Each task should be concrete and measurable, for example
"Implement API endpoint for submitting new tender requests" rather than "Write code".

Format the response as a JSON object like this:
{{
    "Role1": ["task1", "task2"],
    "Role2": ["task1", "task2"]
}}"#,
            section = chunk.label(),
            text = chunk.text,
        )
    }

    fn build_role_prompt(&self, chunk: &Chunk, member: &TeamMember) -> String {
        format!(
            r#"Based on the following section of the SOW document, generate specific, actionable tasks for one team member.
Focus on concrete, project-specific tasks rather than general responsibilities.

Team Member:
{profile}
SOW Content (Section {section}):
{text}

Return a JSON array of strings, one concrete and measurable task per entry.
Return an empty array if this section has no work for this role."#,
            profile = member.prompt_profile(),
            section = chunk.label(),
            text = chunk.text,
        )
    }
}

/// Strips markdown fences and surrounding prose the model sometimes adds.
fn extract_json(response: &str) -> &str {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("fence pattern is valid")
    });

    match fence.captures(response).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => response.trim(),
    }
}

fn string_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_team_tasks(response: &str) -> Result<RoleTasks, String> {
    let parsed: Value = serde_json::from_str(extract_json(response))
        .map_err(|e| format!("invalid JSON: {}", e))?;
    let object = parsed
        .as_object()
        .ok_or_else(|| "expected a JSON object of role -> tasks".to_string())?;

    let mut tasks = RoleTasks::new();
    for (role, value) in object {
        match value.as_array() {
            Some(items) => {
                tasks.insert(role.clone(), string_items(items));
            }
            None => log::warn!("Ignoring non-list tasks for role {}", role),
        }
    }
    Ok(tasks)
}

fn parse_role_tasks(response: &str, role: &str) -> Result<Vec<String>, String> {
    let parsed: Value = serde_json::from_str(extract_json(response))
        .map_err(|e| format!("invalid JSON: {}", e))?;

    match &parsed {
        Value::Array(items) => Ok(string_items(items)),
        // Some models wrap the list: {"tasks": [...]} or {"<role>": [...]}
        Value::Object(object) => object
            .get("tasks")
            .or_else(|| object.get(role))
            .and_then(Value::as_array)
            .map(|items| string_items(items))
            .ok_or_else(|| "expected a JSON array of tasks".to_string()),
        _ => Err("expected a JSON array of tasks".to_string()),
    }
}
