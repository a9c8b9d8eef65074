use std::sync::Arc;
use std::time::Duration;

use sowcrew::definitions::{TeamFormat, TeamRegistry};
use sowcrew::document::{
    ChunkMode, DocumentExtractor, DocxExtractor, ExtensionExtractor, PlainTextExtractor, TextChunker,
};
use sowcrew::engine::{
    AssignmentCoordinator, ExecutorConfig, GenerationMode, LlmTaskExecutor, RetryPolicy,
    RunContext, SowAnalyzer, TaskAggregator, TaskGenerator,
};
use sowcrew::config::ExecutionLimits;
use sowcrew::providers::ScriptedLLMProvider;
use sowcrew::storage::{load_run_record, load_task_set, save_run_record, save_task_set};
use sowcrew::tools::ToolKind;
use sowcrew::{ExecutionStatus, HaltReason, ProgressKind, SowError, TeamMember};

const TEAM_YAML: &str = r#"
- role: Backend Developer
  name: Dana
  description: Builds services and APIs
  objectives: [Ship reliable endpoints]
  tools: [GitHub, Postman, Bogus]
- role: QA Engineer
  name: Sam
  description: Guards release quality
  objectives: [Automate regression, Track defects]
  tools: [Cursor]
- role: Designer
  name: Riley
  description: Owns the UI
  objectives: [Consistent look]
  tools: []
"#;

fn team() -> Vec<TeamMember> {
    TeamRegistry::parse(TEAM_YAML, TeamFormat::Yaml)
        .unwrap()
        .into_members()
}

fn analyzer(provider: Arc<ScriptedLLMProvider>, max_size: usize) -> SowAnalyzer {
    SowAnalyzer::new(
        TextChunker::new(ChunkMode::WordBounded, max_size, 0).unwrap(),
        TaskGenerator::new(provider).with_retry(RetryPolicy {
            max_retries: 1,
            backoff: Duration::ZERO,
        }),
        TaskAggregator::default(),
        GenerationMode::TeamWide,
    )
}

fn unpaced_executor(provider: Arc<ScriptedLLMProvider>) -> LlmTaskExecutor {
    LlmTaskExecutor::new(
        provider,
        ExecutorConfig::from_limits(ExecutionLimits {
            max_rpm: 0,
            ..ExecutionLimits::default()
        }),
    )
}

#[test]
fn unknown_tools_are_dropped_on_load() {
    let members = team();
    assert_eq!(members[0].tools, vec![ToolKind::GitHub, ToolKind::Postman]);
    assert_eq!(members[1].tools, vec![ToolKind::Cursor]);
}

fn fixture(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[tokio::test]
async fn word_document_yields_non_blank_body_paragraphs() {
    let path = fixture("sample_sow.docx");
    let expected = "Tender Portal SOW\nBuild a REST API & admin UI.\nPhase\t1: design\nVerify it end to end.";

    assert_eq!(DocxExtractor.extract(&path).await.unwrap(), expected);
    assert_eq!(ExtensionExtractor.extract(&path).await.unwrap(), expected);
}

#[tokio::test]
async fn word_document_feeds_the_analyzer() {
    let members = team();
    let text = ExtensionExtractor.extract(&fixture("sample_sow.docx")).await.unwrap();
    let provider = Arc::new(ScriptedLLMProvider::from_responses([
        r#"{"Backend Developer": ["Build submission API"]}"#,
    ]));
    let ctx = RunContext::new(members.iter().map(|m| m.role.clone()));

    let report = analyzer(provider.clone(), 8000)
        .analyze(&text, &members, &ctx)
        .await
        .unwrap();
    assert_eq!(report.chunks, 1);
    assert!(provider.requests()[0][1].content.contains("admin UI"));
    assert!(!provider.requests()[0][1].content.contains("Milestone table cell"));
}

#[tokio::test]
async fn tasks_merge_in_first_occurrence_order_across_chunks() {
    let members = team();
    let provider = Arc::new(ScriptedLLMProvider::from_responses([
        r#"{"Backend Developer": ["a", "b"]}"#,
        r#"{"Backend Developer": ["b", "c"]}"#,
        r#"{"Backend Developer": []}"#,
    ]));
    let ctx = RunContext::new(members.iter().map(|m| m.role.clone()));

    let report = analyzer(provider.clone(), 5)
        .analyze("one two three", &members, &ctx)
        .await
        .unwrap();

    assert_eq!(report.chunks, 3);
    assert_eq!(report.tasks.get("Backend Developer").unwrap(), &["a", "b", "c"]);
    assert!(report.tasks.get("Designer").unwrap().is_empty());
    let roles: Vec<&str> = report.tasks.roles().collect();
    assert_eq!(roles, vec!["Backend Developer", "QA Engineer", "Designer"]);

    for (i, request) in provider.requests().iter().enumerate() {
        assert!(request[1].content.contains(&format!("Section {}/3", i + 1)));
    }
}

#[tokio::test]
async fn transient_transport_error_is_retried_within_a_chunk() {
    let members = team();
    let provider = Arc::new(ScriptedLLMProvider::new(vec![
        Err("connection reset".to_string()),
        Ok(r#"{"QA Engineer": ["Write test plan"]}"#.to_string()),
    ]));
    let ctx = RunContext::new(members.iter().map(|m| m.role.clone()));

    let report = analyzer(provider, 100)
        .analyze("Short SOW.", &members, &ctx)
        .await
        .unwrap();
    assert!(report.failures.is_empty());
    assert_eq!(report.tasks.get("QA Engineer").unwrap(), &["Write test plan"]);
}

#[tokio::test]
async fn full_pipeline_from_document_to_saved_record() {
    let dir = tempfile::tempdir().unwrap();
    let sow = dir.path().join("sow.txt");
    std::fs::write(
        &sow,
        "Tender Portal SOW\n\nBuild a REST API for tender submissions.\n\nVerify it end to end.\n",
    )
    .unwrap();

    let members = team();
    let text = PlainTextExtractor.extract(&sow).await.unwrap();
    assert_eq!(
        text,
        "Tender Portal SOW\nBuild a REST API for tender submissions.\nVerify it end to end."
    );

    let generation = Arc::new(ScriptedLLMProvider::from_responses([r#"```json
{
  "Backend Developer": ["Implement tender submission endpoint", "Add request validation"],
  "QA Engineer": ["Write end-to-end tests for submissions"],
  "Project Manager": ["Not on this team"]
}
```"#]));
    let ctx = RunContext::new(members.iter().map(|m| m.role.clone()));
    let report = analyzer(generation, 8000).analyze(&text, &members, &ctx).await.unwrap();
    assert_eq!(report.tasks.total_tasks(), 3);

    let tasks_path = dir.path().join("tasks.json");
    save_task_set(&tasks_path, &report.tasks).await.unwrap();
    let tasks = load_task_set(&tasks_path).await.unwrap().aligned_to(&members);
    assert_eq!(tasks, report.tasks);

    let execution = Arc::new(ScriptedLLMProvider::from_responses([
        "Endpoint live at POST /tenders",
        r#"{"tool": "Postman", "query": "validate payload schema"}"#,
        "Validation added",
        "E2E suite green",
    ]));
    let executor = unpaced_executor(execution.clone());
    let record = AssignmentCoordinator::run_team(&members, &tasks, &executor, &ctx)
        .await
        .unwrap();

    assert_eq!(record.execution_result, "E2E suite green");
    assert_eq!(record.agents.len(), 2);
    assert!(record.agents.get("Designer").is_none());
    let backend = record.agents.get("Backend Developer").unwrap();
    assert_eq!(backend.assigned_task_count, 2);
    assert_eq!(backend.tools, vec!["GitHub", "Postman"]);

    // Third call carries the simulated tool result; the fourth sees all prior outputs
    let requests = execution.requests();
    assert!(requests[2][3].content.contains("Using Postman for: validate payload schema"));
    assert!(requests[3][1].content.contains("Endpoint live at POST /tenders"));

    let board = ctx.status_snapshot();
    assert_eq!(board.status("Backend Developer"), Some(ExecutionStatus::Completed));
    assert_eq!(board.status("QA Engineer"), Some(ExecutionStatus::Completed));
    assert_eq!(board.status("Designer"), Some(ExecutionStatus::Waiting));

    let out = dir.path().join("result.json");
    save_run_record(&out, &record).await.unwrap();
    assert_eq!(load_run_record(&out).await.unwrap(), record);
}

#[tokio::test]
async fn hand_edited_task_file_with_repeats_yields_each_task_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.json");
    std::fs::write(
        &path,
        r#"{"QA Engineer": ["a", "a", "b"], "Backend Developer": ["c", "c"]}"#,
    )
    .unwrap();

    let members = team();
    let tasks = load_task_set(&path).await.unwrap().aligned_to(&members);
    let plan = AssignmentCoordinator::assign(&members, &tasks);

    let descriptions: Vec<&str> = plan.tasks.iter().map(|t| t.description.as_str()).collect();
    assert_eq!(descriptions, vec!["c", "a", "b"]);
}

#[tokio::test]
async fn engine_failure_marks_role_failed_and_halts_the_rest() {
    let members = team();
    let mut tasks = sowcrew::TaskSet::from_members(&members);
    tasks
        .get_mut("Backend Developer")
        .unwrap()
        .extend(["t1".to_string(), "t2".to_string()]);
    tasks.get_mut("QA Engineer").unwrap().push("t3".to_string());

    let execution = Arc::new(ScriptedLLMProvider::new(vec![
        Ok("t1 done".to_string()),
        Err("429 rate limited".to_string()),
    ]));
    let executor = unpaced_executor(execution);
    let ctx = RunContext::new(members.iter().map(|m| m.role.clone()));
    let mut events = ctx.subscribe();

    let err = AssignmentCoordinator::run_team(&members, &tasks, &executor, &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, SowError::ExecutionEngine { ref role, .. } if role == "Backend Developer"));

    let board = ctx.status_snapshot();
    assert_eq!(board.status("Backend Developer"), Some(ExecutionStatus::Failed));
    assert_eq!(board.status("QA Engineer"), Some(ExecutionStatus::Waiting));

    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        kinds.push(event.kind);
    }
    assert_eq!(
        kinds.last(),
        Some(&ProgressKind::RunHalted {
            reason: HaltReason::Failed
        })
    );
    assert_eq!(kinds.len(), ctx.history().len());
}

#[tokio::test]
async fn stop_requested_before_execution_cancels_the_run() {
    let members = team();
    let mut tasks = sowcrew::TaskSet::from_members(&members);
    tasks.get_mut("QA Engineer").unwrap().push("t".to_string());

    let execution = Arc::new(ScriptedLLMProvider::from_responses(["never used"]));
    let executor = unpaced_executor(execution.clone());
    let ctx = RunContext::new(members.iter().map(|m| m.role.clone()));
    ctx.stop();

    let err = AssignmentCoordinator::run_team(&members, &tasks, &executor, &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, SowError::Cancelled));
    assert_eq!(execution.call_count(), 0);
    assert_eq!(ctx.status_snapshot().status("QA Engineer"), Some(ExecutionStatus::Waiting));
    assert_eq!(
        ctx.history().last().map(|e| e.kind.clone()),
        Some(ProgressKind::RunHalted {
            reason: HaltReason::Stopped
        })
    );
}
