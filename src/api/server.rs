use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::api::handlers;
use crate::config::Config;
use crate::definitions::TeamRegistry;
use crate::document::DocumentExtractor;
use crate::engine::TaskExecutor;
use crate::providers::LLMProvider;
use crate::storage::RunStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub team: Arc<TeamRegistry>,
    pub store: Arc<dyn RunStore>,
    pub extractor: Arc<dyn DocumentExtractor>,
    pub generation: Arc<dyn LLMProvider>,
    pub executor: Arc<dyn TaskExecutor>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/runs", post(handlers::create_run).get(handlers::list_runs))
        .route("/runs/:id", get(handlers::get_run).delete(handlers::delete_run))
        .route("/runs/:id/tasks", get(handlers::get_run_tasks))
        .route("/runs/:id/execute", post(handlers::execute_run))
        .route("/runs/:id/stop", post(handlers::stop_run))
        .route("/runs/:id/status", get(handlers::get_run_status))
        .route("/runs/:id/events", get(handlers::stream_run_events))
        .route("/runs/:id/result", get(handlers::get_run_result))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    log::info!("sowcrew API server listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::document::ExtensionExtractor;
    use crate::engine::{ExecutorConfig, LlmTaskExecutor};
    use crate::providers::ScriptedLLMProvider;
    use crate::storage::InMemoryRunStore;
    use crate::tools::ToolKind;
    use crate::types::TeamMember;

    fn members() -> Vec<TeamMember> {
        vec![
            TeamMember::new("Backend Developer", "Dana", "Builds APIs", vec!["Ship".to_string()], vec![ToolKind::GitHub]),
            TeamMember::new("QA Engineer", "Sam", "Tests things", vec!["Verify".to_string()], vec![ToolKind::Postman]),
        ]
    }

    /// State rooted in a fresh temp directory that holds `docs/` and the result file.
    fn test_state(generation: Vec<&str>, execution: Vec<&str>) -> AppState {
        let root = std::env::temp_dir().join(format!("sowcrew-test-{}", uuid::Uuid::new_v4()));
        let mut config = Config::default();
        config.execution.max_rpm = 0;
        config.generation.max_retries = 0;
        config.paths.docs_dir = root.join("docs");
        config.paths.output_file = root.join("result.json");
        std::fs::create_dir_all(&config.paths.docs_dir).unwrap();

        let executor = LlmTaskExecutor::new(
            Arc::new(ScriptedLLMProvider::from_responses(execution)),
            ExecutorConfig::from_limits(config.execution),
        );
        AppState {
            config: Arc::new(config),
            team: Arc::new(TeamRegistry::from_members(members()).unwrap()),
            store: Arc::new(InMemoryRunStore::new()),
            extractor: Arc::new(ExtensionExtractor),
            generation: Arc::new(ScriptedLLMProvider::from_responses(generation)),
            executor: Arc::new(executor),
        }
    }

    fn create_test_app(generation: Vec<&str>, execution: Vec<&str>) -> Router {
        create_router(test_state(generation, execution))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_test_app(vec![], vec![]);
        let (status, json) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn test_create_run_requires_input() {
        let app = create_test_app(vec![], vec![]);
        let (status, json) = send(&app, "POST", "/runs", Some("{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("text"));
    }

    #[tokio::test]
    async fn test_missing_document_is_bad_request_with_hint() {
        let app = create_test_app(vec![], vec![]);
        let (status, json) = send(&app, "POST", "/runs", Some(r#"{"document_path": "not-here.txt"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["hint"].is_string());
    }

    #[tokio::test]
    async fn test_documents_outside_docs_dir_are_refused() {
        let state = test_state(vec![r#"{"QA Engineer": ["Leak"]}"#], vec![]);
        let outside = state.config.paths.docs_dir.parent().unwrap().join("secret.env");
        std::fs::write(&outside, "OPENAI_API_KEY=sk-test").unwrap();
        let app = create_router(state.clone());

        let requests = [
            serde_json::json!({ "document_path": "/etc/hostname" }),
            serde_json::json!({ "document_path": outside }),
            serde_json::json!({ "document_path": "../secret.env" }),
            serde_json::json!({ "document_path": "../../no/such/file.txt" }),
        ];
        for body in requests {
            let (status, json) = send(&app, "POST", "/runs", Some(body.to_string().as_str())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {body}");
            assert!(json["error"].as_str().unwrap().contains("documents directory"));
        }
        assert!(state.store.list_runs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_document_in_docs_dir_is_analyzed_and_tasks_attached() {
        let state = test_state(vec![r#"{"QA Engineer": ["Write test plan"]}"#], vec![]);
        std::fs::write(state.config.paths.docs_dir.join("sow.md"), "Verify the portal.\n").unwrap();
        let app = create_router(state.clone());

        let (status, created) = send(&app, "POST", "/runs", Some(r#"{"document_path": "./sow.md"}"#)).await;
        assert_eq!(status, StatusCode::CREATED);

        let id: crate::types::RunId = serde_json::from_value(created["id"].clone()).unwrap();
        let session = state.store.get_run(id).await.unwrap().unwrap();
        let qa = session.members.iter().find(|m| m.role == "QA Engineer").unwrap();
        assert_eq!(qa.tasks, vec!["Write test plan".to_string()]);
        assert!(session.members[0].tasks.is_empty());
    }

    #[tokio::test]
    async fn test_empty_generation_is_unprocessable() {
        let app = create_test_app(vec![r#"{"QA Engineer": []}"#], vec![]);
        let (status, _) = send(&app, "POST", "/runs", Some(r#"{"text": "Build a portal."}"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unknown_run_is_not_found() {
        let app = create_test_app(vec![], vec![]);
        let (status, _) = send(&app, "GET", "/runs/00000000-0000-0000-0000-000000000000", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_analyze_execute_and_stream() {
        let app = create_test_app(
            vec![r#"```json
{"Backend Developer": ["Build API"], "QA Engineer": ["Test API"], "Designer": ["Draw"]}
```"#],
            vec!["API built", "API tested"],
        );

        let (status, created) =
            send(&app, "POST", "/runs", Some(r#"{"text": "Build and test an API."}"#)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["tasks"]["QA Engineer"][0], "Test API");
        assert!(created["tasks"].get("Designer").is_none());
        let id = created["id"].as_str().unwrap().to_string();

        let (status, listed) = send(&app, "GET", "/runs", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, result) = send(&app, "GET", &format!("/runs/{id}/result"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(result["error"].is_string());

        let (status, _) = send(&app, "POST", &format!("/runs/{id}/execute"), None).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let mut state = serde_json::Value::Null;
        for _ in 0..100 {
            let (_, run) = send(&app, "GET", &format!("/runs/{id}"), None).await;
            state = run["state"].clone();
            if state == "completed" {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(state, "completed");

        let (_, status_json) = send(&app, "GET", &format!("/runs/{id}/status"), None).await;
        assert_eq!(status_json["roles"]["QA Engineer"]["status"], "Completed");

        let (status, result) = send(&app, "GET", &format!("/runs/{id}/result"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["execution_result"], "API tested");
        assert_eq!(result["agents"]["Backend Developer"]["name"], "Dana");

        // History ends with RunCompleted, so the stream terminates
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/runs/{id}/events"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("event: AgentCreated"));
        assert!(body.contains("event: RunCompleted"));

        let (status, _) = send(&app, "DELETE", &format!("/runs/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", &format!("/runs/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
