use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::path::{Component, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::document::join_paragraphs;
use crate::engine::{AssignmentCoordinator, ChunkFailure, RunContext, SowAnalyzer};
use crate::error::SowError;
use crate::lifecycle::StatusBoard;
use crate::storage::{save_run_record, RunSession, RunSummary, SessionState};
use crate::types::{ProgressEvent, ProgressKind, RunId, RunRecord, TaskSet};

#[derive(Debug, Deserialize)]
pub struct CreateRunRequest {
    pub document_path: Option<PathBuf>,
    pub text: Option<String>,
}

#[derive(Serialize)]
pub struct CreateRunResponse {
    pub id: RunId,
    pub tasks: TaskSet,
    pub chunks: usize,
    pub failures: Vec<ChunkFailure>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub id: RunId,
    #[serde(flatten)]
    pub state: SessionState,
    pub roles: StatusBoard,
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn find_run(state: &AppState, id: RunId) -> Result<Arc<RunSession>, ApiError> {
    state
        .store
        .get_run(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Run {} not found", id)))
}

/// Resolves a requested document inside the docs directory. Relative paths
/// are taken from the docs directory; anything resolving outside it is refused.
async fn resolve_document_path(
    docs_dir: &std::path::Path,
    requested: &std::path::Path,
) -> Result<PathBuf, ApiError> {
    let root = tokio::fs::canonicalize(docs_dir).await.map_err(|e| {
        log::error!("Documents directory {} is unavailable: {}", docs_dir.display(), e);
        ApiError::bad_request("Documents directory is not available")
    })?;
    let outside = || {
        log::warn!("Refused document outside the docs directory: {}", requested.display());
        ApiError::bad_request("document_path must point inside the documents directory")
    };

    let candidate = root.join(requested);
    match tokio::fs::canonicalize(&candidate).await {
        Ok(resolved) if resolved.starts_with(&root) => Ok(resolved),
        Ok(_) => Err(outside()),
        Err(_) => {
            let stays_inside = !requested.is_absolute()
                && requested
                    .components()
                    .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
            if stays_inside {
                Err(SowError::DocumentNotFound(requested.to_path_buf()).into())
            } else {
                Err(outside())
            }
        }
    }
}

/// Analyzes a SOW, given inline or as a document in the docs directory.
pub async fn create_run(
    State(state): State<AppState>,
    Json(request): Json<CreateRunRequest>,
) -> Result<(StatusCode, Json<CreateRunResponse>), ApiError> {
    let text = match (request.text, request.document_path) {
        (Some(text), _) => join_paragraphs(text.lines()),
        (None, Some(requested)) => {
            let path = resolve_document_path(&state.config.paths.docs_dir, &requested).await?;
            state.extractor.extract(&path).await?
        }
        (None, None) => {
            return Err(ApiError::bad_request(
                "Provide either \"text\" or \"document_path\"",
            ))
        }
    };

    let mut team = state.team.as_ref().clone();
    let context = Arc::new(RunContext::new(team.roles()));
    let analyzer = SowAnalyzer::from_config(&state.config, state.generation.clone())?;
    let report = analyzer.analyze(&text, team.members(), &context).await?;
    team.attach_tasks(&report.tasks);

    let session = RunSession::new(
        team.into_members(),
        report.tasks,
        report.chunks,
        report.failures,
        context,
    );
    let session = state.store.create_run(session).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateRunResponse {
            id: session.id,
            tasks: session.tasks.clone(),
            chunks: session.chunks,
            failures: session.failures.clone(),
        }),
    ))
}

pub async fn list_runs(State(state): State<AppState>) -> Result<Json<Vec<RunSummary>>, ApiError> {
    Ok(Json(state.store.list_runs().await?))
}

pub async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<RunId>,
) -> Result<Json<RunSummary>, ApiError> {
    Ok(Json(find_run(&state, id).await?.summary()))
}

pub async fn get_run_tasks(
    State(state): State<AppState>,
    Path(id): Path<RunId>,
) -> Result<Json<TaskSet>, ApiError> {
    Ok(Json(find_run(&state, id).await?.tasks.clone()))
}

/// Starts sequential execution in the background. Progress is observable
/// through `/status` and `/events`.
pub async fn execute_run(
    State(state): State<AppState>,
    Path(id): Path<RunId>,
) -> Result<(StatusCode, Json<RunSummary>), ApiError> {
    let session = find_run(&state, id).await?;
    if !session.try_begin_execution() {
        return Err(ApiError::conflict(format!("Run {} is already executing", id)));
    }

    let task_session = session.clone();
    tokio::spawn(async move {
        let session = task_session;
        let outcome = AssignmentCoordinator::run_team(
            &session.members,
            &session.tasks,
            state.executor.as_ref(),
            &session.context,
        )
        .await;
        finish_execution(&state, &session, outcome).await;
    });

    Ok((StatusCode::ACCEPTED, Json(session.summary())))
}

async fn finish_execution(
    state: &AppState,
    session: &RunSession,
    outcome: Result<RunRecord, SowError>,
) {
    match outcome {
        Ok(record) => {
            if let Err(e) = save_run_record(&state.config.paths.output_file, &record).await {
                log::warn!("Run {} completed but was not saved: {}", session.id, e);
            }
            session.complete(record);
        }
        Err(SowError::Cancelled) => session.set_state(SessionState::Stopped),
        Err(e) => {
            log::error!("Run {} failed: {}", session.id, e);
            session.set_state(SessionState::Failed {
                error: e.to_string(),
            });
        }
    }
}

pub async fn stop_run(
    State(state): State<AppState>,
    Path(id): Path<RunId>,
) -> Result<Json<RunSummary>, ApiError> {
    let session = find_run(&state, id).await?;
    session.context.stop();
    Ok(Json(session.summary()))
}

pub async fn get_run_status(
    State(state): State<AppState>,
    Path(id): Path<RunId>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session = find_run(&state, id).await?;
    Ok(Json(StatusResponse {
        id: session.id,
        state: session.state(),
        roles: session.context.status_snapshot(),
    }))
}

pub async fn get_run_result(
    State(state): State<AppState>,
    Path(id): Path<RunId>,
) -> Result<Json<RunRecord>, ApiError> {
    let session = find_run(&state, id).await?;
    session
        .record()
        .map(Json)
        .ok_or_else(|| ApiError::conflict(format!("Run {} has no result yet", id)))
}

pub async fn delete_run(
    State(state): State<AppState>,
    Path(id): Path<RunId>,
) -> Result<StatusCode, ApiError> {
    if state.store.remove_run(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("Run {} not found", id)))
    }
}

/// Replays the activity history, then follows live events. The stream ends
/// after a run-level completion or halt event.
pub async fn stream_run_events(
    State(state): State<AppState>,
    Path(id): Path<RunId>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let session = find_run(&state, id).await?;
    let (history, rx) = session.context.subscribe_with_history();

    let events = progress_stream(history.into(), rx).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(Event::default().event(event.kind.name()).data(data))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

struct Cursor {
    pending: VecDeque<ProgressEvent>,
    rx: broadcast::Receiver<ProgressEvent>,
    done: bool,
}

fn progress_stream(
    pending: VecDeque<ProgressEvent>,
    rx: broadcast::Receiver<ProgressEvent>,
) -> impl Stream<Item = ProgressEvent> {
    let cursor = Cursor {
        pending,
        rx,
        done: false,
    };

    stream::unfold(cursor, |mut cursor| async move {
        if cursor.done {
            return None;
        }
        let event = match cursor.pending.pop_front() {
            Some(event) => event,
            None => loop {
                match cursor.rx.recv().await {
                    Ok(event) => break event,
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("Event subscriber lagged, skipped {} events", skipped)
                    }
                    Err(RecvError::Closed) => return None,
                }
            },
        };
        cursor.done = matches!(
            event.kind,
            ProgressKind::RunCompleted { .. } | ProgressKind::RunHalted { .. }
        );
        Some((event, cursor))
    })
}
