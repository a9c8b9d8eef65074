use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::error::{SowError, SowResult};
use crate::types::{RunRecord, TaskSet};

fn persistence_error(path: &Path, reason: impl ToString) -> SowError {
    SowError::Persistence {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> SowResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| persistence_error(path, e))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| persistence_error(path, e))?;
    }
    tokio::fs::write(path, json)
        .await
        .map_err(|e| persistence_error(path, e))?;

    log::info!("Saved {}", path.display());
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> SowResult<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| persistence_error(path, e))?;
    serde_json::from_str(&raw).map_err(|e| persistence_error(path, e))
}

/// Writes `{agents, tasks, execution_result}` as pretty JSON.
pub async fn save_run_record(path: &Path, record: &RunRecord) -> SowResult<()> {
    write_json(path, record).await
}

pub async fn load_run_record(path: &Path) -> SowResult<RunRecord> {
    read_json(path).await
}

pub async fn save_task_set(path: &Path, tasks: &TaskSet) -> SowResult<()> {
    write_json(path, tasks).await
}

pub async fn load_task_set(path: &Path) -> SowResult<TaskSet> {
    read_json(path).await
}
