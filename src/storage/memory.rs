use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::storage::session::{RunSession, RunSummary};
use crate::storage::traits::RunStore;
use crate::types::RunId;

const DEFAULT_MAX_RUNS: usize = 100;

/// Bounded run store. Once full, creating a run evicts the oldest run that is
/// not executing; if every stored run is executing the new run is refused.
#[derive(Clone)]
pub struct InMemoryRunStore {
    runs: Arc<RwLock<HashMap<RunId, Arc<RunSession>>>>,
    max_runs: usize,
}

impl Default for InMemoryRunStore {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_RUNS)
    }
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(max_runs: usize) -> Self {
        Self {
            runs: Arc::new(RwLock::new(HashMap::new())),
            max_runs: max_runs.max(1),
        }
    }
}

#[async_trait]
impl RunStore for InMemoryRunStore {
    async fn create_run(&self, session: RunSession) -> Result<Arc<RunSession>> {
        let session = Arc::new(session);
        let mut runs = self.runs.write();

        while runs.len() >= self.max_runs {
            let oldest = runs
                .values()
                .filter(|s| !s.state().is_executing())
                .min_by_key(|s| s.created_at)
                .map(|s| s.id);
            let Some(id) = oldest else {
                return Err(anyhow!(
                    "run store is full: all {} stored runs are executing",
                    runs.len()
                ));
            };
            if let Some(evicted) = runs.remove(&id) {
                evicted.context.stop();
                log::info!("Evicted run {} to stay within {} runs", id, self.max_runs);
            }
        }

        runs.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_run(&self, id: RunId) -> Result<Option<Arc<RunSession>>> {
        Ok(self.runs.read().get(&id).cloned())
    }

    async fn list_runs(&self) -> Result<Vec<RunSummary>> {
        let mut summaries: Vec<RunSummary> =
            self.runs.read().values().map(|s| s.summary()).collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn remove_run(&self, id: RunId) -> Result<bool> {
        let removed = self.runs.write().remove(&id);
        if let Some(session) = &removed {
            // Any execution still in flight winds down at its next task
            session.context.stop();
        }
        Ok(removed.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RunContext;
    use crate::types::TaskSet;

    fn session() -> RunSession {
        RunSession::new(
            vec![],
            TaskSet::for_roles(["R"]),
            1,
            vec![],
            Arc::new(RunContext::new(["R"])),
        )
    }

    #[tokio::test]
    async fn test_create_get_remove() {
        let store = InMemoryRunStore::new();
        let session = store.create_run(session()).await.unwrap();

        let fetched = store.get_run(session.id).await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&session, &fetched));
        assert_eq!(store.list_runs().await.unwrap().len(), 1);

        assert!(store.remove_run(session.id).await.unwrap());
        assert!(session.context.is_stopped());
        assert!(!store.remove_run(session.id).await.unwrap());
        assert!(store.get_run(session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oldest_idle_run_is_evicted_at_capacity() {
        let store = InMemoryRunStore::with_limit(2);
        let first = store.create_run(session()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.create_run(session()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        // The oldest run is executing, so the next oldest goes
        assert!(first.try_begin_execution());
        let third = store.create_run(session()).await.unwrap();

        assert!(store.get_run(first.id).await.unwrap().is_some());
        assert!(store.get_run(second.id).await.unwrap().is_none());
        assert!(second.context.is_stopped());
        assert!(store.get_run(third.id).await.unwrap().is_some());
        assert_eq!(store.list_runs().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_full_store_of_executing_runs_refuses_new_run() {
        let store = InMemoryRunStore::with_limit(1);
        let running = store.create_run(session()).await.unwrap();
        assert!(running.try_begin_execution());

        let err = store.create_run(session()).await.unwrap_err();
        assert!(err.to_string().contains("run store is full"));
        assert_eq!(store.list_runs().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = InMemoryRunStore::new();
        let first = store.create_run(session()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.create_run(session()).await.unwrap();

        let ids: Vec<RunId> = store.list_runs().await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}
