use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::storage::session::{RunSession, RunSummary};
use crate::types::RunId;

#[async_trait]
pub trait RunStore: Send + Sync {
    async fn create_run(&self, session: RunSession) -> Result<Arc<RunSession>>;
    async fn get_run(&self, id: RunId) -> Result<Option<Arc<RunSession>>>;
    /// Newest first
    async fn list_runs(&self) -> Result<Vec<RunSummary>>;
    /// Returns false when no such run existed.
    async fn remove_run(&self, id: RunId) -> Result<bool>;
}
