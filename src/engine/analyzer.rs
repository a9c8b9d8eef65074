use serde::Serialize;
use std::sync::Arc;

use crate::config::Config;
use crate::document::{Chunk, TextChunker};
use crate::engine::aggregator::TaskAggregator;
use crate::engine::context::RunContext;
use crate::engine::generator::{GenerationContext, GenerationMode, TaskGenerator};
use crate::error::{SowError, SowResult};
use crate::providers::LLMProvider;
use crate::types::{TaskSet, TeamMember};

/// A generation call that failed and was skipped.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkFailure {
    pub chunk: usize,
    pub role: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub tasks: TaskSet,
    pub chunks: usize,
    pub failures: Vec<ChunkFailure>,
}

/// Chunk, generate and merge: document text in, deduplicated tasks by role out.
pub struct SowAnalyzer {
    chunker: TextChunker,
    generator: TaskGenerator,
    aggregator: TaskAggregator,
    mode: GenerationMode,
}

impl SowAnalyzer {
    pub fn new(
        chunker: TextChunker,
        generator: TaskGenerator,
        aggregator: TaskAggregator,
        mode: GenerationMode,
    ) -> Self {
        Self {
            chunker,
            generator,
            aggregator,
            mode,
        }
    }

    pub fn from_config(config: &Config, llm_provider: Arc<dyn LLMProvider>) -> SowResult<Self> {
        Ok(Self::new(
            TextChunker::from_config(&config.chunking)?,
            TaskGenerator::from_config(llm_provider, &config.generation),
            TaskAggregator::new(config.generation.dedupe),
            config.generation.mode,
        ))
    }

    pub async fn analyze(
        &self,
        text: &str,
        members: &[TeamMember],
        ctx: &RunContext,
    ) -> SowResult<AnalysisReport> {
        if text.trim().is_empty() {
            return Err(SowError::DocumentEmpty);
        }

        let chunks = self.chunker.chunk(text);
        log::info!(
            "Analyzing SOW: {} characters in {} chunks ({:?} generation)",
            text.chars().count(),
            chunks.len(),
            self.mode
        );

        let mut tasks = TaskSet::from_members(members);
        let mut failures = Vec::new();

        for chunk in &chunks {
            if ctx.is_stopped() {
                log::warn!("Analysis stopped before chunk {}", chunk.label());
                return Err(SowError::Cancelled);
            }
            log::info!("Processing chunk {}", chunk.label());

            tasks = match self.mode {
                GenerationMode::TeamWide => {
                    self.team_wide(chunk, members, tasks, &mut failures).await?
                }
                GenerationMode::PerRole => {
                    self.per_role(chunk, members, tasks, ctx, &mut failures).await?
                }
            };
        }

        let tasks = self.aggregator.finalize(tasks);
        if tasks.is_empty() {
            return Err(SowError::EmptyResult {
                chunks: chunks.len(),
                failures: failures.len(),
            });
        }

        log::info!(
            "Generated {} tasks across {} roles ({} failed calls)",
            tasks.total_tasks(),
            tasks.role_count(),
            failures.len()
        );
        Ok(AnalysisReport {
            tasks,
            chunks: chunks.len(),
            failures,
        })
    }

    async fn team_wide(
        &self,
        chunk: &Chunk,
        members: &[TeamMember],
        tasks: TaskSet,
        failures: &mut Vec<ChunkFailure>,
    ) -> SowResult<TaskSet> {
        match self
            .generator
            .generate(chunk, GenerationContext::Team(members))
            .await
        {
            Ok(incoming) => Ok(self.aggregator.merge(tasks, incoming)),
            Err(e) => {
                record_failure(chunk, None, e, failures)?;
                Ok(tasks)
            }
        }
    }

    async fn per_role(
        &self,
        chunk: &Chunk,
        members: &[TeamMember],
        mut tasks: TaskSet,
        ctx: &RunContext,
        failures: &mut Vec<ChunkFailure>,
    ) -> SowResult<TaskSet> {
        for member in members {
            if ctx.is_stopped() {
                return Err(SowError::Cancelled);
            }
            match self
                .generator
                .generate(chunk, GenerationContext::Role(member))
                .await
            {
                Ok(incoming) => tasks = self.aggregator.collect(tasks, incoming),
                Err(e) => record_failure(chunk, Some(&member.role), e, failures)?,
            }
        }
        Ok(tasks)
    }
}

fn record_failure(
    chunk: &Chunk,
    role: Option<&str>,
    error: SowError,
    failures: &mut Vec<ChunkFailure>,
) -> SowResult<()> {
    if !error.is_recoverable() {
        return Err(error);
    }
    log::warn!("Skipping chunk {}: {}", chunk.label(), error);
    failures.push(ChunkFailure {
        chunk: chunk.index + 1,
        role: role.map(str::to_string),
        error: error.to_string(),
    });
    Ok(())
}
