pub mod aggregator;
pub mod analyzer;
pub mod context;
pub mod coordination;
pub mod crew;
pub mod executor;
pub mod generator;

pub use aggregator::{DedupePolicy, TaskAggregator};
pub use analyzer::{AnalysisReport, ChunkFailure, SowAnalyzer};
pub use context::RunContext;
pub use coordination::{AssignmentCoordinator, ExecutionPlan};
pub use crew::{Crew, Process, TaskExecutor, TaskOutput};
pub use executor::{ExecutorConfig, LlmTaskExecutor};
pub use generator::{GenerationContext, GenerationMode, RetryPolicy, TaskGenerator};
