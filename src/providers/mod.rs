pub mod llm;
pub mod ollama;

pub use llm::{
    AnthropicProvider, LLMProvider, Message, MockLLMProvider, OpenAIProvider, ScriptedLLMProvider,
};
pub use ollama::OllamaProvider;

use std::sync::Arc;

use crate::config::{Config, ProviderKind};
use crate::error::{SowError, SowResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderPurpose {
    /// Task generation from SOW chunks
    Generation,
    /// Running assigned tasks; capped by `max_tokens_per_agent`
    Execution,
}

pub fn build_llm_provider(
    config: &Config,
    purpose: ProviderPurpose,
) -> SowResult<Arc<dyn LLMProvider>> {
    let generation = &config.generation;
    let max_tokens = config.execution.max_tokens_per_agent;

    let provider: Arc<dyn LLMProvider> = match generation.provider {
        ProviderKind::OpenAi => {
            let key = config.secrets.openai_api_key.clone().ok_or_else(|| {
                SowError::Configuration(
                    "OPENAI_API_KEY is not set (add it to the environment or a .env file)"
                        .to_string(),
                )
            })?;
            let mut provider = OpenAIProvider::new(key);
            if let Some(model) = &generation.model {
                provider = provider.with_model(model.clone());
            }
            match purpose {
                ProviderPurpose::Generation => {
                    Arc::new(provider.with_temperature(generation.temperature))
                }
                ProviderPurpose::Execution => Arc::new(provider.with_max_tokens(max_tokens)),
            }
        }
        ProviderKind::Anthropic => {
            let key = config.secrets.anthropic_api_key.clone().ok_or_else(|| {
                SowError::Configuration(
                    "ANTHROPIC_API_KEY is not set (add it to the environment or a .env file)"
                        .to_string(),
                )
            })?;
            let mut provider = AnthropicProvider::new(key);
            if let Some(model) = &generation.model {
                provider = provider.with_model(model.clone());
            }
            match purpose {
                ProviderPurpose::Generation => {
                    Arc::new(provider.with_temperature(generation.temperature))
                }
                ProviderPurpose::Execution => Arc::new(provider.with_max_tokens(max_tokens)),
            }
        }
        ProviderKind::Ollama => {
            let provider =
                OllamaProvider::new(generation.ollama_base_url.clone(), generation.model.clone());
            match purpose {
                ProviderPurpose::Generation => {
                    Arc::new(provider.with_temperature(generation.temperature))
                }
                ProviderPurpose::Execution => Arc::new(provider.with_max_tokens(max_tokens)),
            }
        }
    };

    log::debug!(
        "Using {:?} provider for {:?}",
        generation.provider,
        purpose
    );
    Ok(provider)
}
