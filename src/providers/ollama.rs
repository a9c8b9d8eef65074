use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;

use crate::providers::llm::{LLMProvider, Message};

pub struct OllamaProvider {
    base_url: String,
    model: String,
    temperature: Option<f32>,
    num_predict: Option<u32>,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(base_url: Option<String>, model: Option<String>) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| "http://localhost:11434".to_string()),
            model: model.unwrap_or_else(|| "llama3.1".to_string()),
            temperature: None,
            num_predict: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.num_predict = Some(max_tokens);
        self
    }

    fn options(&self) -> serde_json::Value {
        let mut options = serde_json::Map::new();
        if let Some(t) = self.temperature {
            options.insert("temperature".to_string(), json!(t));
        }
        if let Some(n) = self.num_predict {
            options.insert("num_predict".to_string(), json!(n));
        }
        serde_json::Value::Object(options)
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        let ollama_messages: Vec<_> = messages
            .iter()
            .map(|m| {
                json!({
                    "role": m.role.clone(),
                    "content": m.content.clone(),
                })
            })
            .collect();

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&json!({
                "model": self.model,
                "messages": ollama_messages,
                "stream": false,
                "options": self.options(),
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            anyhow::bail!("Ollama error {}: {}", status, body);
        }

        let body: serde_json::Value = response.json().await?;
        let content = body["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow!("Invalid Ollama response"))?;

        Ok(content.to_string())
    }
}
