use crate::config::ProviderConfig;
use crate::providers::traits::{Completion, CompletionProvider, Prompt, Role};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Clone)]
pub struct GeminiProvider {
    api_key: String,
    client: Client,
    api_url: String,
    model: String,
    temperature: f32,
}

impl GeminiProvider {
    pub fn new(api_key: String, config: &ProviderConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn build_request_body(&self, prompt: &Prompt) -> Value {
        let (system, user_turns): (Vec<&str>, Vec<&str>) = match prompt {
            Prompt::Text(text) => (Vec::new(), vec![text.as_str()]),
            Prompt::Messages(messages) => {
                let system = messages
                    .iter()
                    .filter(|m| m.role == Role::System)
                    .map(|m| m.content.as_str())
                    .collect();
                let user = messages
                    .iter()
                    .filter(|m| m.role == Role::User)
                    .map(|m| m.content.as_str())
                    .collect();
                (system, user)
            }
        };

        let contents: Vec<Value> = user_turns
            .into_iter()
            .map(|text| json!({ "role": "user", "parts": [{ "text": text }] }))
            .collect();

        let mut body = json!({
            "contents": contents,
            "generationConfig": { "temperature": self.temperature },
        });

        if !system.is_empty() {
            body["system_instruction"] = json!({ "parts": [{ "text": system.join("\n\n") }] });
        }

        body
    }

    fn parse_response(body: &Value) -> Completion {
        let parts = match body["candidates"][0]["content"]["parts"].as_array() {
            Some(parts) => parts,
            None => return Completion::empty(),
        };

        let text: String = parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect();

        if text.trim().is_empty() {
            Completion::empty()
        } else {
            Completion::text(text)
        }
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    async fn complete(&self, prompt: &Prompt) -> Result<Completion> {
        let url = format!("{}/models/{}:generateContent", self.api_url, self.model);

        let response = self.client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.build_request_body(prompt))
            .send()
            .await
            .map_err(|e| e.without_url())?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("Gemini returned {}: {}", status, detail));
        }

        let response_json: Value = response.json().await?;
        Ok(Self::parse_response(&response_json))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
