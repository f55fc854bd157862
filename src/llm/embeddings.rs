use crate::config::ProviderConfig;
use crate::providers::openai::openai::openai_config;
use anyhow::{anyhow, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{CreateEmbeddingRequestArgs, EmbeddingInput},
    Client as OpenAIClient,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

/// Gemini `embedContent` client.
#[derive(Clone)]
pub struct GeminiEmbedding {
    api_key: String,
    client: Client,
    api_url: String,
    model: String,
}

impl GeminiEmbedding {
    pub fn new(api_key: String, config: &ProviderConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api_key,
            client: Client::builder().timeout(timeout).build()?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            model: config.embedding_model.clone(),
        })
    }

    fn parse_values(body: &Value) -> Result<Vec<f32>> {
        let values = body["embedding"]["values"]
            .as_array()
            .ok_or_else(|| anyhow!("Embedding response has no values"))?;

        let vector: Vec<f32> = values
            .iter()
            .filter_map(|v| v.as_f64())
            .map(|v| v as f32)
            .collect();

        if vector.is_empty() || vector.len() != values.len() {
            return Err(anyhow!("Embedding response has malformed values"));
        }
        Ok(vector)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/models/{}:embedContent", self.api_url, self.model);

        let response = self.client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "model": format!("models/{}", self.model),
                "content": { "parts": [{ "text": text }] }
            }))
            .send()
            .await
            .map_err(|e| e.without_url())?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("Gemini embedding returned {}: {}", status, detail));
        }

        let body: Value = response.json().await?;
        Self::parse_values(&body)
    }
}

#[derive(Clone)]
pub struct OpenAIEmbedding {
    client: OpenAIClient<OpenAIConfig>,
    model: String,
}

impl OpenAIEmbedding {
    pub fn new(api_key: String, config: &ProviderConfig, timeout: Duration) -> Result<Self> {
        let client = OpenAIClient::with_config(openai_config(api_key, config))
            .with_http_client(Client::builder().timeout(timeout).build()?);

        Ok(Self {
            client,
            model: config.embedding_model.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::String(text.to_string()))
            .build()?;

        let response = self.client.embeddings().create(request).await?;

        response
            .data
            .into_iter()
            .next()
            .map(|embedding| embedding.embedding)
            .ok_or_else(|| anyhow!("No embedding returned from OpenAI"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(texts.to_vec()))
            .build()?;

        let mut data = self.client.embeddings().create(request).await?.data;
        if data.len() != texts.len() {
            return Err(anyhow!(
                "OpenAI returned {} embeddings for {} inputs",
                data.len(),
                texts.len()
            ));
        }
        data.sort_by_key(|embedding| embedding.index);
        Ok(data.into_iter().map(|embedding| embedding.embedding).collect())
    }
}
