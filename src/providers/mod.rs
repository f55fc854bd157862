pub mod gemini;
pub mod openai;
pub mod traits;

use crate::config::{AppConfig, LlmBackend};
use crate::llm::embeddings::{EmbeddingProvider, GeminiEmbedding, OpenAIEmbedding};
use anyhow::Result;
use std::sync::Arc;
use traits::CompletionProvider;

/// Builds the completion and embedding clients for the configured backend.
pub fn build_providers(config: &AppConfig) -> Result<(Arc<dyn CompletionProvider>, Arc<dyn EmbeddingProvider>)> {
    let key = config.llm_api_key.clone();
    let timeout = config.call_timeout;

    let model: Arc<dyn CompletionProvider>;
    let embedder: Arc<dyn EmbeddingProvider>;
    match config.backend {
        LlmBackend::Gemini => {
            model = Arc::new(gemini::gemini::GeminiProvider::new(key.clone(), &config.provider, timeout)?);
            embedder = Arc::new(GeminiEmbedding::new(key, &config.provider, timeout)?);
        }
        LlmBackend::OpenAI => {
            model = Arc::new(openai::openai::OpenAIProvider::new(key.clone(), &config.provider, timeout)?);
            embedder = Arc::new(OpenAIEmbedding::new(key, &config.provider, timeout)?);
        }
    }

    Ok((model, embedder))
}
