use anyhow::{Error, Result};
use async_trait::async_trait;
use crate::database::vector_db::VectorDB;
use crate::llm::embeddings::EmbeddingProvider;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub text: String,
    pub score: f32,
}

/// Top-k similarity search over stored passages, most similar first.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn search(&self, query: &str, k: u64) -> Result<Vec<ScoredDocument>>;
}

pub struct SemanticSearch {
    vector_db: VectorDB,
    collection_name: String,
    embedder: Arc<dyn EmbeddingProvider>,
    // Dimension the collection was created with during this run
    collection_dimension: OnceCell<u64>,
}

impl SemanticSearch {
    pub fn new(vector_db: VectorDB, collection_name: impl Into<String>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            vector_db,
            collection_name: collection_name.into(),
            embedder,
            collection_dimension: OnceCell::new(),
        }
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Embeds and upserts a batch of chunks that share one source. The
    /// collection is created once, on first use, sized to the embedding
    /// dimension; later batches must match that dimension.
    pub async fn index_texts(&self, texts: &[String], source: &str) -> Result<usize> {
        if texts.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embedder.embed_batch(texts).await?;
        let dimension = embeddings.first().map(|e| e.len()).unwrap_or_default();
        if dimension == 0 {
            return Err(Error::msg("Embedding provider returned an empty vector"));
        }

        ensure_collection(&self.collection_dimension, dimension as u64, move || async move {
            self.vector_db.create_collection(&self.collection_name, dimension as u64).await
                .map_err(|e| Error::msg(format!("Failed to create collection: {}", e)))
        })
        .await?;

        let entries = texts
            .iter()
            .zip(embeddings)
            .map(|(text, embedding)| {
                let mut payload = HashMap::new();
                payload.insert("text".to_string(), text.clone());
                payload.insert("source".to_string(), source.to_string());
                (embedding, payload)
            })
            .collect();

        let ids = self.vector_db.store_vectors(&self.collection_name, entries).await
            .map_err(|e| Error::msg(format!("Failed to index text: {}", e)))?;

        Ok(ids.len())
    }
}

#[async_trait]
impl VectorIndex for SemanticSearch {
    async fn search(&self, query: &str, k: u64) -> Result<Vec<ScoredDocument>> {
        let query_embedding = self.embedder.embed(query).await?;

        let results = self.vector_db.search_vectors(&self.collection_name, query_embedding, k).await
            .map_err(|e| Error::msg(format!("Failed to search: {}", e)))?;

        Ok(ranked_documents(results.into_iter().filter_map(|point| {
            let text = point.payload.get("text")?.clone();
            Some(ScoredDocument { text, score: point.score })
        })))
    }
}

async fn ensure_collection<F, Fut>(created: &OnceCell<u64>, dimension: u64, create: F) -> Result<()>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let existing = *created
        .get_or_try_init(|| async { create().await.map(|_| dimension) })
        .await?;

    if existing != dimension {
        return Err(Error::msg(format!(
            "Embedding dimension {} does not match collection dimension {}",
            dimension, existing
        )));
    }
    Ok(())
}

/// Qdrant already ranks by score; the stable sort keeps that order for ties.
fn ranked_documents(documents: impl Iterator<Item = ScoredDocument>) -> Vec<ScoredDocument> {
    let mut documents: Vec<ScoredDocument> = documents.collect();
    documents.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    documents
}
