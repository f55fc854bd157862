mod chunker;
mod loader;

pub use chunker::TextChunker;
pub use loader::{load_documents, LoadedDocument};

use crate::llm::semantic_search::SemanticSearch;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

const EMBED_BATCH_SIZE: usize = 64;

/// Destination for embedded chunks.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    async fn store_chunks(&self, chunks: &[String], source: &str) -> Result<usize>;
}

#[async_trait]
impl ChunkStore for SemanticSearch {
    async fn store_chunks(&self, chunks: &[String], source: &str) -> Result<usize> {
        self.index_texts(chunks, source).await
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
}

pub async fn ingest_path<S: ChunkStore + ?Sized>(path: &Path, chunker: &TextChunker, store: &S) -> Result<IngestReport> {
    let documents = load_documents(path)?;
    let mut report = IngestReport::default();

    for document in documents {
        let chunks = chunker.split(&document.text);
        log::info!("Indexing {} ({} chunks)", document.source, chunks.len());

        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            report.chunks += store.store_chunks(batch, &document.source).await?;
        }
        report.documents += 1;
    }

    Ok(report)
}
