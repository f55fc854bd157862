pub mod embeddings;
pub mod semantic_search;

pub use embeddings::{EmbeddingProvider, GeminiEmbedding, OpenAIEmbedding};
pub use semantic_search::{ScoredDocument, SemanticSearch, VectorIndex};
