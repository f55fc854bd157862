pub mod vector_db;
pub mod qdrant_config;

pub use vector_db::{ScoredPoint, VectorDB, VectorDBError};
