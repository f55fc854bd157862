use thiserror::Error;
use qdrant_client::{
    qdrant::{
        value::Kind, vectors_config::Config, CreateCollection, Distance, PointId, PointStruct,
        SearchPoints, UpsertPoints, Value, VectorParams, VectorsConfig,
    },
    Qdrant,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use crate::database::qdrant_config::create_qdrant_client;

#[derive(Error, Debug)]
pub enum VectorDBError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Operation failed: {0}")]
    Operation(String),
}

/// A scored hit with its string payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
    pub payload: HashMap<String, String>,
}

#[derive(Clone)]
pub struct VectorDB {
    client: Arc<Qdrant>,
}

impl VectorDB {
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> Result<Self, VectorDBError> {
        let client = create_qdrant_client(url, api_key, timeout)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    pub async fn health_check(&self) -> Result<(), VectorDBError> {
        self.client
            .health_check()
            .await
            .map(|_| ())
            .map_err(|e| VectorDBError::Connection(e.to_string()))
    }

    pub async fn create_collection(
        &self,
        name: &str,
        vector_size: u64,
    ) -> Result<(), VectorDBError> {
        let vectors_config = VectorsConfig {
            config: Some(Config::Params(VectorParams {
                size: vector_size,
                distance: Distance::Cosine.into(),
                ..Default::default()
            })),
        };

        let create_collection = CreateCollection {
            collection_name: name.to_string(),
            vectors_config: Some(vectors_config),
            ..Default::default()
        };

        match self.client.create_collection(create_collection).await {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().to_lowercase().contains("already exists") => {
                log::info!("Collection {} already exists, skipping creation", name);
                Ok(())
            }
            Err(e) => Err(VectorDBError::Operation(e.to_string())),
        }
    }

    pub async fn store_vectors(
        &self,
        collection: &str,
        entries: Vec<(Vec<f32>, HashMap<String, String>)>,
    ) -> Result<Vec<String>, VectorDBError> {
        let mut ids = Vec::with_capacity(entries.len());
        let points: Vec<PointStruct> = entries
            .into_iter()
            .map(|(vector, payload)| {
                let point_id = Uuid::new_v4().to_string();
                ids.push(point_id.clone());
                PointStruct {
                    id: Some(PointId::from(point_id)),
                    vectors: Some(vector.into()),
                    payload: payload.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
                }
            })
            .collect();

        let upsert_points = UpsertPoints {
            collection_name: collection.to_string(),
            points,
            wait: Some(true),
            ..Default::default()
        };

        self.client
            .upsert_points(upsert_points)
            .await
            .map_err(|e| VectorDBError::Operation(e.to_string()))?;

        Ok(ids)
    }

    pub async fn search_vectors(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<ScoredPoint>, VectorDBError> {
        let request = SearchPoints {
            collection_name: collection.to_string(),
            vector: query_vector,
            limit,
            with_payload: Some(true.into()),
            ..Default::default()
        };

        let results = self.client
            .search_points(request)
            .await
            .map_err(|e| VectorDBError::Operation(e.to_string()))?;

        Ok(results.result.into_iter().map(into_scored_point).collect())
    }
}

fn into_scored_point(point: qdrant_client::qdrant::ScoredPoint) -> ScoredPoint {
    let id = point
        .id
        .and_then(|id| id.point_id_options)
        .map(|options| match options {
            qdrant_client::qdrant::point_id::PointIdOptions::Uuid(uuid) => uuid,
            qdrant_client::qdrant::point_id::PointIdOptions::Num(num) => num.to_string(),
        })
        .unwrap_or_default();

    ScoredPoint {
        id,
        score: point.score,
        payload: string_payload(point.payload),
    }
}

/// Keeps only the string-valued payload entries.
fn string_payload(payload: HashMap<String, Value>) -> HashMap<String, String> {
    payload
        .into_iter()
        .filter_map(|(key, value)| match value.kind {
            Some(Kind::StringValue(text)) => Some((key, text)),
            _ => None,
        })
        .collect()
}
