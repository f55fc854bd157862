use qdrant_client::Qdrant;
use std::time::Duration;
use super::vector_db::VectorDBError;

/// Normalizes a Qdrant URL for the gRPC client: defaults the scheme to
/// `http` and swaps the REST port 6333 for the gRPC port 6334.
pub fn grpc_url(url: &str) -> String {
    let (scheme, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("http", url),
    };

    let rest = rest.trim_end_matches('/');
    let rest = match rest.strip_suffix(":6333") {
        Some(host) => format!("{}:6334", host),
        None => rest.to_string(),
    };

    format!("{}://{}", scheme, rest)
}

pub fn create_qdrant_client(url: &str, api_key: &str, timeout: Duration) -> Result<Qdrant, VectorDBError> {
    let url = grpc_url(url);
    log::info!("Configuring Qdrant client for {}", url);

    Qdrant::from_url(&url)
        .api_key(api_key.to_string())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .build()
        .map_err(|e| VectorDBError::Connection(e.to_string()))
}
