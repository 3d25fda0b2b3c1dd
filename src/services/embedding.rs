use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while producing embeddings
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Embedding provider returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Expected {expected} embeddings, got {actual}")]
    BatchSizeMismatch { expected: usize, actual: usize },

    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Embedding service unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Text embedding collaborator
///
/// Implementations must be deterministic for identical input within a
/// process and return vectors of one fixed dimension. They are shared across
/// request threads, so any internal mutable state has to be synchronized by
/// the implementation itself.
pub trait Embedder: Send + Sync {
    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed many texts in one round trip, preserving input order
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Embedding client for OpenAI-compatible `/embeddings` endpoints
///
/// Uses a blocking HTTP client: callers on an async runtime must run it on a
/// blocking thread.
pub struct HttpEmbedder {
    url: String,
    api_key: Option<String>,
    model: String,
    dimensions: Option<usize>,
    client: Client,
}

impl HttpEmbedder {
    /// Create a new embedding client
    pub fn new(
        api_base: &str,
        path: &str,
        model: String,
        api_key: Option<String>,
        dimensions: Option<usize>,
        timeout_ms: u64,
    ) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;

        let url = format!("{}{}", api_base.trim_end_matches('/'), path);

        Ok(Self {
            url,
            api_key: api_key.filter(|k| !k.is_empty()),
            model,
            dimensions,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        if let Some(dimensions) = self.dimensions {
            body["dimensions"] = Value::from(dimensions);
        }

        tracing::debug!("Requesting {} embeddings from {}", texts.len(), self.url);

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(EmbeddingError::ApiError(format!("{}: {}", status, detail)));
        }

        let json: Value = response.json()?;
        let embeddings = parse_embedding_response(json)?;

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::BatchSizeMismatch {
                expected: texts.len(),
                actual: embeddings.len(),
            });
        }

        if let Some(expected) = self.dimensions {
            if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
                return Err(EmbeddingError::InvalidDimension {
                    expected,
                    actual: bad.len(),
                });
            }
        }

        Ok(embeddings)
    }
}

impl Embedder for HttpEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.request(&[text.to_string()])?
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidResponse("No embedding returned".into()))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts)
    }
}

/// Extract `data[].embedding` ordered by `data[].index`
fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| EmbeddingError::InvalidResponse("Missing data array".into()))?;

    let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
    for (fallback_index, item) in data.iter().enumerate() {
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(fallback_index);

        let values = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| EmbeddingError::InvalidResponse("Item missing embedding array".into()))?;

        let embedding = values
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| EmbeddingError::InvalidResponse("Embedding value must be numeric".into()))
            })
            .collect::<Result<Vec<f32>, _>>()?;

        indexed.push((index, embedding));
    }

    indexed.sort_by_key(|(index, _)| *index);

    // Indices must be exactly 0..n once sorted
    if let Some((position, (index, _))) = indexed
        .iter()
        .enumerate()
        .find(|(position, (index, _))| position != index)
    {
        return Err(EmbeddingError::InvalidResponse(format!(
            "Unexpected embedding index {} at position {}",
            index, position
        )));
    }

    Ok(indexed.into_iter().map(|(_, embedding)| embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_embeddings_in_index_order() {
        let json = serde_json::json!({
            "data": [
                { "index": 1, "embedding": [2.0, 3.0] },
                { "index": 0, "embedding": [0.5, 1.5] }
            ]
        });

        let parsed = parse_embedding_response(json).unwrap();

        assert_eq!(parsed, vec![vec![0.5, 1.5], vec![2.0, 3.0]]);
    }

    #[test]
    fn test_rejects_missing_data() {
        let json = serde_json::json!({ "error": "nope" });
        assert!(matches!(
            parse_embedding_response(json),
            Err(EmbeddingError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_indices() {
        let json = serde_json::json!({
            "data": [
                { "index": 0, "embedding": [1.0] },
                { "index": 0, "embedding": [2.0] }
            ]
        });
        assert!(matches!(
            parse_embedding_response(json),
            Err(EmbeddingError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_indices() {
        let json = serde_json::json!({
            "data": [
                { "index": 0, "embedding": [1.0] },
                { "index": 5, "embedding": [2.0] }
            ]
        });
        assert!(matches!(
            parse_embedding_response(json),
            Err(EmbeddingError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_rejects_non_numeric_values() {
        let json = serde_json::json!({ "data": [{ "index": 0, "embedding": ["a"] }] });
        assert!(parse_embedding_response(json).is_err());
    }

    #[test]
    fn test_http_embedder_batch() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/embeddings")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":[{"index":0,"embedding":[1.0,0.0]},{"index":1,"embedding":[0.0,1.0]}]}"#,
            )
            .create();

        let embedder = HttpEmbedder::new(
            &server.url(),
            "/v1/embeddings",
            "test-model".to_string(),
            Some("test-key".to_string()),
            Some(2),
            5_000,
        )
        .unwrap();

        let texts = vec!["housing".to_string(), "farming".to_string()];
        let embeddings = embedder.embed_batch(&texts).unwrap();

        mock.assert();
        assert_eq!(embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_http_embedder_surfaces_api_errors() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/v1/embeddings")
            .with_status(503)
            .with_body("overloaded")
            .create();

        let embedder = HttpEmbedder::new(
            &server.url(),
            "/v1/embeddings",
            "test-model".to_string(),
            None,
            None,
            5_000,
        )
        .unwrap();

        let err = embedder.embed("housing").unwrap_err();
        assert!(matches!(err, EmbeddingError::ApiError(ref msg) if msg.contains("503")));
    }

    #[test]
    fn test_http_embedder_checks_batch_size() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/v1/embeddings")
            .with_status(200)
            .with_body(r#"{"data":[{"index":0,"embedding":[1.0]}]}"#)
            .create();

        let embedder = HttpEmbedder::new(
            &server.url(),
            "/v1/embeddings",
            "test-model".to_string(),
            None,
            None,
            5_000,
        )
        .unwrap();

        let texts = vec!["a".to_string(), "b".to_string()];
        assert!(matches!(
            embedder.embed_batch(&texts),
            Err(EmbeddingError::BatchSizeMismatch { expected: 2, actual: 1 })
        ));
    }
}
