// Ollama embedding client

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{l2_normalize, EmbeddingProvider};
use crate::error::EmbeddingError;

/// Output length of the default `nomic-embed-text` model
pub const DEFAULT_DIMENSION: usize = 768;

/// Embeddings from a local Ollama server
pub struct OllamaEmbedding {
    client: Client,
    host: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedding {
    pub fn new(host: &str, model: &str, dimension: usize) -> Self {
        Self {
            client: Client::new(),
            host: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimension,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embeddings", self.host)
    }

    async fn embed_single(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = OllamaEmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self.client.post(self.endpoint()).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Service { status, body });
        }

        let parsed: OllamaEmbeddingResponse = response.json().await?;
        if parsed.embedding.len() != self.dimension {
            return Err(EmbeddingError::Dimension {
                expected: self.dimension,
                actual: parsed.embedding.len(),
            });
        }

        let mut vector = parsed.embedding;
        l2_normalize(&mut vector);
        Ok(vector)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OllamaEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_single(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        // No batch endpoint; one request per text
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed_single(text).await?);
        }
        debug!("Ollama embedded {} texts with {}", texts.len(), self.model);
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
