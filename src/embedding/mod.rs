// Symbol embeddings

pub mod hash;
pub mod ollama;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{EmbeddingConfig, EmbeddingProviderKind};
use crate::duplicates::similarity::normalize_body;
use crate::error::EmbeddingError;
use crate::index::Symbol;

pub use hash::HashEmbedding;
pub use ollama::OllamaEmbedding;

/// A symbol paired with its vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub symbol: Symbol,
    pub vector: Vec<f32>,
}

impl Embedding {
    pub fn symbol_id(&self) -> String {
        self.symbol.id()
    }
}

/// Something that turns text into a fixed-length vector
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
    fn dimension(&self) -> usize;
    fn name(&self) -> &str;
}

/// Cosine similarity of two vectors.
///
/// Returns 0.0 for mismatched lengths or when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Scale a vector to unit length in place; zero vectors are left alone
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Text a symbol is embedded from: name, signature and normalized body
pub fn symbol_text(symbol: &Symbol) -> String {
    let body = normalize_body(symbol).join("\n");
    format!("{}\n{}\n{}", symbol.name, symbol.signature, body)
}

/// Embeds symbols through an optional external provider, falling back to
/// the deterministic hash embedding.
#[derive(Clone)]
pub struct EmbeddingGenerator {
    external: Option<Arc<dyn EmbeddingProvider>>,
    fallback: HashEmbedding,
    warned: Arc<AtomicBool>,
}

impl EmbeddingGenerator {
    pub fn new(external: Option<Arc<dyn EmbeddingProvider>>, dimension: usize) -> Self {
        Self {
            external,
            fallback: HashEmbedding::new(dimension),
            warned: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Hash-only generator
    pub fn hash_only(dimension: usize) -> Self {
        Self::new(None, dimension)
    }

    pub fn from_config(config: &EmbeddingConfig) -> Self {
        let external: Option<Arc<dyn EmbeddingProvider>> = match config.provider {
            EmbeddingProviderKind::Hash => None,
            EmbeddingProviderKind::Ollama => Some(Arc::new(OllamaEmbedding::new(
                &config.host,
                &config.model,
                config.dimension(),
            ))),
        };
        Self::new(external, config.dimension())
    }

    /// Whether a real semantic model backs this generator
    pub fn has_semantic_source(&self) -> bool {
        self.external.is_some()
    }

    pub fn dimension(&self) -> usize {
        self.fallback.dimension()
    }

    pub fn provider_name(&self) -> &str {
        match &self.external {
            Some(provider) => provider.name(),
            None => self.fallback.name(),
        }
    }

    /// Hash embedding of a symbol, never consulting the external provider
    pub fn hash_embed_symbol(&self, symbol: &Symbol) -> Embedding {
        Embedding {
            symbol: symbol.clone(),
            vector: self.fallback.embed_text(&symbol_text(symbol)),
        }
    }

    /// Embed one symbol. External failures degrade to the hash embedding.
    pub async fn embed_symbol(&self, symbol: &Symbol) -> Embedding {
        let text = symbol_text(symbol);
        let vector = match &self.external {
            Some(provider) => match provider.embed(&text).await {
                Ok(vector) => vector,
                Err(e) => {
                    self.warn_fallback(&e);
                    self.fallback.embed_text(&text)
                }
            },
            None => self.fallback.embed_text(&text),
        };

        Embedding {
            symbol: symbol.clone(),
            vector,
        }
    }

    /// Vector from the external provider only; `None` without one or on failure
    pub async fn semantic_vector(&self, symbol: &Symbol) -> Option<Vec<f32>> {
        let provider = self.external.as_ref()?;
        match provider.embed(&symbol_text(symbol)).await {
            Ok(vector) => Some(vector),
            Err(e) => {
                self.warn_fallback(&e);
                None
            }
        }
    }

    /// Embed many symbols, preserving order
    pub async fn embed_symbols(&self, symbols: &[Symbol]) -> Vec<Embedding> {
        let texts: Vec<String> = symbols.iter().map(symbol_text).collect();

        let vectors = match &self.external {
            Some(provider) => {
                let refs: Vec<&str> = texts.iter().map(|t| t.as_str()).collect();
                match provider.embed_batch(&refs).await {
                    Ok(vectors) if vectors.len() == texts.len() => vectors,
                    Ok(vectors) => {
                        self.warn_fallback(&EmbeddingError::Dimension {
                            expected: texts.len(),
                            actual: vectors.len(),
                        });
                        self.hash_all(&texts)
                    }
                    Err(e) => {
                        self.warn_fallback(&e);
                        self.hash_all(&texts)
                    }
                }
            }
            None => self.hash_all(&texts),
        };

        debug!("Embedded {} symbols with {}", symbols.len(), self.provider_name());

        symbols
            .iter()
            .cloned()
            .zip(vectors)
            .map(|(symbol, vector)| Embedding { symbol, vector })
            .collect()
    }

    fn hash_all(&self, texts: &[String]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| self.fallback.embed_text(t)).collect()
    }

    fn warn_fallback(&self, error: &EmbeddingError) {
        if !self.warned.swap(true, Ordering::Relaxed) {
            warn!("Embedding provider failed, using hash embeddings: {}", error);
        } else {
            debug!("Embedding provider failed again: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::test_support::method;
    use proptest::prelude::*;

    struct FailingProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for FailingProvider {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Service {
                status: 503,
                body: "unavailable".to_string(),
            })
        }

        async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Err(EmbeddingError::Service {
                status: 503,
                body: "unavailable".to_string(),
            })
        }

        fn dimension(&self) -> usize {
            8
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_cosine_edge_cases() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_external_failure_falls_back_to_hash() {
        let generator = EmbeddingGenerator::new(Some(Arc::new(FailingProvider)), 64);
        let symbol = method("total", "Cart.java", 1, "int total() { return a + b; }");

        let embedding = generator.embed_symbol(&symbol).await;
        assert_eq!(embedding.vector.len(), 64);
        assert_eq!(embedding, generator.hash_embed_symbol(&symbol));
        assert!(generator.has_semantic_source());
        assert!(generator.semantic_vector(&symbol).await.is_none());

        let batch = generator.embed_symbols(&[symbol.clone(), symbol]).await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].vector, batch[1].vector);
    }

    #[tokio::test]
    async fn test_hash_only_generator() {
        let generator = EmbeddingGenerator::hash_only(128);
        assert!(!generator.has_semantic_source());
        assert_eq!(generator.provider_name(), "hash");
        assert!(generator.semantic_vector(&method("f", "F.java", 1, "")).await.is_none());

        let symbol = method("load", "Repo.java", 3, "void load() { read(); }");
        let embedding = generator.embed_symbol(&symbol).await;
        assert_eq!(embedding.symbol_id(), "Repo.java:load:3");
        assert_eq!(embedding.vector.len(), 128);
    }

    proptest! {
        #[test]
        fn prop_cosine_symmetric(a in prop::collection::vec(-10.0f32..10.0, 16),
                                 b in prop::collection::vec(-10.0f32..10.0, 16)) {
            let ab = cosine_similarity(&a, &b);
            let ba = cosine_similarity(&b, &a);
            prop_assert!((ab - ba).abs() < 1e-5);
            prop_assert!((-1.0..=1.0).contains(&ab));
        }

        #[test]
        fn prop_cosine_self_is_one(a in prop::collection::vec(0.1f32..10.0, 16)) {
            prop_assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-4);
        }
    }
}
