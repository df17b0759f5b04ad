// Deterministic hash embedding

use once_cell::sync::Lazy;
use regex::Regex;

use super::{l2_normalize, EmbeddingProvider};
use crate::error::EmbeddingError;

pub const DEFAULT_DIMENSION: usize = 256;

const FNV_OFFSET: u32 = 0x811c_9dc5;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*|[0-9]+(?:\.[0-9]+)?|[^\sA-Za-z0-9_$]+").unwrap());

/// Feature-hashing embedding over tokens and character trigrams.
///
/// Identical text always maps to an identical vector. Similar text maps to
/// nearby vectors only lexically; there is no semantic understanding.
#[derive(Debug, Clone)]
pub struct HashEmbedding {
    dimension: usize,
}

impl Default for HashEmbedding {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl HashEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn name(&self) -> &str {
        "hash"
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in TOKEN_RE.find_iter(text) {
            let token = token.as_str().to_lowercase();
            self.accumulate(&mut vector, rolling_hash(&token), 1.0);

            let chars: Vec<char> = token.chars().collect();
            for trigram in chars.windows(3) {
                let h = trigram.iter().fold(FNV_OFFSET, |h, c| {
                    h.wrapping_mul(31).wrapping_add(*c as u32)
                });
                self.accumulate(&mut vector, h, 0.5);
            }
        }

        l2_normalize(&mut vector);
        vector
    }

    fn accumulate(&self, vector: &mut [f32], hash: u32, weight: f32) {
        let bucket = (hash as usize) % self.dimension;
        // The top bit picks the sign so collisions partially cancel
        let sign = if hash & 0x8000_0000 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

/// `h = h * 31 + code` over the token's characters, seeded with the FNV offset
fn rolling_hash(token: &str) -> u32 {
    token
        .chars()
        .fold(FNV_OFFSET, |h, c| h.wrapping_mul(31).wrapping_add(c as u32))
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hash"
    }
}
