// Duplicate and near-duplicate symbol detection

pub mod filters;
pub mod similarity;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{Config, DetectionConfig};
use crate::embedding::{cosine_similarity, EmbeddingGenerator};
use crate::index::{CodeIndex, Symbol};
use crate::vector::VectorIndex;

use filters::{exclusion, is_comparable};
use similarity::{logic_divergence, structural_similarity, NormalizedSymbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Similar,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Similar => "similar",
        }
    }
}

/// A reported pair. `symbol1` is the symbol under review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateMatch {
    pub symbol1: Symbol,
    pub symbol2: Symbol,
    pub similarity: f32,
    pub match_type: MatchType,
    pub reason: String,
}

#[derive(Debug, Clone, Copy)]
enum Basis {
    Semantic,
    /// Cosine of hash embeddings
    Lexical,
    Structural,
}

impl Basis {
    fn as_str(self) -> &'static str {
        match self {
            Basis::Semantic => "semantic",
            Basis::Lexical => "lexical",
            Basis::Structural => "structural",
        }
    }
}

/// Finds duplicates within a change and against an indexed codebase
pub struct DuplicateDetector {
    config: DetectionConfig,
    embeddings: EmbeddingGenerator,
}

impl DuplicateDetector {
    pub fn new(config: DetectionConfig, embeddings: EmbeddingGenerator) -> Self {
        Self { config, embeddings }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.detection.clone(),
            EmbeddingGenerator::from_config(&config.embedding),
        )
    }

    pub fn embeddings(&self) -> &EmbeddingGenerator {
        &self.embeddings
    }

    /// All-pairs comparison of the symbols a change introduces.
    ///
    /// Pairs are scored by embedding cosine when a semantic provider is
    /// configured and both vectors are available, structurally otherwise.
    /// Only pairs strictly above the report threshold are returned.
    pub async fn find_within_change(&self, symbols: &[Symbol]) -> Vec<DuplicateMatch> {
        let candidates: Vec<&Symbol> = symbols.iter().filter(|s| is_comparable(s)).collect();

        let mut vectors: Vec<Option<Vec<f32>>> = Vec::with_capacity(candidates.len());
        for symbol in &candidates {
            let vector = if self.embeddings.has_semantic_source() {
                self.embeddings.semantic_vector(symbol).await
            } else {
                None
            };
            vectors.push(vector);
        }

        let mut matches = Vec::new();
        for i in 0..candidates.len() {
            for j in (i + 1)..candidates.len() {
                let (a, b) = (candidates[i], candidates[j]);
                if let Some(reason) = exclusion(a, b) {
                    debug!("Skipping {} / {}: {:?}", a.id(), b.id(), reason);
                    continue;
                }

                let found = match (&vectors[i], &vectors[j]) {
                    (Some(va), Some(vb)) => self.evaluate(a, b, cosine_similarity(va, vb), Basis::Semantic),
                    _ => self.evaluate(a, b, structural_similarity(a, b), Basis::Structural),
                };
                if found.similarity > self.config.report_threshold {
                    matches.push(found);
                }
            }
        }

        info!(
            "Within-change detection: {} matches among {} symbols",
            matches.len(),
            candidates.len()
        );
        matches
    }

    /// Compare each changed symbol against an indexed codebase.
    ///
    /// Candidates come from the vector store and from a direct scan of the
    /// index; a candidate found both ways keeps its higher score. At most
    /// `cross_repo_limit` matches are kept per changed symbol, and the result
    /// is ordered best first.
    pub async fn find_cross_repository(
        &self,
        changed: &[Symbol],
        index: &CodeIndex,
        store: &dyn VectorIndex,
    ) -> Vec<DuplicateMatch> {
        let threshold = self.config.cross_repo_threshold;
        let limit = self.config.cross_repo_limit;
        let mut matches = Vec::new();

        for symbol in changed.iter().filter(|s| is_comparable(s)) {
            let id = symbol.id();
            let normalized = NormalizedSymbol::new(symbol);
            let mut candidates: HashMap<String, (Symbol, f32, Basis)> = HashMap::new();
            let mut offer = |candidate: &Symbol, score: f32, basis: Basis| {
                if score < threshold || candidate.id() == id || exclusion(symbol, candidate).is_some() {
                    return;
                }
                let entry = candidates
                    .entry(candidate.id())
                    .or_insert_with(|| (candidate.clone(), score, basis));
                if score > entry.1 {
                    entry.1 = score;
                    entry.2 = basis;
                }
            };

            if !store.is_empty() {
                let query = self.embeddings.embed_symbol(symbol).await;
                let basis = if self.embeddings.has_semantic_source() {
                    Basis::Semantic
                } else {
                    Basis::Lexical
                };
                for hit in store.find_similar(&query.vector, limit.saturating_mul(2), threshold) {
                    offer(&hit.embedding.symbol, hit.similarity, basis);
                }
            }

            for candidate in index.symbols() {
                if candidate.kind != symbol.kind || candidate.language != symbol.language {
                    continue;
                }
                offer(candidate, normalized.similarity_to(candidate), Basis::Structural);
            }

            let mut found: Vec<DuplicateMatch> = candidates
                .into_values()
                .map(|(candidate, score, basis)| self.evaluate(symbol, &candidate, score, basis))
                .filter(|m| m.similarity >= threshold)
                .collect();
            found.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
            found.truncate(limit);
            matches.extend(found);
        }

        matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        info!(
            "Cross-repository detection: {} matches for {} changed symbols",
            matches.len(),
            changed.len()
        );
        matches
    }

    /// Structural score of one pair, `None` when the pair is excluded
    pub fn compare_structural(&self, a: &Symbol, b: &Symbol) -> Option<DuplicateMatch> {
        if exclusion(a, b).is_some() {
            return None;
        }
        Some(self.evaluate(a, b, structural_similarity(a, b), Basis::Structural))
    }

    /// Classify a raw score. Exact-looking pairs whose logic diverges are
    /// capped and reported as similar.
    fn evaluate(&self, a: &Symbol, b: &Symbol, score: f32, basis: Basis) -> DuplicateMatch {
        let score = score.clamp(0.0, 1.0);

        let (similarity, match_type, reason) = if score > self.config.exact_threshold {
            match logic_divergence(a, b, self.config.token_overlap_floor) {
                Some(why) => (
                    score.min(self.config.divergence_cap),
                    MatchType::Similar,
                    format!("{} match with different logic: {}", basis.as_str(), why),
                ),
                None => (score, MatchType::Exact, format!("{} match", basis.as_str())),
            }
        } else {
            (
                score,
                MatchType::Similar,
                format!("{} similarity {:.2}", basis.as_str(), score),
            )
        };

        DuplicateMatch {
            symbol1: a.clone(),
            symbol2: b.clone(),
            similarity,
            match_type,
            reason,
        }
    }
}
