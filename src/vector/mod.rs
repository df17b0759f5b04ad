// Vector storage and similarity search

use parking_lot::RwLock;
use tracing::debug;

use crate::embedding::{cosine_similarity, Embedding};

/// One search hit
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub embedding: Embedding,
    pub similarity: f32,
}

/// Storage of symbol embeddings with similarity search.
///
/// Implementations must be safe to share between tasks.
pub trait VectorIndex: Send + Sync {
    fn store(&self, embedding: Embedding);

    fn store_batch(&self, embeddings: Vec<Embedding>) {
        for embedding in embeddings {
            self.store(embedding);
        }
    }

    /// Entries with similarity >= `threshold`, best first, at most `limit`
    fn find_similar(&self, vector: &[f32], limit: usize, threshold: f32) -> Vec<VectorMatch>;

    /// Like `find_similar`, using the stored vector of `symbol_id` and
    /// excluding that symbol. Unknown ids give an empty result.
    fn find_similar_to_symbol(&self, symbol_id: &str, limit: usize, threshold: f32) -> Vec<VectorMatch>;

    fn get_by_file(&self, file_path: &str) -> Vec<Embedding>;

    fn all(&self) -> Vec<Embedding>;

    fn clear(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exhaustive linear-scan store
#[derive(Debug, Default)]
pub struct FlatVectorStore {
    entries: RwLock<Vec<Embedding>>,
}

impl FlatVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_embeddings(embeddings: Vec<Embedding>) -> Self {
        Self {
            entries: RwLock::new(embeddings),
        }
    }

    fn search(
        &self,
        vector: &[f32],
        limit: usize,
        threshold: f32,
        exclude_id: Option<&str>,
    ) -> Vec<VectorMatch> {
        let entries = self.entries.read();

        let mut matches: Vec<VectorMatch> = entries
            .iter()
            .filter(|e| exclude_id.map_or(true, |id| e.symbol.id() != id))
            .filter_map(|e| {
                let similarity = cosine_similarity(vector, &e.vector);
                (similarity >= threshold).then(|| VectorMatch {
                    embedding: e.clone(),
                    similarity,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        matches.truncate(limit);

        debug!("Vector search over {} entries: {} hits", entries.len(), matches.len());
        matches
    }
}

impl VectorIndex for FlatVectorStore {
    fn store(&self, embedding: Embedding) {
        self.entries.write().push(embedding);
    }

    fn store_batch(&self, embeddings: Vec<Embedding>) {
        self.entries.write().extend(embeddings);
    }

    fn find_similar(&self, vector: &[f32], limit: usize, threshold: f32) -> Vec<VectorMatch> {
        self.search(vector, limit, threshold, None)
    }

    fn find_similar_to_symbol(&self, symbol_id: &str, limit: usize, threshold: f32) -> Vec<VectorMatch> {
        let query = {
            let entries = self.entries.read();
            match entries.iter().find(|e| e.symbol.id() == symbol_id) {
                Some(e) => e.vector.clone(),
                None => {
                    debug!("No stored embedding for {}", symbol_id);
                    return Vec::new();
                }
            }
        };

        self.search(&query, limit, threshold, Some(symbol_id))
    }

    fn get_by_file(&self, file_path: &str) -> Vec<Embedding> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.symbol.file == file_path)
            .cloned()
            .collect()
    }

    fn all(&self) -> Vec<Embedding> {
        self.entries.read().clone()
    }

    fn clear(&self) {
        self.entries.write().clear();
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::test_support::method;

    fn entry(name: &str, file: &str, vector: Vec<f32>) -> Embedding {
        Embedding {
            symbol: method(name, file, 1, "void x() {}"),
            vector,
        }
    }

    fn store() -> FlatVectorStore {
        FlatVectorStore::with_embeddings(vec![
            entry("a", "A.java", vec![1.0, 0.0]),
            entry("b", "B.java", vec![0.9, 0.1]),
            entry("c", "C.java", vec![0.0, 1.0]),
        ])
    }

    #[test]
    fn test_find_similar_orders_and_thresholds() {
        let store = store();
        let hits = store.find_similar(&[1.0, 0.0], 10, 0.5);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].embedding.symbol.name, "a");
        assert_eq!(hits[1].embedding.symbol.name, "b");
        assert!(hits[0].similarity >= hits[1].similarity);
    }

    #[test]
    fn test_find_similar_respects_limit() {
        let hits = store().find_similar(&[1.0, 1.0], 1, -1.0);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_find_similar_to_symbol_excludes_self() {
        let store = store();
        let hits = store.find_similar_to_symbol("A.java:a:1", 10, 0.5);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].embedding.symbol.name, "b");
    }

    #[test]
    fn test_find_similar_to_unknown_symbol_is_empty() {
        assert!(store().find_similar_to_symbol("Nope.java:x:1", 10, 0.0).is_empty());
    }

    #[test]
    fn test_get_by_file_and_clear() {
        let store = store();
        store.store(entry("d", "A.java", vec![0.5, 0.5]));

        assert_eq!(store.get_by_file("A.java").len(), 2);
        assert_eq!(store.len(), 4);

        store.clear();
        assert!(store.is_empty());
        assert!(store.all().is_empty());
    }
}
