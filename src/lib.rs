//! Symbol extraction, call-graph indexing and duplicate detection for code
//! review.
//!
//! Source files are extracted into symbols and call edges (`indexer`),
//! accumulated in a `CodeIndex` (`index`), embedded (`embedding`) into a
//! vector store (`vector`), and compared by the `DuplicateDetector`
//! (`duplicates`), either within a change or against the indexed codebase.

pub mod config;
pub mod diff;
pub mod duplicates;
pub mod embedding;
pub mod error;
pub mod index;
pub mod indexer;
pub mod language;
pub mod query;
pub mod vector;

pub use config::Config;
pub use duplicates::{DuplicateDetector, DuplicateMatch, MatchType};
pub use embedding::{Embedding, EmbeddingGenerator, EmbeddingProvider};
pub use index::{CallEdge, CodeIndex, ParsedFile, Symbol, SymbolKind, Visibility};
pub use indexer::{ExtractionStrategy, Indexer, SymbolExtractor};
pub use language::{detect_language, Language};
pub use vector::{FlatVectorStore, VectorIndex};
