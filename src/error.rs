use thiserror::Error;

use crate::language::Language;

/// Failures of the grammar-driven parsing engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Grammar for {language} rejected: {message}")]
    GrammarRejected { language: Language, message: String },

    #[error("No grammar loaded for {0}")]
    NoGrammar(Language),

    #[error("Parser produced no tree for {0}")]
    ParseFailed(String),
}

/// Failures of an embedding source
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding service error ({status}): {body}")]
    Service { status: u16, body: String },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },
}
