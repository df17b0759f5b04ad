// Strategy-parameterized symbol and call extraction

use tracing::{debug, warn};

use super::engine::ParserEngine;
use super::{calls, fallback, structural};
use crate::index::{CallEdge, ParsedFile, Symbol};
use crate::language::{detect_language, Language};

/// How symbols are extracted. Chosen once at startup.
#[derive(Debug, Clone)]
pub enum ExtractionStrategy {
    /// Syntax-tree extraction, with the regex tier for files it cannot handle
    Structural(ParserEngine),
    /// Regex extraction only
    Fallback,
}

impl ExtractionStrategy {
    /// Try to bring up the structural engine when `enabled`.
    ///
    /// Failure is logged once and yields `Fallback`.
    pub fn select(enabled: bool) -> Self {
        if !enabled {
            debug!("Structural parsing disabled, using regex extraction");
            return ExtractionStrategy::Fallback;
        }

        match ParserEngine::initialize(&Language::ALL) {
            Ok(engine) => {
                debug!("Structural engine ready with {} grammars", engine.grammar_count());
                ExtractionStrategy::Structural(engine)
            }
            Err(e) => {
                warn!("Structural parsing unavailable, using regex extraction: {}", e);
                ExtractionStrategy::Fallback
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExtractionStrategy::Structural(_) => "structural",
            ExtractionStrategy::Fallback => "regex",
        }
    }

    fn engine_for(&self, language: Language) -> Option<&ParserEngine> {
        match self {
            ExtractionStrategy::Structural(engine) if engine.supports(language) => Some(engine),
            _ => None,
        }
    }
}

/// Extracts symbols and call edges from single files
#[derive(Debug, Clone)]
pub struct SymbolExtractor {
    strategy: ExtractionStrategy,
}

impl SymbolExtractor {
    pub fn new(strategy: ExtractionStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &ExtractionStrategy {
        &self.strategy
    }

    /// Extract the declarations of one file. Never fails.
    pub fn extract(&self, source: &str, file_path: &str) -> ParsedFile {
        let language = detect_language(file_path, Some(source));

        let symbols = match self.structural_symbols(source, file_path, language) {
            Some(symbols) => symbols,
            None => fallback::extract_symbols(source, file_path, language),
        };

        ParsedFile {
            file_path: file_path.to_string(),
            language,
            symbols,
        }
    }

    /// Call edges from the callables of `parsed` to symbols named in `known`
    pub fn extract_calls(&self, source: &str, parsed: &ParsedFile, known: &[Symbol]) -> Vec<CallEdge> {
        if let Some(engine) = self.strategy.engine_for(parsed.language) {
            match structural::extract_calls(engine, source, &parsed.file_path, parsed.language, known) {
                Ok(edges) => return edges,
                Err(e) => debug!("Structural call extraction failed for {}: {}", parsed.file_path, e),
            }
        }
        calls::extract_calls(source, &parsed.file_path, &parsed.symbols, known)
    }

    /// `None` sends the file to the regex tier
    fn structural_symbols(&self, source: &str, file_path: &str, language: Language) -> Option<Vec<Symbol>> {
        let engine = self.strategy.engine_for(language)?;

        match structural::extract_symbols(engine, source, file_path, language) {
            Ok(found) if found.symbols.is_empty() && found.has_errors => {
                debug!("Unparseable syntax in {}, using regex extraction", file_path);
                None
            }
            Ok(found) => Some(found.symbols),
            Err(e) => {
                debug!("Structural extraction failed for {}: {}", file_path, e);
                None
            }
        }
    }
}
