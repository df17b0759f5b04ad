// Tree-sitter grammar registry

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};
use tree_sitter::{Parser, Tree};

use crate::error::EngineError;
use crate::language::Language;

/// A loaded grammar. TypeScript carries two: plain and TSX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Grammar {
    Java,
    JavaScript,
    TypeScript,
    Tsx,
    Python,
    Go,
    Rust,
}

impl Grammar {
    fn for_language(language: Language) -> &'static [Grammar] {
        match language {
            Language::Java => &[Grammar::Java],
            Language::JavaScript => &[Grammar::JavaScript],
            Language::TypeScript => &[Grammar::TypeScript, Grammar::Tsx],
            Language::Python => &[Grammar::Python],
            Language::Go => &[Grammar::Go],
            Language::Rust => &[Grammar::Rust],
            Language::CSharp | Language::Unknown => &[],
        }
    }

    fn load(self) -> tree_sitter::Language {
        match self {
            Grammar::Java => tree_sitter_java::LANGUAGE.into(),
            Grammar::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Grammar::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Grammar::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Grammar::Python => tree_sitter_python::LANGUAGE.into(),
            Grammar::Go => tree_sitter_go::LANGUAGE.into(),
            Grammar::Rust => tree_sitter_rust::LANGUAGE.into(),
        }
    }
}

/// Grammars verified once at startup.
///
/// Parsers are not shareable across threads, so one is built per parse from
/// the cached grammar.
#[derive(Clone)]
pub struct ParserEngine {
    grammars: HashMap<Grammar, tree_sitter::Language>,
}

impl std::fmt::Debug for ParserEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserEngine")
            .field("grammars", &self.grammars.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ParserEngine {
    /// Load and verify grammars for `languages`.
    ///
    /// A grammar the runtime rejects is skipped with a warning; the engine
    /// fails only when no grammar at all could be loaded.
    pub fn initialize(languages: &[Language]) -> Result<Self, EngineError> {
        let mut grammars = HashMap::new();
        let mut first_error = None;

        for &language in languages {
            for &grammar in Grammar::for_language(language) {
                let loaded = grammar.load();
                let mut parser = Parser::new();
                match parser.set_language(&loaded) {
                    Ok(()) => {
                        debug!("Loaded {:?} grammar", grammar);
                        grammars.insert(grammar, loaded);
                    }
                    Err(e) => {
                        warn!("Grammar {:?} rejected: {}", grammar, e);
                        first_error.get_or_insert(EngineError::GrammarRejected {
                            language,
                            message: e.to_string(),
                        });
                    }
                }
            }
        }

        if grammars.is_empty() {
            return Err(first_error.unwrap_or(EngineError::NoGrammar(Language::Unknown)));
        }

        Ok(Self { grammars })
    }

    /// Whether a grammar exists for `language`
    pub fn supports(&self, language: Language) -> bool {
        Grammar::for_language(language)
            .iter()
            .any(|g| self.grammars.contains_key(g))
    }

    pub fn grammar_count(&self) -> usize {
        self.grammars.len()
    }

    /// Parse `source`; `file_path` picks TSX over plain TypeScript
    pub fn parse(&self, source: &str, language: Language, file_path: &str) -> Result<Tree, EngineError> {
        let grammar = match language {
            Language::TypeScript if is_tsx(file_path) => Grammar::Tsx,
            _ => *Grammar::for_language(language)
                .first()
                .ok_or(EngineError::NoGrammar(language))?,
        };
        let loaded = self
            .grammars
            .get(&grammar)
            .ok_or(EngineError::NoGrammar(language))?;

        let mut parser = Parser::new();
        parser
            .set_language(loaded)
            .map_err(|e| EngineError::GrammarRejected {
                language,
                message: e.to_string(),
            })?;

        parser
            .parse(source, None)
            .ok_or_else(|| EngineError::ParseFailed(file_path.to_string()))
    }
}

fn is_tsx(file_path: &str) -> bool {
    Path::new(file_path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tsx"))
}
