// Index data model and storage

pub mod code_index;
pub mod db;
pub mod schema;

use serde::{Deserialize, Serialize};

use crate::language::Language;

pub use code_index::{CodeIndex, IndexStats};

/// A declared program element (class, method, function, constructor, field)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub file: String,
    pub language: Language,
    /// 1-based, inclusive
    pub start_line: usize,
    /// 1-based, inclusive. May be an estimate when produced by the regex tier.
    pub end_line: usize,
    pub signature: String,
    pub return_type: Option<String>,
    pub parameters: Vec<Parameter>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub raw_code: String,
}

impl Symbol {
    /// Identity used by stores and reports
    pub fn id(&self) -> String {
        format!("{}:{}:{}", self.file, self.name, self.start_line)
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Method | SymbolKind::Function | SymbolKind::Constructor
        )
    }

    /// Whether this symbol can be the target of a call edge
    pub fn is_call_target(&self) -> bool {
        matches!(self.kind, SymbolKind::Method | SymbolKind::Function)
    }

    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}

/// A single declared parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Symbol kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Class,
    Method,
    Function,
    Constructor,
    Variable,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Function => "function",
            SymbolKind::Constructor => "constructor",
            SymbolKind::Variable => "variable",
        }
    }

    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "class" => Ok(SymbolKind::Class),
            "method" => Ok(SymbolKind::Method),
            "function" => Ok(SymbolKind::Function),
            "constructor" => Ok(SymbolKind::Constructor),
            "variable" => Ok(SymbolKind::Variable),
            _ => anyhow::bail!("Unknown symbol kind: {}", s),
        }
    }
}

/// Visibility levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Protected,
    Package,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Protected => "protected",
            Visibility::Package => "package",
        }
    }

    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            "protected" => Ok(Visibility::Protected),
            "package" => Ok(Visibility::Package),
            _ => anyhow::bail!("Unknown visibility: {}", s),
        }
    }

    /// Parse a modifier keyword, e.g. `public` or `internal`
    pub fn from_modifier(modifier: &str) -> Option<Self> {
        match modifier {
            "public" | "pub" | "export" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            "protected" => Some(Visibility::Protected),
            "internal" => Some(Visibility::Package),
            _ => None,
        }
    }
}

/// A directed caller -> callee relationship between symbol names.
///
/// Endpoints are names and may not resolve to a known symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller: String,
    pub callee: String,
    pub file: String,
    pub line: usize,
}

/// Output of one extraction pass over a file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedFile {
    pub file_path: String,
    pub language: Language,
    pub symbols: Vec<Symbol>,
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::test_support::method;

    #[test]
    fn test_symbol_id_includes_position() {
        let symbol = method("run", "src/Job.java", 12, "void run() {}");
        assert_eq!(symbol.id(), "src/Job.java:run:12");
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            SymbolKind::Class,
            SymbolKind::Method,
            SymbolKind::Function,
            SymbolKind::Constructor,
            SymbolKind::Variable,
        ] {
            assert_eq!(SymbolKind::from_str(kind.as_str()).unwrap(), kind);
        }
        assert!(SymbolKind::from_str("module").is_err());
    }

    #[test]
    fn test_visibility_from_modifier() {
        assert_eq!(Visibility::from_modifier("pub"), Some(Visibility::Public));
        assert_eq!(Visibility::from_modifier("internal"), Some(Visibility::Package));
        assert_eq!(Visibility::from_modifier("static"), None);
    }

    #[test]
    fn test_constructor_is_not_call_target() {
        let mut symbol = method("Widget", "Widget.java", 1, "Widget() {}");
        symbol.kind = SymbolKind::Constructor;
        assert!(symbol.is_callable());
        assert!(!symbol.is_call_target());
    }
}
