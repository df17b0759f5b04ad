// Go patterns

use once_cell::sync::Lazy;
use regex::Regex;

use super::{body_end, Declaration, Quotes};
use crate::index::{Parameter, SymbolKind, Visibility};
use crate::indexer::text::split_top_level;

static TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^type\s+(?P<name>[A-Za-z_]\w*)(?:\[[^\]]*\])?\s+(?:struct|interface)\s*\{").unwrap()
});

static FUNC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^func\s*(?:\((?P<recv>[^)]*)\)\s*)?(?P<name>[A-Za-z_]\w*)\s*(?:\[[^\]]*\])?\s*\((?P<params>[^)]*)\)\s*(?P<ret>[^{\n]*?)\s*\{").unwrap()
});

pub(super) fn scan(source: &str) -> Vec<Declaration> {
    // Backtick raw strings are handled as strings; runes use single quotes
    let quotes = Quotes::CharLiterals;
    let mut declarations = Vec::new();

    for caps in TYPE_RE.captures_iter(source) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
            continue;
        };
        let open = whole.end() - 1;
        declarations.push(Declaration {
            name: name.as_str().to_string(),
            kind: SymbolKind::Class,
            start: whole.start(),
            header_end: open,
            end: body_end(source, whole.start(), open, quotes),
            parameters: Vec::new(),
            return_type: None,
            visibility: visibility_of(name.as_str()),
            is_static: false,
        });
    }

    for caps in FUNC_RE.captures_iter(source) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
            continue;
        };
        let open = whole.end() - 1;
        let is_method = caps.name("recv").is_some();

        declarations.push(Declaration {
            name: name.as_str().to_string(),
            kind: if is_method {
                SymbolKind::Method
            } else {
                SymbolKind::Function
            },
            start: whole.start(),
            header_end: open,
            end: body_end(source, whole.start(), open, quotes),
            parameters: split_go_params(caps.name("params").map_or("", |m| m.as_str())),
            return_type: caps
                .name("ret")
                .map(|m| m.as_str().trim().to_string())
                .filter(|r| !r.is_empty()),
            visibility: visibility_of(name.as_str()),
            is_static: false,
        });
    }

    declarations
}

/// Parse `a, b int, opts ...Option`: names come first and a bare name takes
/// the type of the next typed entry. A list of bare words is a list of types.
pub(crate) fn split_go_params(list: &str) -> Vec<Parameter> {
    let pieces: Vec<(String, Option<String>)> = split_top_level(list)
        .into_iter()
        .map(|piece| match piece.split_once(char::is_whitespace) {
            Some((name, type_name)) => (name.to_string(), Some(type_name.trim().to_string())),
            None => (piece.to_string(), None),
        })
        .collect();

    if pieces.iter().all(|(_, t)| t.is_none()) {
        return pieces
            .into_iter()
            .map(|(type_name, _)| Parameter::new("", type_name))
            .collect();
    }

    let mut parameters = Vec::with_capacity(pieces.len());
    let mut pending_type = String::new();
    for (name, type_name) in pieces.into_iter().rev() {
        if let Some(t) = type_name {
            pending_type = t;
        }
        parameters.push(Parameter::new(name, pending_type.clone()));
    }
    parameters.reverse();
    parameters
}

/// Exported identifiers start with an upper-case letter
pub(crate) fn visibility_of(name: &str) -> Visibility {
    if name.starts_with(|c: char| c.is_ascii_uppercase()) {
        Visibility::Public
    } else {
        Visibility::Package
    }
}
