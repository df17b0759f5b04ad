// Regex extraction tier

pub(crate) mod go;
pub(crate) mod java;
pub(crate) mod javascript;
pub(crate) mod python;
pub(crate) mod rust;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::text::{line_at, line_count, render_signature};
use crate::index::{Parameter, Symbol, SymbolKind, Visibility};
use crate::language::Language;

/// Lines assumed for a body whose closing brace is never found
pub const ESTIMATED_BODY_LINES: usize = 10;

/// Words that look like `name(` but are never declarations or calls
pub(crate) const KEYWORDS: &[&str] = &[
    "if", "else", "for", "foreach", "while", "do", "switch", "case", "catch", "try", "finally",
    "return", "new", "throw", "throws", "sizeof", "typeof", "instanceof", "super", "this",
    "function", "fn", "def", "lambda", "await", "yield", "using", "lock", "fixed", "match",
    "loop", "with", "assert", "elif", "except", "synchronized", "select", "go", "defer",
];

static LEADING_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*").unwrap());

/// Extract symbols from source text with per-language patterns.
///
/// Never fails; text the patterns do not recognize simply yields nothing.
pub fn extract_symbols(source: &str, file_path: &str, language: Language) -> Vec<Symbol> {
    let declarations = match language {
        Language::Java | Language::CSharp | Language::Unknown => java::scan(source, language),
        Language::JavaScript | Language::TypeScript => javascript::scan(source),
        Language::Python => python::scan(source),
        Language::Go => go::scan(source),
        Language::Rust => rust::scan(source),
    };

    let mut symbols: Vec<Symbol> = declarations
        .into_iter()
        .map(|decl| decl.into_symbol(source, file_path, language))
        .collect();
    symbols.sort_by_key(|s| s.start_line);

    debug!(
        "Regex tier found {} symbols in {} ({})",
        symbols.len(),
        file_path,
        language
    );
    symbols
}

/// A declaration located in the source, before it becomes a `Symbol`
#[derive(Debug, Clone)]
pub(crate) struct Declaration {
    pub name: String,
    pub kind: SymbolKind,
    /// Byte offset of the first character of the declaration
    pub start: usize,
    /// Byte offset where the header ends (body opener excluded)
    pub header_end: usize,
    /// Byte offset one past the last character of the declaration
    pub end: usize,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub visibility: Visibility,
    pub is_static: bool,
}

impl Declaration {
    fn into_symbol(self, source: &str, file_path: &str, language: Language) -> Symbol {
        let start_line = line_at(source, self.start);
        let last = if source.as_bytes().get(self.end) == Some(&b'\n') {
            self.end
        } else {
            self.end.saturating_sub(1)
        };
        let end_line = line_at(source, last.max(self.start)).max(start_line);
        let header_end = self.header_end.clamp(self.start, self.end);

        Symbol {
            name: self.name,
            kind: self.kind,
            file: file_path.to_string(),
            language,
            start_line,
            end_line,
            signature: render_signature(&source[self.start..header_end]),
            return_type: match self.kind {
                SymbolKind::Constructor => None,
                _ => self.return_type.filter(|t| !t.is_empty()),
            },
            parameters: self.parameters,
            visibility: self.visibility,
            is_static: self.is_static,
            raw_code: source[self.start..self.end].to_string(),
        }
    }

    /// Whether `offset` falls inside this declaration's span
    pub fn contains(&self, offset: usize) -> bool {
        offset > self.start && offset < self.end
    }
}

/// Skip leading whitespace of a match so declarations start at real text
pub(crate) fn trim_start(source: &str, start: usize) -> usize {
    LEADING_WS
        .find(&source[start..])
        .map_or(start, |m| start + m.end())
}

/// How single quotes behave when scanning for braces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Quotes {
    /// `'x'` is a character literal; a lone `'` (lifetime) is ordinary text
    CharLiterals,
    /// `'...'` is a string, as in JavaScript
    SingleQuotedStrings,
}

/// Offset of the `}` closing the `{` at `open`, ignoring braces in strings,
/// character literals and comments. The scan stops at the end of the text.
pub(crate) fn matching_brace(source: &str, open: usize, quotes: Quotes) -> Option<usize> {
    let bytes = source.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = skip_until(bytes, i + 2, b"\n");
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_until(bytes, i + 2, b"*/");
                continue;
            }
            b'"' | b'`' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'\'' => match quotes {
                Quotes::SingleQuotedStrings => {
                    i = skip_string(bytes, i);
                    continue;
                }
                Quotes::CharLiterals => {
                    if let Some(close) = char_literal_end(bytes, i) {
                        i = close + 1;
                        continue;
                    }
                }
            },
            _ => {}
        }
        i += 1;
    }

    None
}

/// Offset just past `terminator`, or the end of the text
fn skip_until(bytes: &[u8], from: usize, terminator: &[u8]) -> usize {
    let mut i = from;
    while i + terminator.len() <= bytes.len() {
        if &bytes[i..i + terminator.len()] == terminator {
            return i + terminator.len();
        }
        i += 1;
    }
    bytes.len()
}

/// Offset just past the string opened at `open`
fn skip_string(bytes: &[u8], open: usize) -> usize {
    let quote = bytes[open];
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            // Only template literals span lines
            b'\n' if quote != b'`' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Closing quote of a short character literal such as `'a'` or `'\n'`
fn char_literal_end(bytes: &[u8], open: usize) -> Option<usize> {
    if bytes.get(open + 1) == Some(&b'\\') {
        (open + 3..(open + 12).min(bytes.len())).find(|&i| bytes[i] == b'\'')
    } else if bytes.get(open + 2) == Some(&b'\'') {
        Some(open + 2)
    } else {
        // Multi-byte characters take up to four bytes
        (open + 3..(open + 6).min(bytes.len()))
            .find(|&i| bytes[i] == b'\'' && !bytes[open + 1].is_ascii())
    }
}

/// End of a brace-delimited body opened at `open`.
///
/// Returns the offset one past the closing brace, or an estimated end
/// `ESTIMATED_BODY_LINES` below the declaration line when the body never
/// closes.
pub(crate) fn body_end(source: &str, decl_start: usize, open: usize, quotes: Quotes) -> usize {
    match matching_brace(source, open, quotes) {
        Some(close) => close + 1,
        None => estimated_end(source, decl_start),
    }
}

/// Offset of the end of the line `ESTIMATED_BODY_LINES` after the
/// declaration line, clamped to the text
pub(crate) fn estimated_end(source: &str, decl_start: usize) -> usize {
    let target_line = (line_at(source, decl_start) + ESTIMATED_BODY_LINES).min(line_count(source));
    line_end_offset(source, target_line)
}

/// Offset just before the newline ending 1-based `line`
pub(crate) fn line_end_offset(source: &str, line: usize) -> usize {
    let mut current = 1;
    for (i, b) in source.bytes().enumerate() {
        if b == b'\n' {
            if current == line {
                return i;
            }
            current += 1;
        }
    }
    source.len()
}

/// First `{` at or after `from` that comes before any `;`
pub(crate) fn body_opener(source: &str, from: usize) -> Option<usize> {
    let rest = source.get(from..)?;
    for (i, b) in rest.bytes().enumerate() {
        match b {
            b'{' => return Some(from + i),
            b';' => return None,
            _ => {}
        }
    }
    None
}

/// Visibility from modifier keywords, else the language default
pub(crate) fn visibility_from(modifiers: &str, language: Language) -> Visibility {
    modifiers
        .split_whitespace()
        .find_map(Visibility::from_modifier)
        .unwrap_or_else(|| language.default_visibility())
}

pub(crate) fn has_modifier(modifiers: &str, modifier: &str) -> bool {
    modifiers.split_whitespace().any(|m| m == modifier)
}

pub(crate) fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Innermost declaration of kind `Class` containing `offset`
pub(crate) fn enclosing_class<'d>(declarations: &'d [Declaration], offset: usize) -> Option<&'d Declaration> {
    declarations
        .iter()
        .filter(|d| d.kind == SymbolKind::Class && d.contains(offset))
        .min_by_key(|d| d.end - d.start)
}

/// Innermost callable declaration containing `offset`
pub(crate) fn enclosing_callable<'d>(declarations: &'d [Declaration], offset: usize) -> Option<&'d Declaration> {
    declarations
        .iter()
        .filter(|d| {
            matches!(
                d.kind,
                SymbolKind::Method | SymbolKind::Function | SymbolKind::Constructor
            ) && d.contains(offset)
        })
        .min_by_key(|d| d.end - d.start)
}
