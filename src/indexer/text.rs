// Text helpers shared by both extraction tiers

use once_cell::sync::Lazy;
use regex::Regex;

use crate::index::Parameter;

static ANNOTATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@[A-Za-z_][\w.]*(?:\([^)]*\))?\s*").unwrap());

/// Modifiers that never name or type a parameter
const PARAMETER_MODIFIERS: &[&str] = &[
    "final", "ref", "out", "in", "params", "readonly", "mut", "const", "this",
    "public", "private", "protected",
];

/// 1-based line number of a byte offset
pub fn line_at(source: &str, offset: usize) -> usize {
    let offset = offset.min(source.len());
    source.as_bytes()[..offset].iter().filter(|b| **b == b'\n').count() + 1
}

/// Number of lines in a source text (at least 1)
pub fn line_count(source: &str) -> usize {
    let newlines = source.bytes().filter(|b| *b == b'\n').count();
    if source.ends_with('\n') {
        newlines.max(1)
    } else {
        newlines + 1
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render a declaration header as a one-line signature.
///
/// Annotations and decorators are dropped, whitespace is collapsed and any
/// trailing body opener (`{`, `:`, `=>`) is removed.
pub fn render_signature(header: &str) -> String {
    let without_annotations = ANNOTATION_RE.replace_all(header, "");
    let mut signature = collapse_whitespace(&without_annotations);

    loop {
        let trimmed = signature
            .trim_end_matches(|c: char| c == '{' || c == ':' || c.is_whitespace())
            .to_string();
        let trimmed = match trimmed.strip_suffix("=>") {
            Some(rest) => rest.trim_end().to_string(),
            None => trimmed,
        };
        if trimmed == signature {
            break;
        }
        signature = trimmed;
    }

    signature
}

/// Split a parameter list on commas that are not nested in brackets
pub fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, c) in list.char_indices() {
        match c {
            '<' | '(' | '[' | '{' => depth += 1,
            '>' | ')' | ']' | '}' => depth -= 1,
            ',' if depth <= 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);

    parts.into_iter().map(str::trim).filter(|p| !p.is_empty()).collect()
}

/// Parse one parameter written as `Type name` or `name: Type`.
///
/// Returns `None` for pieces that are empty after stripping defaults,
/// annotations and modifiers. Unusual formatting yields an empty type.
pub fn parse_parameter(raw: &str) -> Option<Parameter> {
    let without_default = strip_default(raw);
    let without_annotations = ANNOTATION_RE.replace_all(without_default, "");
    let tokens: Vec<&str> = without_annotations
        .split_whitespace()
        .filter(|t| !PARAMETER_MODIFIERS.contains(t))
        .collect();
    let piece = tokens.join(" ");
    let piece = piece.trim();
    if piece.is_empty() {
        return None;
    }

    if let Some(colon) = single_colon(piece) {
        let name = piece[..colon].trim().trim_end_matches('?').trim();
        let type_name = piece[colon + 1..].trim();
        if name.is_empty() {
            return None;
        }
        return Some(Parameter::new(name, type_name));
    }

    let mut words: Vec<&str> = piece.split_whitespace().collect();
    let name = words.pop()?;
    Some(Parameter::new(name, words.join(" ")))
}

/// Parse a whole comma-separated parameter list
pub fn parse_parameter_list(list: &str) -> Vec<Parameter> {
    split_top_level(list)
        .into_iter()
        .filter_map(parse_parameter)
        .collect()
}

fn strip_default(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    let mut depth = 0i32;
    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'<' | b'(' | b'[' | b'{' => depth += 1,
            b'>' | b')' | b']' | b'}' => depth -= 1,
            b'=' if depth <= 0 => {
                let next = bytes.get(i + 1).copied();
                let prev = if i > 0 { bytes.get(i - 1).copied() } else { None };
                if next != Some(b'>') && next != Some(b'=') && prev != Some(b'=') {
                    return &raw[..i];
                }
            }
            _ => {}
        }
    }
    raw
}

/// Offset of the first `:` that is not part of `::`
fn single_colon(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    (0..bytes.len()).find(|&i| {
        bytes[i] == b':'
            && bytes.get(i + 1) != Some(&b':')
            && (i == 0 || bytes[i - 1] != b':')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_at() {
        let source = "a\nb\nc";
        assert_eq!(line_at(source, 0), 1);
        assert_eq!(line_at(source, 2), 2);
        assert_eq!(line_at(source, 4), 3);
        assert_eq!(line_at(source, 100), 3);
    }

    #[test]
    fn test_line_count() {
        assert_eq!(line_count(""), 1);
        assert_eq!(line_count("a\nb"), 2);
        assert_eq!(line_count("a\nb\n"), 2);
    }

    #[test]
    fn test_render_signature() {
        assert_eq!(
            render_signature("@Override\n    public   String process(String input) {"),
            "public String process(String input)"
        );
        assert_eq!(render_signature("def load(self, path):"), "def load(self, path)");
        assert_eq!(render_signature("const add = (a, b) =>"), "const add = (a, b)");
    }

    #[test]
    fn test_split_respects_generics() {
        assert_eq!(
            split_top_level("Map<String, Integer> counts, int n"),
            vec!["Map<String, Integer> counts", "int n"]
        );
        assert!(split_top_level("  ").is_empty());
    }

    #[test]
    fn test_parse_c_style_parameter() {
        assert_eq!(
            parse_parameter("final @NotNull List<String> items"),
            Some(Parameter::new("items", "List<String>"))
        );
        assert_eq!(
            parse_parameter("String... args"),
            Some(Parameter::new("args", "String..."))
        );
        assert_eq!(parse_parameter("int retries = 3"), Some(Parameter::new("retries", "int")));
    }

    #[test]
    fn test_parse_colon_style_parameter() {
        assert_eq!(
            parse_parameter("path: &std::path::Path"),
            Some(Parameter::new("path", "&std::path::Path"))
        );
        assert_eq!(
            parse_parameter("limit?: number = 10"),
            Some(Parameter::new("limit", "number"))
        );
        assert_eq!(parse_parameter("mut count: usize"), Some(Parameter::new("count", "usize")));
    }

    #[test]
    fn test_untyped_parameter_has_empty_type() {
        assert_eq!(parse_parameter("value"), Some(Parameter::new("value", "")));
        assert_eq!(parse_parameter(" "), None);
    }

    #[test]
    fn test_arrow_default_is_not_stripped() {
        assert_eq!(
            parse_parameter("cb = () => null"),
            Some(Parameter::new("cb", ""))
        );
    }
}
