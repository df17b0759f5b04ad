// Structural similarity between two symbols

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::index::Symbol;

static BLOCK_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static LINE_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)//.*$").unwrap());
static HASH_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)#.*$").unwrap());
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*|\d+").unwrap());

/// Operations that mean opposite things in otherwise identical code
pub const OPPOSITE_PAIRS: &[(&str, &str)] = &[
    ("upper", "lower"),
    ("min", "max"),
    ("add", "remove"),
    ("increment", "decrement"),
    ("encode", "decode"),
    ("encrypt", "decrypt"),
    ("serialize", "deserialize"),
    ("push", "pop"),
    ("open", "close"),
    ("start", "stop"),
    ("enable", "disable"),
    ("show", "hide"),
    ("lock", "unlock"),
    ("ascending", "descending"),
    ("before", "after"),
    ("true", "false"),
];

/// Body lines of a symbol with the declaration header and comments removed.
///
/// Lines are trimmed; blank lines and lines made only of braces are dropped.
pub fn normalize_body(symbol: &Symbol) -> Vec<String> {
    let code = symbol.raw_code.as_str();

    let body = if symbol.language.is_indentation_based() {
        let without_comments = HASH_COMMENT_RE.replace_all(code, "");
        strip_indented_header(&without_comments).to_string()
    } else {
        let without_comments = BLOCK_COMMENT_RE.replace_all(code, "");
        let without_comments = LINE_COMMENT_RE.replace_all(&without_comments, "");
        match without_comments.find('{') {
            Some(open) => without_comments[open + 1..].to_string(),
            None => without_comments.lines().skip(1).collect::<Vec<_>>().join("\n"),
        }
    };

    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_brace_line(line))
        .map(str::to_string)
        .collect()
}

/// Everything after the header line ending in `:`; multi-line headers included
fn strip_indented_header(code: &str) -> &str {
    let mut offset = 0;
    for line in code.split_inclusive('\n') {
        offset += line.len();
        if line.trim_end().ends_with(':') {
            return &code[offset..];
        }
    }
    code.find('\n').map_or("", |nl| &code[nl + 1..])
}

fn is_brace_line(line: &str) -> bool {
    line.chars().all(|c| matches!(c, '{' | '}' | ')' | ';' | ','))
}

/// Signature with parameter names dropped, lowercase and whitespace-collapsed.
///
/// `String format(String value, int width)` becomes
/// `string format(string, int)`.
pub fn normalized_signature(symbol: &Symbol) -> String {
    let types: Vec<&str> = symbol
        .parameters
        .iter()
        .map(|p| p.type_name.trim())
        .collect();
    let rendered = format!(
        "{} {}({})",
        symbol.return_type.as_deref().unwrap_or(""),
        symbol.name,
        types.join(", ")
    );
    rendered
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Shared lines (counted with multiplicity) over the longer body
pub fn line_overlap(a: &[String], b: &[String]) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for line in a {
        *counts.entry(line.as_str()).or_insert(0) += 1;
    }
    let mut shared = 0usize;
    for line in b {
        if let Some(count) = counts.get_mut(line.as_str()) {
            if *count > 0 {
                *count -= 1;
                shared += 1;
            }
        }
    }

    shared as f32 / a.len().max(b.len()) as f32
}

fn tokens(lines: &[String]) -> HashSet<String> {
    lines
        .iter()
        .flat_map(|line| WORD_RE.find_iter(line))
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Jaccard index of the lowercase word tokens of two bodies
pub fn token_overlap(a: &[String], b: &[String]) -> f32 {
    let a = tokens(a);
    let b = tokens(b);
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let union = a.union(&b).count();
    let shared = a.intersection(&b).count();
    shared as f32 / union as f32
}

/// An opposite pair split across the two bodies: one side mentions only the
/// first word, the other only the second.
pub fn opposite_operation(a: &[String], b: &[String]) -> Option<(&'static str, &'static str)> {
    let a = a.join("\n").to_lowercase();
    let b = b.join("\n").to_lowercase();

    OPPOSITE_PAIRS.iter().copied().find(|&(x, y)| {
        let only = |text: &str, yes: &str, no: &str| text.contains(yes) && !text.contains(no);
        (only(&a, x, y) && only(&b, y, x)) || (only(&a, y, x) && only(&b, x, y))
    })
}

/// Fallback comparator when no semantic vectors are used.
///
/// Identical signatures score 1.0, equal normalized signatures 0.9, and
/// anything else the line overlap of the normalized bodies.
pub fn structural_similarity(a: &Symbol, b: &Symbol) -> f32 {
    NormalizedSymbol::new(a).similarity_to(b)
}

/// A symbol with its normalized signature and body computed once, for
/// scoring one symbol against many candidates
#[derive(Debug, Clone)]
pub struct NormalizedSymbol<'a> {
    symbol: &'a Symbol,
    signature: String,
    body: Vec<String>,
}

impl<'a> NormalizedSymbol<'a> {
    pub fn new(symbol: &'a Symbol) -> Self {
        Self {
            symbol,
            signature: normalized_signature(symbol),
            body: normalize_body(symbol),
        }
    }

    pub fn symbol(&self) -> &'a Symbol {
        self.symbol
    }

    /// Same score as `structural_similarity(self.symbol(), other)`; the
    /// candidate body is only normalized when the signatures differ
    pub fn similarity_to(&self, other: &Symbol) -> f32 {
        if !self.symbol.signature.is_empty() && self.symbol.signature == other.signature {
            return 1.0;
        }
        if self.signature == normalized_signature(other) {
            return 0.9;
        }
        line_overlap(&self.body, &normalize_body(other))
    }
}

/// Why two near-identical bodies do different things, if they do
pub fn logic_divergence(a: &Symbol, b: &Symbol, token_floor: f32) -> Option<String> {
    let body_a = normalize_body(a);
    let body_b = normalize_body(b);

    if let Some((x, y)) = opposite_operation(&body_a, &body_b) {
        return Some(format!("opposite operations ({} vs {})", x, y));
    }

    let overlap = token_overlap(&body_a, &body_b);
    if overlap < token_floor {
        return Some(format!("low body token overlap ({:.2})", overlap));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::test_support::method;
    use crate::index::Parameter;
    use crate::language::Language;

    #[test]
    fn test_normalized_symbol_scores_like_structural_similarity() {
        let changed = method("total", "src/Cart.java", 1, "int total() {\n    int sum = 0;\n    return sum;\n}");
        let normalized = NormalizedSymbol::new(&changed);

        let same_sig = method("total", "src/Invoice.java", 4, "int total() {\n    return 1;\n}");
        let mut renamed = method("sum", "src/Order.java", 2, "int sum() {\n    int sum = 0;\n    return 0;\n}");
        renamed.signature = "int sum()".to_string();

        for candidate in [&same_sig, &renamed] {
            assert_eq!(
                normalized.similarity_to(candidate),
                structural_similarity(&changed, candidate)
            );
        }
        assert_eq!(normalized.similarity_to(&same_sig), 1.0);
        assert!((normalized.similarity_to(&renamed) - 0.5).abs() < 1e-6);
        assert_eq!(normalized.symbol().name, "total");
    }

    #[test]
    fn test_normalize_body_drops_header_comments_and_braces() {
        let symbol = method(
            "sum",
            "Calc.java",
            1,
            "int sum(int a, int b) {\n    // add them\n    int total = a + b; /* inline */\n\n    return total;\n}",
        );
        assert_eq!(normalize_body(&symbol), vec!["int total = a + b;", "return total;"]);
    }

    #[test]
    fn test_normalize_python_body() {
        let mut symbol = method(
            "load",
            "repo.py",
            1,
            "def load(self,\n         path):\n    # read it\n    return open(path).read()\n",
        );
        symbol.language = Language::Python;
        assert_eq!(normalize_body(&symbol), vec!["return open(path).read()"]);
    }

    #[test]
    fn test_normalized_signature_drops_names() {
        let mut a = method("format", "A.java", 1, "");
        a.return_type = Some("String".to_string());
        a.parameters = vec![Parameter::new("value", "String"), Parameter::new("width", "int")];
        let mut b = a.clone();
        b.parameters = vec![Parameter::new("text", "String"), Parameter::new("w", "int")];

        assert_eq!(normalized_signature(&a), "string format(string, int)");
        assert_eq!(normalized_signature(&a), normalized_signature(&b));
    }

    #[test]
    fn test_line_overlap_counts_multiplicity() {
        let a: Vec<String> = ["x++;", "x++;", "return x;"].iter().map(|s| s.to_string()).collect();
        let b: Vec<String> = ["x++;", "return x;"].iter().map(|s| s.to_string()).collect();
        assert!((line_overlap(&a, &b) - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(line_overlap(&a, &[]), 0.0);
    }

    #[test]
    fn test_structural_similarity_tiers() {
        let a = method("save", "A.java", 1, "void save() {\n  write();\n}");
        let b = method("save", "B.java", 1, "void save() {\n  flush();\n}");
        assert_eq!(structural_similarity(&a, &b), 1.0);

        let mut c = b.clone();
        c.signature = "public void save()".to_string();
        assert_eq!(structural_similarity(&a, &c), 0.9);

        let d = method("store", "D.java", 1, "void store() {\n  write();\n  sync();\n}");
        assert!((structural_similarity(&a, &d) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_opposite_operation() {
        let upper = vec!["return s.toUpperCase();".to_string()];
        let lower = vec!["return s.toLowerCase();".to_string()];
        assert_eq!(opposite_operation(&upper, &lower), Some(("upper", "lower")));
        assert_eq!(opposite_operation(&lower, &upper), Some(("upper", "lower")));
        assert_eq!(opposite_operation(&upper, &upper), None);
    }

    #[test]
    fn test_logic_divergence() {
        let a = method("f", "A.java", 1, "void f() {\n  return s.toUpperCase();\n}");
        let b = method("f", "B.java", 1, "void f() {\n  return s.toLowerCase();\n}");
        assert!(logic_divergence(&a, &b, 0.7).unwrap().contains("opposite"));

        let c = method("f", "C.java", 1, "void f() {\n  queue.drain(items);\n}");
        assert!(logic_divergence(&a, &c, 0.7).unwrap().contains("overlap"));
        assert_eq!(logic_divergence(&a, &a, 0.7), None);
    }
}
