// Regex call tier

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::fallback::is_keyword;
use super::text::line_at;
use crate::index::{CallEdge, Symbol};

static CALL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Za-z_$][\w$]*)\s*\(").unwrap());

/// Call edges found by matching `name(` inside the callables of `symbols`.
///
/// Each call site belongs to the innermost callable whose line span covers
/// it. Only names in `known` that can be call targets produce edges.
pub fn extract_calls(source: &str, file_path: &str, symbols: &[Symbol], known: &[Symbol]) -> Vec<CallEdge> {
    let targets: HashSet<&str> = known
        .iter()
        .filter(|s| s.is_call_target())
        .map(|s| s.name.as_str())
        .collect();
    let callables: Vec<&Symbol> = symbols.iter().filter(|s| s.is_callable()).collect();
    if targets.is_empty() || callables.is_empty() {
        return Vec::new();
    }

    let mut edges = Vec::new();
    for caps in CALL_RE.captures_iter(source) {
        let Some(name) = caps.get(1) else {
            continue;
        };
        let callee = name.as_str();
        if is_keyword(callee) || !targets.contains(callee) {
            continue;
        }
        if source[..name.start()].ends_with('@') {
            continue;
        }

        let line = line_at(source, name.start());
        let Some(caller) = callables
            .iter()
            .filter(|s| s.start_line <= line && line <= s.end_line)
            .min_by_key(|s| s.line_count())
        else {
            continue;
        };
        if caller.name == callee {
            continue;
        }

        edges.push(CallEdge {
            caller: caller.name.clone(),
            callee: callee.to_string(),
            file: file_path.to_string(),
            line,
        });
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::fallback::extract_symbols;
    use crate::language::Language;

    #[test]
    fn test_calls_between_methods() {
        let source = "class Billing {\n  void charge(int cents) {\n    if (valid(cents)) {\n      record(cents);\n    }\n  }\n\n  boolean valid(int c) { return c > 0; }\n\n  void record(int c) {\n    charge(c);\n  }\n}\n";
        let symbols = extract_symbols(source, "Billing.java", Language::Java);
        let calls = extract_calls(source, "Billing.java", &symbols, &symbols);

        let summary: Vec<(&str, &str, usize)> = calls
            .iter()
            .map(|c| (c.caller.as_str(), c.callee.as_str(), c.line))
            .collect();
        assert_eq!(
            summary,
            vec![("charge", "valid", 3), ("charge", "record", 4), ("record", "charge", 11)]
        );
    }

    #[test]
    fn test_unknown_names_and_keywords_are_ignored() {
        let source = "function run(items) {\n  for (const i of items) {\n    console.log(i);\n  }\n  return run(items.slice(1));\n}\n";
        let symbols = extract_symbols(source, "run.js", Language::JavaScript);
        assert!(extract_calls(source, "run.js", &symbols, &symbols).is_empty());
    }

    #[test]
    fn test_nested_function_owns_its_calls() {
        let source = "def outer():\n    def inner():\n        return helper()\n    return inner()\n\ndef helper():\n    return 1\n";
        let symbols = extract_symbols(source, "nest.py", Language::Python);
        let calls = extract_calls(source, "nest.py", &symbols, &symbols);

        let summary: Vec<(&str, &str)> = calls
            .iter()
            .map(|c| (c.caller.as_str(), c.callee.as_str()))
            .collect();
        assert_eq!(summary, vec![("inner", "helper"), ("outer", "inner")]);
    }

    #[test]
    fn test_annotations_are_not_calls() {
        let source = "class Jobs {\n  void retry() {}\n\n  @retry(3)\n  void send() {\n    retry();\n  }\n}\n";
        let symbols = extract_symbols(source, "Jobs.java", Language::Java);
        let calls = extract_calls(source, "Jobs.java", &symbols, &symbols);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].line, 6);
    }
}
