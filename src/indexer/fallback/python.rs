// Python patterns

use once_cell::sync::Lazy;
use regex::Regex;

use super::{trim_start, Declaration};
use crate::index::{SymbolKind, Visibility};
use crate::indexer::text::parse_parameter_list;

static CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?P<indent>[ \t]*)class\s+(?P<name>[A-Za-z_]\w*)\s*(?:\([^)]*\))?\s*:").unwrap()
});

static DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?P<indent>[ \t]*)(?:async\s+)?def\s+(?P<name>[A-Za-z_]\w*)\s*\((?P<params>[^)]*)\)\s*(?:->\s*(?P<ret>[^:]+?))?\s*:").unwrap()
});

pub(super) fn scan(source: &str) -> Vec<Declaration> {
    let mut classes = Vec::new();

    for caps in CLASS_RE.captures_iter(source) {
        let (Some(whole), Some(name), Some(indent)) =
            (caps.get(0), caps.name("name"), caps.name("indent"))
        else {
            continue;
        };
        let start = trim_start(source, whole.start());
        classes.push(Declaration {
            name: name.as_str().to_string(),
            kind: SymbolKind::Class,
            start,
            header_end: whole.end(),
            end: block_end(source, indent_width(indent.as_str()), whole.end()),
            parameters: Vec::new(),
            return_type: None,
            visibility: visibility_of(name.as_str()),
            is_static: false,
        });
    }

    let mut functions = Vec::new();

    for caps in DEF_RE.captures_iter(source) {
        let (Some(whole), Some(name), Some(indent)) =
            (caps.get(0), caps.name("name"), caps.name("indent"))
        else {
            continue;
        };
        let name = name.as_str();
        let start = trim_start(source, whole.start());
        let width = indent_width(indent.as_str());

        // A def belongs to a class when the innermost enclosing block is that class
        let parent_class = classes
            .iter()
            .filter(|c| c.contains(start))
            .min_by_key(|c| c.end - c.start);
        let inside_function = functions
            .iter()
            .any(|f: &Declaration| f.contains(start) && parent_class.map_or(true, |c| f.start > c.start));

        let kind = match (parent_class, inside_function) {
            (Some(_), false) if name == "__init__" => SymbolKind::Constructor,
            (Some(_), false) => SymbolKind::Method,
            _ => SymbolKind::Function,
        };

        let mut parameters = parse_parameter_list(caps.name("params").map_or("", |m| m.as_str()));
        if kind != SymbolKind::Function
            && parameters.first().is_some_and(|p| p.name == "self" || p.name == "cls")
        {
            parameters.remove(0);
        }

        functions.push(Declaration {
            name: name.to_string(),
            kind,
            start,
            header_end: whole.end(),
            end: block_end(source, width, whole.end()),
            parameters,
            return_type: caps.name("ret").map(|m| m.as_str().trim().to_string()),
            visibility: visibility_of(name),
            is_static: decorated_with(source, whole.start(), "staticmethod"),
        });
    }

    classes.extend(functions);
    classes
}

/// Leading indentation width, tabs counted as four columns
fn indent_width(indent: &str) -> usize {
    indent.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum()
}

/// End of an indented block whose header ends at `header_end`.
///
/// The block stops before the first non-blank, non-comment line indented at
/// or left of `decl_indent`.
fn block_end(source: &str, decl_indent: usize, header_end: usize) -> usize {
    let mut offset = match source[header_end..].find('\n') {
        Some(nl) => header_end + nl + 1,
        None => return source.len(),
    };
    let mut end = offset.saturating_sub(1).max(header_end);

    while offset < source.len() {
        let line_end = source[offset..].find('\n').map_or(source.len(), |i| offset + i);
        let line = &source[offset..line_end];
        let trimmed = line.trim_start();

        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            let width = indent_width(&line[..line.len() - trimmed.len()]);
            if width <= decl_indent {
                break;
            }
            end = line_end;
        }

        offset = line_end + 1;
    }

    end
}

/// `__x` is private, `_x` protected, dunder names and the rest public
pub(crate) fn visibility_of(name: &str) -> Visibility {
    if name.starts_with("__") && !name.ends_with("__") {
        Visibility::Private
    } else if name.starts_with('_') && !name.starts_with("__") {
        Visibility::Protected
    } else {
        Visibility::Public
    }
}

/// Whether the lines right above `line_start` carry `@decorator`
fn decorated_with(source: &str, line_start: usize, decorator: &str) -> bool {
    source[..line_start]
        .lines()
        .rev()
        .map(str::trim)
        .take_while(|l| l.starts_with('@'))
        .any(|l| l.trim_start_matches('@').starts_with(decorator))
}

#[cfg(test)]
mod tests {
    use crate::index::{SymbolKind, Visibility};
    use crate::indexer::fallback::extract_symbols;
    use crate::language::Language;

    const INVENTORY: &str = r#"import os


class Inventory(Base):
    def __init__(self, items):
        self.items = items

    @staticmethod
    def empty():
        return Inventory([])

    def _count(self, kind: str = "all") -> int:
        def inner(x):
            return x
        # trailing comment

        return len(self.items)


def load(path):
    with open(path) as f:
        return f.read()
"#;

    #[test]
    fn test_python_blocks() {
        let symbols = extract_symbols(INVENTORY, "inventory.py", Language::Python);
        let summary: Vec<(&str, SymbolKind, usize, usize)> = symbols
            .iter()
            .map(|s| (s.name.as_str(), s.kind, s.start_line, s.end_line))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("Inventory", SymbolKind::Class, 4, 17),
                ("__init__", SymbolKind::Constructor, 5, 6),
                ("empty", SymbolKind::Method, 9, 10),
                ("_count", SymbolKind::Method, 12, 17),
                ("inner", SymbolKind::Function, 13, 14),
                ("load", SymbolKind::Function, 20, 22),
            ]
        );
    }

    #[test]
    fn test_python_details() {
        let symbols = extract_symbols(INVENTORY, "inventory.py", Language::Python);

        let empty = symbols.iter().find(|s| s.name == "empty").unwrap();
        assert!(empty.is_static);

        let count = symbols.iter().find(|s| s.name == "_count").unwrap();
        assert_eq!(count.visibility, Visibility::Protected);
        assert_eq!(count.return_type.as_deref(), Some("int"));
        assert_eq!(count.parameters.len(), 1);
        assert_eq!(count.parameters[0].name, "kind");
        assert_eq!(count.parameters[0].type_name, "str");
        assert_eq!(count.signature, r#"def _count(self, kind: str = "all") -> int"#);

        let init = symbols.iter().find(|s| s.name == "__init__").unwrap();
        assert_eq!(init.return_type, None);
        assert_eq!(init.visibility, Visibility::Public);
    }
}
