// JavaScript and TypeScript patterns

use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    body_end, body_opener, enclosing_callable, enclosing_class, has_modifier, is_keyword,
    line_end_offset, trim_start, Declaration, Quotes,
};
use crate::index::{SymbolKind, Visibility};
use crate::indexer::text::{line_at, parse_parameter_list};

static CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:export\s+)?(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?(?:class|interface)\s+(?P<name>[A-Za-z_$][\w$]*)").unwrap()
});

static FUNCTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*(?P<name>[A-Za-z_$][\w$]*)\s*(?:<[^>]*>)?\s*\((?P<params>[^)]*)\)\s*(?::\s*(?P<ret>[^{;]+?))?\s*\{").unwrap()
});

static ARROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:export\s+)?(?:const|let|var)\s+(?P<name>[A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:\((?P<params>[^)]*)\)|(?P<single>[A-Za-z_$][\w$]*))\s*(?::\s*(?P<ret>[^=]+?))?\s*=>").unwrap()
});

static METHOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?P<mods>(?:(?:public|private|protected|static|async|readonly|override|abstract|get|set)\s+)*)\*?(?P<name>#?[A-Za-z_$][\w$]*)\s*(?:<[^>]*>)?\s*\((?P<params>[^)]*)\)\s*(?::\s*(?P<ret>[^{;]+?))?\s*\{").unwrap()
});

pub(super) fn scan(source: &str) -> Vec<Declaration> {
    let quotes = Quotes::SingleQuotedStrings;
    let mut declarations = Vec::new();

    for caps in CLASS_RE.captures_iter(source) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
            continue;
        };
        let start = trim_start(source, whole.start());
        let (header_end, end) = match body_opener(source, name.end()) {
            Some(open) => (open, body_end(source, start, open, quotes)),
            None => (name.end(), name.end()),
        };

        declarations.push(Declaration {
            name: name.as_str().to_string(),
            kind: SymbolKind::Class,
            start,
            header_end,
            end,
            parameters: Vec::new(),
            return_type: None,
            visibility: Visibility::Public,
            is_static: false,
        });
    }

    let mut callables: Vec<Declaration> = Vec::new();

    for caps in FUNCTION_RE.captures_iter(source) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
            continue;
        };
        let start = trim_start(source, whole.start());
        let open = whole.end() - 1;

        callables.push(Declaration {
            name: name.as_str().to_string(),
            kind: SymbolKind::Function,
            start,
            header_end: open,
            end: body_end(source, start, open, quotes),
            parameters: parse_parameter_list(caps.name("params").map_or("", |m| m.as_str())),
            return_type: caps.name("ret").map(|m| m.as_str().trim().to_string()),
            visibility: Visibility::Public,
            is_static: false,
        });
    }

    for caps in ARROW_RE.captures_iter(source) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
            continue;
        };
        let start = trim_start(source, whole.start());
        let arrow_end = whole.end();

        // Block bodies end at the matching brace, expression bodies at the line end
        let end = match source[arrow_end..].trim_start().starts_with('{') {
            true => match body_opener(source, arrow_end) {
                Some(open) => body_end(source, start, open, quotes),
                None => line_end_offset(source, line_at(source, arrow_end)),
            },
            false => line_end_offset(source, line_at(source, arrow_end)),
        };

        let params = match (caps.name("params"), caps.name("single")) {
            (Some(list), _) => parse_parameter_list(list.as_str()),
            (None, Some(single)) => parse_parameter_list(single.as_str()),
            (None, None) => Vec::new(),
        };

        callables.push(Declaration {
            name: name.as_str().to_string(),
            kind: SymbolKind::Function,
            start,
            header_end: arrow_end,
            end: end.max(arrow_end),
            parameters: params,
            return_type: caps.name("ret").map(|m| m.as_str().trim().to_string()),
            visibility: Visibility::Public,
            is_static: false,
        });
    }

    for caps in METHOD_RE.captures_iter(source) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
            continue;
        };
        let name = name.as_str();
        let start = trim_start(source, whole.start());
        if is_keyword(name)
            || enclosing_class(&declarations, start).is_none()
            || enclosing_callable(&callables, start).is_some()
            || callables.iter().any(|c| c.start == start)
        {
            continue;
        }

        let mods = caps.name("mods").map_or("", |m| m.as_str());
        let open = whole.end() - 1;
        let is_constructor = name == "constructor";

        let visibility = if name.starts_with('#') || has_modifier(mods, "private") {
            Visibility::Private
        } else if has_modifier(mods, "protected") {
            Visibility::Protected
        } else {
            Visibility::Public
        };

        callables.push(Declaration {
            name: name.to_string(),
            kind: if is_constructor {
                SymbolKind::Constructor
            } else {
                SymbolKind::Method
            },
            start,
            header_end: open,
            end: body_end(source, start, open, quotes),
            parameters: parse_parameter_list(caps.name("params").map_or("", |m| m.as_str())),
            return_type: caps.name("ret").map(|m| m.as_str().trim().to_string()),
            visibility,
            is_static: has_modifier(mods, "static"),
        });
    }

    declarations.extend(callables);
    declarations
}

#[cfg(test)]
mod tests {
    use crate::index::{SymbolKind, Visibility};
    use crate::indexer::fallback::extract_symbols;
    use crate::language::Language;

    #[test]
    fn test_javascript_class_and_functions() {
        let source = r#"export class Cart {
  constructor(items) {
    this.items = items;
  }

  static empty() {
    return new Cart([]);
  }

  #total(tax = 0) {
    if (tax) {
      return 1;
    }
    return this.items.reduce((a, b) => a + b, '}');
  }
}

function helper(a, b) {
  return a + b;
}

const double = (x) => x * 2;
"#;
        let symbols = extract_symbols(source, "cart.js", Language::JavaScript);
        let summary: Vec<(&str, SymbolKind)> =
            symbols.iter().map(|s| (s.name.as_str(), s.kind)).collect();
        assert_eq!(
            summary,
            vec![
                ("Cart", SymbolKind::Class),
                ("constructor", SymbolKind::Constructor),
                ("empty", SymbolKind::Method),
                ("#total", SymbolKind::Method),
                ("helper", SymbolKind::Function),
                ("double", SymbolKind::Function),
            ]
        );

        assert_eq!(symbols[0].end_line, 16);
        assert!(symbols[2].is_static);
        assert_eq!(symbols[3].visibility, Visibility::Private);
        assert_eq!(symbols[3].end_line, 15);
        assert_eq!(symbols[3].parameters[0].name, "tax");
        assert_eq!(symbols[1].return_type, None);
        assert_eq!(symbols[5].start_line, 22);
        assert_eq!(symbols[5].end_line, 22);
    }

    #[test]
    fn test_typescript_types() {
        let source = "export class Repo {\n  private find(id: string, limit?: number): Promise<Item[]> {\n    return db.get(id);\n  }\n}\n\nexport const load = async (path: string): Promise<void> => {\n  await read(path);\n};\n";
        let symbols = extract_symbols(source, "repo.ts", Language::TypeScript);

        let find = symbols.iter().find(|s| s.name == "find").unwrap();
        assert_eq!(find.visibility, Visibility::Private);
        assert_eq!(find.return_type.as_deref(), Some("Promise<Item[]>"));
        assert_eq!(find.parameters[1].name, "limit");
        assert_eq!(find.parameters[1].type_name, "number");

        let load = symbols.iter().find(|s| s.name == "load").unwrap();
        assert_eq!(load.kind, SymbolKind::Function);
        assert_eq!(load.return_type.as_deref(), Some("Promise<void>"));
        assert_eq!(load.start_line, 7);
        assert_eq!(load.end_line, 9);
    }
}
