// Java, C# and generic C-family patterns

use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    body_end, body_opener, enclosing_callable, enclosing_class, has_modifier, is_keyword,
    trim_start, visibility_from, Declaration, Quotes,
};
use crate::index::SymbolKind;
use crate::indexer::text::parse_parameter_list;
use crate::language::Language;

const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "internal", "static", "final", "abstract", "synchronized",
    "native", "virtual", "override", "async", "sealed", "extern", "unsafe", "default", "strictfp",
];

const ANNOTATIONS: &str = r"(?:@[\w.]+(?:\([^)]*\))?\s+)*";

static CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?m)^[ \t]*{}(?P<mods>(?:(?:public|private|protected|internal|static|final|abstract|sealed|non-sealed|partial|strictfp|readonly)\s+)*)(?:class|interface|enum|record|struct)\s+(?P<name>[A-Za-z_]\w*)",
        ANNOTATIONS
    ))
    .unwrap()
});

static METHOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?m)^[ \t]*{}(?P<mods>(?:(?:public|private|protected|internal|static|final|abstract|synchronized|native|virtual|override|async|sealed|extern|unsafe|default|strictfp)\s+)*)(?:<[^>(){{}};]*>\s+)?(?P<ret>[\w.]+(?:\s*<[^(){{}};=]*>)?(?:\[\])*\??)\s+(?P<name>[A-Za-z_]\w*)\s*\((?P<params>[^)]*)\)\s*(?:throws\s+[\w.,\s]+?)?(?:where\s+[^{{;]+?)?\s*\{{",
        ANNOTATIONS
    ))
    .unwrap()
});

static CONSTRUCTOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?m)^[ \t]*{}(?P<mods>(?:(?:public|private|protected|internal|static)\s+)*)(?P<name>[A-Z]\w*)\s*\((?P<params>[^)]*)\)\s*(?:throws\s+[\w.,\s]+?)?(?::\s*(?:base|this)\s*\([^)]*\)\s*)?\{{",
        ANNOTATIONS
    ))
    .unwrap()
});

static FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?m)^[ \t]*{}(?P<mods>(?:(?:public|private|protected|internal|static|final|readonly|const|volatile|transient)\s+)+)(?P<type>[\w.]+(?:\s*<[^(){{}};=]*>)?(?:\[\])*\??)\s+(?P<name>[A-Za-z_]\w*)\s*(?:=[^;]*)?;",
        ANNOTATIONS
    ))
    .unwrap()
});

pub(super) fn scan(source: &str, language: Language) -> Vec<Declaration> {
    let quotes = Quotes::CharLiterals;
    let mut declarations = Vec::new();

    for caps in CLASS_RE.captures_iter(source) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
            continue;
        };
        let mods = caps.name("mods").map_or("", |m| m.as_str());
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
            visibility: visibility_from(mods, language),
            is_static: has_modifier(mods, "static"),
        });
    }

    let mut callables = Vec::new();

    for caps in METHOD_RE.captures_iter(source) {
        let (Some(whole), Some(name), Some(ret)) = (caps.get(0), caps.name("name"), caps.name("ret")) else {
            continue;
        };
        // `public Widget(...)` reads as return type `public`; constructors are matched below
        if is_keyword(name.as_str()) || is_keyword(ret.as_str()) || MODIFIERS.contains(&ret.as_str()) {
            continue;
        }

        let mods = caps.name("mods").map_or("", |m| m.as_str());
        let start = trim_start(source, whole.start());
        let open = whole.end() - 1;

        let enclosing = enclosing_class(&declarations, start).map(|c| c.name.as_str());
        let (kind, return_type) = if enclosing == Some(name.as_str()) {
            (SymbolKind::Constructor, None)
        } else if enclosing.is_some() || language == Language::Java {
            (SymbolKind::Method, Some(ret.as_str().to_string()))
        } else {
            (SymbolKind::Function, Some(ret.as_str().to_string()))
        };

        callables.push(Declaration {
            name: name.as_str().to_string(),
            kind,
            start,
            header_end: open,
            end: body_end(source, start, open, quotes),
            parameters: parse_parameter_list(caps.name("params").map_or("", |m| m.as_str())),
            return_type,
            visibility: visibility_from(mods, language),
            is_static: has_modifier(mods, "static"),
        });
    }

    for caps in CONSTRUCTOR_RE.captures_iter(source) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
            continue;
        };
        let start = trim_start(source, whole.start());
        let is_ctor = enclosing_class(&declarations, start).is_some_and(|c| c.name == name.as_str());
        if !is_ctor || callables.iter().any(|c: &Declaration| c.start == start) {
            continue;
        }

        let mods = caps.name("mods").map_or("", |m| m.as_str());
        let open = whole.end() - 1;
        callables.push(Declaration {
            name: name.as_str().to_string(),
            kind: SymbolKind::Constructor,
            start,
            header_end: open,
            end: body_end(source, start, open, quotes),
            parameters: parse_parameter_list(caps.name("params").map_or("", |m| m.as_str())),
            return_type: None,
            visibility: visibility_from(mods, language),
            is_static: has_modifier(mods, "static"),
        });
    }

    if matches!(language, Language::Java | Language::CSharp) {
        for caps in FIELD_RE.captures_iter(source) {
            let (Some(whole), Some(name), Some(type_name)) =
                (caps.get(0), caps.name("name"), caps.name("type"))
            else {
                continue;
            };
            let start = trim_start(source, whole.start());
            if enclosing_class(&declarations, start).is_none()
                || enclosing_callable(&callables, start).is_some()
                || is_keyword(type_name.as_str())
            {
                continue;
            }

            let mods = caps.name("mods").map_or("", |m| m.as_str());
            declarations.push(Declaration {
                name: name.as_str().to_string(),
                kind: SymbolKind::Variable,
                start,
                header_end: whole.end(),
                end: whole.end(),
                parameters: Vec::new(),
                return_type: Some(type_name.as_str().to_string()),
                visibility: visibility_from(mods, language),
                is_static: has_modifier(mods, "static"),
            });
        }
    }

    declarations.extend(callables);
    declarations
}

#[cfg(test)]
mod tests {
    use crate::index::{SymbolKind, Visibility};
    use crate::indexer::fallback::extract_symbols;
    use crate::language::Language;

    const ORDER_SERVICE: &str = r#"package shop;

public class OrderService {
    private final Repository repository;
    private static int created = 0;

    public OrderService(Repository repository) {
        this.repository = repository;
    }

    @Override
    public String process(String input, Map<String, Integer> counts) {
        if (input == null) {
            return "";
        }
        return input.trim();
    }

    static int count() {
        return created;
    }
}
"#;

    #[test]
    fn test_java_class_methods_and_fields() {
        let symbols = extract_symbols(ORDER_SERVICE, "OrderService.java", Language::Java);
        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["OrderService", "repository", "created", "OrderService", "process", "count"]
        );

        let class = &symbols[0];
        assert_eq!(class.kind, SymbolKind::Class);
        assert_eq!(class.start_line, 3);
        assert_eq!(class.end_line, 22);

        let ctor = &symbols[3];
        assert_eq!(ctor.kind, SymbolKind::Constructor);
        assert_eq!(ctor.return_type, None);
        assert_eq!(ctor.parameters[0].name, "repository");

        let process = &symbols[4];
        assert_eq!(process.kind, SymbolKind::Method);
        assert_eq!(process.start_line, 11);
        assert_eq!(process.end_line, 17);
        assert_eq!(process.return_type.as_deref(), Some("String"));
        assert_eq!(process.signature, "public String process(String input, Map<String, Integer> counts)");
        assert_eq!(process.parameters.len(), 2);
        assert_eq!(process.parameters[1].type_name, "Map<String, Integer>");
        assert_eq!(process.visibility, Visibility::Public);

        let count = &symbols[5];
        assert!(count.is_static);
        assert_eq!(count.visibility, Visibility::Package);
    }

    #[test]
    fn test_java_fields() {
        let symbols = extract_symbols(ORDER_SERVICE, "OrderService.java", Language::Java);
        let field = symbols.iter().find(|s| s.name == "created").unwrap();
        assert_eq!(field.kind, SymbolKind::Variable);
        assert!(field.is_static);
        assert_eq!(field.visibility, Visibility::Private);
        assert_eq!(field.return_type.as_deref(), Some("int"));
    }

    #[test]
    fn test_control_flow_is_not_a_method() {
        let source = "class A {\n  void run() {\n    if (ready) {\n    } else if (x) {\n    }\n    for (int i = 0; i < 3; i++) {\n    }\n  }\n}\n";
        let symbols = extract_symbols(source, "A.java", Language::Java);
        let methods: Vec<&str> = symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Method)
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(methods, vec!["run"]);
    }

    #[test]
    fn test_csharp_defaults_to_private() {
        let source = "namespace App {\n  public class Cart {\n    decimal Total(decimal tax) {\n      return tax;\n    }\n  }\n}\n";
        let symbols = extract_symbols(source, "Cart.cs", Language::CSharp);
        let total = symbols.iter().find(|s| s.name == "Total").unwrap();
        assert_eq!(total.visibility, Visibility::Private);
        assert_eq!(total.language, Language::CSharp);
    }

    #[test]
    fn test_unclosed_method_end_is_estimated() {
        let mut source = String::from("class A {\n  void broken() {\n");
        for i in 0..20 {
            source.push_str(&format!("    step{}();\n", i));
        }
        let symbols = extract_symbols(&source, "A.java", Language::Java);
        let broken = symbols.iter().find(|s| s.name == "broken").unwrap();
        assert_eq!(broken.start_line, 2);
        assert_eq!(broken.end_line, 12);
    }
}
