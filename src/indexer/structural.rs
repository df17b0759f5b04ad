// Symbol and call collection over syntax trees

use std::collections::HashSet;

use tree_sitter::Node;

use super::engine::ParserEngine;
use super::fallback;
use super::syntax::{field_text, text, walk, SyntaxNode, SyntaxVisitor};
use super::text::{parse_parameter, render_signature};
use crate::error::EngineError;
use crate::index::{CallEdge, Parameter, Symbol, SymbolKind, Visibility};
use crate::language::Language;

/// Symbols found in one parsed file
#[derive(Debug, Default)]
pub struct StructuralSymbols {
    pub symbols: Vec<Symbol>,
    /// The tree contained syntax errors
    pub has_errors: bool,
}

pub fn extract_symbols(
    engine: &ParserEngine,
    source: &str,
    file_path: &str,
    language: Language,
) -> Result<StructuralSymbols, EngineError> {
    let tree = engine.parse(source, language, file_path)?;
    let root = tree.root_node();

    let mut collector = SymbolCollector {
        language,
        source,
        file_path,
        containers: Vec::new(),
        symbols: Vec::new(),
    };
    walk(language, root, source, &mut collector);

    Ok(StructuralSymbols {
        symbols: collector.symbols,
        has_errors: root.has_error(),
    })
}

/// Call edges from invocations inside callables, restricted to `known` callees
pub fn extract_calls(
    engine: &ParserEngine,
    source: &str,
    file_path: &str,
    language: Language,
    known: &[Symbol],
) -> Result<Vec<CallEdge>, EngineError> {
    let tree = engine.parse(source, language, file_path)?;

    let mut collector = CallCollector {
        language,
        source,
        file_path,
        known: known
            .iter()
            .filter(|s| s.is_call_target())
            .map(|s| s.name.as_str())
            .collect(),
        edges: Vec::new(),
    };
    walk(language, tree.root_node(), source, &mut collector);

    Ok(collector.edges)
}

enum Container {
    Class(String),
    Callable,
}

struct SymbolCollector<'s> {
    language: Language,
    source: &'s str,
    file_path: &'s str,
    containers: Vec<Container>,
    symbols: Vec<Symbol>,
}

impl<'t> SyntaxVisitor<'t> for SymbolCollector<'_> {
    fn enter(&mut self, node: SyntaxNode<'t>) {
        match node {
            SyntaxNode::Class(n) => {
                let name = declaration_name(n, self.source).unwrap_or_default();
                if !name.is_empty() {
                    self.push_class(n, &name);
                }
                self.containers.push(Container::Class(name));
            }
            SyntaxNode::Scope(n) => {
                let name = declaration_name(n, self.source).unwrap_or_default();
                self.containers.push(Container::Class(name));
            }
            SyntaxNode::Method(n) => {
                self.push_callable(n, false);
                self.containers.push(Container::Callable);
            }
            SyntaxNode::Constructor(n) => {
                self.push_callable(n, true);
                self.containers.push(Container::Callable);
            }
            SyntaxNode::Field(n) => self.push_fields(n),
            SyntaxNode::Invocation(_) | SyntaxNode::Other(_) => {}
        }
    }

    fn leave(&mut self, node: SyntaxNode<'t>) {
        if matches!(
            node,
            SyntaxNode::Class(_) | SyntaxNode::Scope(_) | SyntaxNode::Method(_) | SyntaxNode::Constructor(_)
        ) {
            self.containers.pop();
        }
    }
}

impl SymbolCollector<'_> {
    fn enclosing_class(&self) -> Option<&str> {
        match self.containers.last() {
            Some(Container::Class(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    fn push_class(&mut self, node: Node<'_>, name: &str) {
        // Go type specs start at the name; include the `type` keyword
        let outer = match node.parent() {
            Some(p) if p.kind() == "type_declaration" => p,
            _ => node,
        };

        let visibility = match self.language {
            Language::Java => modifiers_visibility(modifiers_text(node, self.source), self.language),
            Language::Python => fallback::python::visibility_of(name),
            Language::Go => fallback::go::visibility_of(name),
            Language::Rust => rust_visibility(node, self.source),
            _ => Visibility::Public,
        };
        let is_static = self.language == Language::Java
            && has_word(modifiers_text(node, self.source), "static");

        let symbol = self.symbol(outer, node, name, SymbolKind::Class, Vec::new(), None, visibility, is_static);
        self.symbols.push(symbol);
    }

    fn push_callable(&mut self, node: Node<'_>, is_constructor: bool) {
        let Some(name) = declaration_name(node, self.source) else {
            return;
        };
        let enclosing = self.enclosing_class().map(str::to_string);

        let kind = if is_constructor || enclosing.as_deref() == Some(name.as_str()) {
            SymbolKind::Constructor
        } else if enclosing.is_some() || node.kind() == "method_declaration" {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        };

        let details = match self.language {
            Language::Java => java_details(node, self.source),
            Language::JavaScript | Language::TypeScript => javascript_details(node, &name, self.source),
            Language::Python => python_details(node, &name, self.source),
            Language::Go => go_details(node, &name, self.source),
            Language::Rust => rust_details(node, enclosing.is_some(), self.source),
            Language::CSharp | Language::Unknown => CallableDetails::default(),
        };

        let mut parameters = details.parameters;
        if self.language == Language::Python
            && kind != SymbolKind::Function
            && parameters.first().is_some_and(|p| p.name == "self" || p.name == "cls")
        {
            parameters.remove(0);
        }

        // `const f = () => ..` spans the whole declaration statement
        let outer = match node.parent() {
            Some(p) if matches!(p.kind(), "lexical_declaration" | "variable_declaration") => p,
            _ => node,
        };

        let return_type = match kind {
            SymbolKind::Constructor => None,
            _ => details.return_type.filter(|t| !t.is_empty()),
        };

        let symbol = self.symbol(
            outer,
            node,
            &name,
            kind,
            parameters,
            return_type,
            details.visibility.unwrap_or_else(|| self.language.default_visibility()),
            details.is_static,
        );
        self.symbols.push(symbol);
    }

    /// Java field declarations; one symbol per declarator
    fn push_fields(&mut self, node: Node<'_>) {
        if self.enclosing_class().is_none() {
            return;
        }
        let modifiers = modifiers_text(node, self.source);
        let visibility = modifiers_visibility(modifiers, self.language);
        let is_static = has_word(modifiers, "static");
        let type_name = field_text(node, "type", self.source).map(str::to_string);

        let mut cursor = node.walk();
        let names: Vec<String> = node
            .children_by_field_name("declarator", &mut cursor)
            .filter_map(|d| field_text(d, "name", self.source))
            .map(str::to_string)
            .collect();

        for name in names {
            let symbol = self.symbol(
                node,
                node,
                &name,
                SymbolKind::Variable,
                Vec::new(),
                type_name.clone(),
                visibility,
                is_static,
            );
            self.symbols.push(symbol);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn symbol(
        &self,
        outer: Node<'_>,
        node: Node<'_>,
        name: &str,
        kind: SymbolKind,
        parameters: Vec<Parameter>,
        return_type: Option<String>,
        visibility: Visibility,
        is_static: bool,
    ) -> Symbol {
        let start = outer.start_byte();
        let end = outer.end_byte().max(node.end_byte());
        let header_end = body_start(node).unwrap_or(end).clamp(start, end);
        let header = self.source.get(start..header_end).unwrap_or("");

        let start_line = outer.start_position().row + 1;
        let end_line = (outer.end_position().row.max(node.end_position().row) + 1).max(start_line);

        Symbol {
            name: name.to_string(),
            kind,
            file: self.file_path.to_string(),
            language: self.language,
            start_line,
            end_line,
            signature: render_signature(header.trim_end().trim_end_matches(';')),
            return_type,
            parameters,
            visibility,
            is_static,
            raw_code: self.source.get(start..end).unwrap_or("").to_string(),
        }
    }
}

struct CallCollector<'s> {
    language: Language,
    source: &'s str,
    file_path: &'s str,
    known: HashSet<&'s str>,
    edges: Vec<CallEdge>,
}

impl<'t> SyntaxVisitor<'t> for CallCollector<'_> {
    fn enter(&mut self, node: SyntaxNode<'t>) {
        let SyntaxNode::Invocation(n) = node else {
            return;
        };

        let callee = match n.kind() {
            "method_invocation" => field_text(n, "name", self.source),
            _ => n
                .child_by_field_name("function")
                .and_then(|f| callee_name(f, self.source)),
        };
        let Some(callee) = callee else {
            return;
        };
        if !self.known.contains(callee) {
            return;
        }

        let Some(caller) = self.enclosing_callable(n) else {
            return;
        };
        if caller == callee {
            return;
        }

        self.edges.push(CallEdge {
            caller,
            callee: callee.to_string(),
            file: self.file_path.to_string(),
            line: n.start_position().row + 1,
        });
    }
}

impl CallCollector<'_> {
    /// Name of the nearest callable ancestor; class bodies stop the search
    fn enclosing_callable(&self, node: Node<'_>) -> Option<String> {
        let mut current = node.parent();
        while let Some(parent) = current {
            match SyntaxNode::classify(self.language, parent, self.source) {
                SyntaxNode::Method(n) | SyntaxNode::Constructor(n) => {
                    return declaration_name(n, self.source);
                }
                SyntaxNode::Class(_) => return None,
                _ => current = parent.parent(),
            }
        }
        None
    }
}

/// The identifier a call expression invokes, e.g. `save` in `repo.save(x)`
fn callee_name<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    match node.kind() {
        "identifier" | "field_identifier" | "property_identifier" | "private_property_identifier" => {
            Some(text(node, source))
        }
        "member_expression" => field_text(node, "property", source),
        "attribute" => field_text(node, "attribute", source),
        "selector_expression" | "field_expression" => field_text(node, "field", source),
        "scoped_identifier" => field_text(node, "name", source),
        "generic_function" => callee_name(node.child_by_field_name("function")?, source),
        _ => None,
    }
}

/// Declared name of a class, callable or scope node
fn declaration_name(node: Node<'_>, source: &str) -> Option<String> {
    let name = match node.kind() {
        // `impl<T> Repo<T>` scopes methods of `Repo`
        "impl_item" => {
            let ty = field_text(node, "type", source)?;
            ty.split('<').next().unwrap_or(ty).rsplit("::").next().unwrap_or(ty)
        }
        _ => field_text(node, "name", source)?,
    };
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Where the body of a declaration starts, if it has one
fn body_start(node: Node<'_>) -> Option<usize> {
    if node.kind() == "variable_declarator" {
        let value = node.child_by_field_name("value")?;
        return value.child_by_field_name("body").map(|b| b.start_byte());
    }
    if let Some(body) = node.child_by_field_name("body") {
        return Some(body.start_byte());
    }
    // Go type specs carry the body inside the struct/interface type
    let ty = node.child_by_field_name("type")?;
    let mut cursor = ty.walk();
    let body = ty
        .children(&mut cursor)
        .find(|c| matches!(c.kind(), "field_declaration_list" | "{"));
    body.map(|b| b.start_byte())
}

#[derive(Debug, Default)]
struct CallableDetails {
    parameters: Vec<Parameter>,
    return_type: Option<String>,
    visibility: Option<Visibility>,
    is_static: bool,
}

fn java_details(node: Node<'_>, source: &str) -> CallableDetails {
    let modifiers = modifiers_text(node, source);

    let mut parameters = Vec::new();
    if let Some(list) = node.child_by_field_name("parameters") {
        let mut cursor = list.walk();
        for param in list.named_children(&mut cursor) {
            match param.kind() {
                "formal_parameter" => {
                    if let (Some(name), Some(ty)) =
                        (field_text(param, "name", source), field_text(param, "type", source))
                    {
                        parameters.push(Parameter::new(name, ty));
                    }
                }
                "spread_parameter" => parameters.extend(parse_parameter(text(param, source))),
                _ => {}
            }
        }
    }

    CallableDetails {
        parameters,
        return_type: field_text(node, "type", source).map(str::to_string),
        visibility: modifiers.split_whitespace().find_map(Visibility::from_modifier),
        is_static: has_word(modifiers, "static"),
    }
}

fn javascript_details(node: Node<'_>, name: &str, source: &str) -> CallableDetails {
    // Arrow functions and function expressions keep their parts on the value
    let function = match node.kind() {
        "variable_declarator" => node.child_by_field_name("value").unwrap_or(node),
        _ => node,
    };

    let mut parameters = Vec::new();
    if let Some(list) = function.child_by_field_name("parameters") {
        let mut cursor = list.walk();
        for param in list.named_children(&mut cursor) {
            if let Some(p) = javascript_parameter(param, source) {
                parameters.push(p);
            }
        }
    } else if let Some(single) = function.child_by_field_name("parameter") {
        parameters.push(Parameter::new(text(single, source), ""));
    }

    let mut visibility = name.starts_with('#').then_some(Visibility::Private);
    let mut is_static = false;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "static" => is_static = true,
            "accessibility_modifier" => {
                visibility = visibility.or_else(|| Visibility::from_modifier(text(child, source)));
            }
            _ => {}
        }
    }

    CallableDetails {
        parameters,
        return_type: field_text(function, "return_type", source).map(strip_type_annotation),
        visibility,
        is_static,
    }
}

fn javascript_parameter(param: Node<'_>, source: &str) -> Option<Parameter> {
    match param.kind() {
        "comment" => None,
        "identifier" => Some(Parameter::new(text(param, source), "")),
        "assignment_pattern" => Some(Parameter::new(field_text(param, "left", source)?, "")),
        // TypeScript
        "required_parameter" | "optional_parameter" => Some(Parameter::new(
            field_text(param, "pattern", source)?,
            field_text(param, "type", source)
                .map(strip_type_annotation)
                .unwrap_or_default(),
        )),
        _ => Some(Parameter::new(text(param, source), "")),
    }
}

fn python_details(node: Node<'_>, name: &str, source: &str) -> CallableDetails {
    let mut parameters = Vec::new();
    if let Some(list) = node.child_by_field_name("parameters") {
        let mut cursor = list.walk();
        for param in list.named_children(&mut cursor) {
            let parameter = match param.kind() {
                "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                    Some(Parameter::new(text(param, source), ""))
                }
                "typed_parameter" => param.named_child(0).map(|n| {
                    Parameter::new(
                        text(n, source),
                        field_text(param, "type", source).unwrap_or(""),
                    )
                }),
                "default_parameter" | "typed_default_parameter" => {
                    field_text(param, "name", source).map(|n| {
                        Parameter::new(n, field_text(param, "type", source).unwrap_or(""))
                    })
                }
                _ => None,
            };
            parameters.extend(parameter);
        }
    }

    let is_static = node.parent().is_some_and(|p| {
        p.kind() == "decorated_definition" && {
            let mut cursor = p.walk();
            let found = p
                .children(&mut cursor)
                .filter(|c| c.kind() == "decorator")
                .any(|d| text(d, source).trim_start_matches('@').trim().starts_with("staticmethod"));
            found
        }
    });

    CallableDetails {
        parameters,
        return_type: field_text(node, "return_type", source).map(str::to_string),
        visibility: Some(fallback::python::visibility_of(name)),
        is_static,
    }
}

fn go_details(node: Node<'_>, name: &str, source: &str) -> CallableDetails {
    let mut parameters = Vec::new();
    if let Some(list) = node.child_by_field_name("parameters") {
        let mut cursor = list.walk();
        for param in list.named_children(&mut cursor) {
            let ty = field_text(param, "type", source).unwrap_or("");
            let ty = match param.kind() {
                "variadic_parameter_declaration" => format!("...{}", ty),
                "parameter_declaration" => ty.to_string(),
                _ => continue,
            };

            let mut names_cursor = param.walk();
            let names: Vec<&str> = param
                .children_by_field_name("name", &mut names_cursor)
                .map(|n| text(n, source))
                .collect();
            if names.is_empty() {
                parameters.push(Parameter::new("", ty));
            } else {
                parameters.extend(names.into_iter().map(|n| Parameter::new(n, ty.clone())));
            }
        }
    }

    CallableDetails {
        parameters,
        return_type: field_text(node, "result", source).map(str::to_string),
        visibility: Some(fallback::go::visibility_of(name)),
        is_static: false,
    }
}

fn rust_details(node: Node<'_>, in_scope: bool, source: &str) -> CallableDetails {
    let mut parameters = Vec::new();
    let mut has_self = false;
    if let Some(list) = node.child_by_field_name("parameters") {
        let mut cursor = list.walk();
        for param in list.named_children(&mut cursor) {
            match param.kind() {
                "self_parameter" => has_self = true,
                "parameter" => {
                    let pattern = field_text(param, "pattern", source).unwrap_or("");
                    let pattern = pattern.trim_start_matches("mut ").trim();
                    parameters.push(Parameter::new(
                        pattern,
                        field_text(param, "type", source).unwrap_or(""),
                    ));
                }
                _ => {}
            }
        }
    }

    CallableDetails {
        parameters,
        return_type: field_text(node, "return_type", source).map(str::to_string),
        visibility: Some(rust_visibility(node, source)),
        is_static: in_scope && !has_self,
    }
}

/// `pub` is public, restricted `pub(..)` is crate-level, none is private
fn rust_visibility(node: Node<'_>, source: &str) -> Visibility {
    let mut cursor = node.walk();
    let modifier = node
        .children(&mut cursor)
        .find(|c| c.kind() == "visibility_modifier")
        .map(|c| text(c, source).trim().to_string());
    match modifier.as_deref() {
        Some("pub") => Visibility::Public,
        Some(_) => Visibility::Package,
        None => Visibility::Private,
    }
}

/// Text of the unnamed `modifiers` child of a Java declaration
fn modifiers_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    let mut cursor = node.walk();
    let modifiers = node.children(&mut cursor).find(|c| c.kind() == "modifiers");
    modifiers.map_or("", |m| text(m, source))
}

fn modifiers_visibility(modifiers: &str, language: Language) -> Visibility {
    modifiers
        .split_whitespace()
        .find_map(Visibility::from_modifier)
        .unwrap_or_else(|| language.default_visibility())
}

fn has_word(text: &str, word: &str) -> bool {
    text.split_whitespace().any(|w| w == word)
}

/// `: Promise<T>` -> `Promise<T>`
fn strip_type_annotation(annotation: &str) -> String {
    annotation.trim().trim_start_matches(':').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ParserEngine {
        ParserEngine::initialize(&Language::ALL).unwrap()
    }

    fn symbols(source: &str, path: &str, language: Language) -> Vec<Symbol> {
        extract_symbols(&engine(), source, path, language).unwrap().symbols
    }

    const ORDER_SERVICE: &str = r#"package shop;

public class OrderService {
    private final Repository repository;

    public OrderService(Repository repository) {
        this.repository = repository;
    }

    @Override
    public String process(String input, int retries) {
        validate(input);
        return input.trim();
    }

    private static boolean validate(String input) {
        return input != null;
    }
}
"#;

    #[test]
    fn test_java_symbols() {
        let symbols = symbols(ORDER_SERVICE, "OrderService.java", Language::Java);
        let summary: Vec<(&str, SymbolKind, usize, usize)> = symbols
            .iter()
            .map(|s| (s.name.as_str(), s.kind, s.start_line, s.end_line))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("OrderService", SymbolKind::Class, 3, 19),
                ("repository", SymbolKind::Variable, 4, 4),
                ("OrderService", SymbolKind::Constructor, 6, 8),
                ("process", SymbolKind::Method, 10, 14),
                ("validate", SymbolKind::Method, 16, 18),
            ]
        );

        let process = &symbols[3];
        assert_eq!(process.signature, "public String process(String input, int retries)");
        assert_eq!(process.return_type.as_deref(), Some("String"));
        assert_eq!(
            process.parameters,
            vec![Parameter::new("input", "String"), Parameter::new("retries", "int")]
        );
        assert_eq!(process.visibility, Visibility::Public);

        let validate = &symbols[4];
        assert!(validate.is_static);
        assert_eq!(validate.visibility, Visibility::Private);
        assert_eq!(symbols[2].return_type, None);
    }

    #[test]
    fn test_java_calls() {
        let engine = engine();
        let found = extract_symbols(&engine, ORDER_SERVICE, "OrderService.java", Language::Java)
            .unwrap()
            .symbols;
        let calls = extract_calls(&engine, ORDER_SERVICE, "OrderService.java", Language::Java, &found).unwrap();

        assert_eq!(
            calls,
            vec![CallEdge {
                caller: "process".to_string(),
                callee: "validate".to_string(),
                file: "OrderService.java".to_string(),
                line: 12,
            }]
        );
    }

    #[test]
    fn test_typescript_symbols() {
        let source = "export class Repo {\n  constructor(private db: Db) {}\n\n  private find(id: string): Item {\n    return this.db.get(id);\n  }\n}\n\nexport const load = async (path: string): Promise<void> => {\n  await read(path);\n};\n";
        let symbols = symbols(source, "repo.ts", Language::TypeScript);

        let ctor = symbols.iter().find(|s| s.name == "constructor").unwrap();
        assert_eq!(ctor.kind, SymbolKind::Constructor);

        let find = symbols.iter().find(|s| s.name == "find").unwrap();
        assert_eq!(find.kind, SymbolKind::Method);
        assert_eq!(find.visibility, Visibility::Private);
        assert_eq!(find.return_type.as_deref(), Some("Item"));
        assert_eq!(find.parameters, vec![Parameter::new("id", "string")]);

        let load = symbols.iter().find(|s| s.name == "load").unwrap();
        assert_eq!(load.kind, SymbolKind::Function);
        assert_eq!((load.start_line, load.end_line), (9, 11));
        assert_eq!(load.return_type.as_deref(), Some("Promise<void>"));
    }

    #[test]
    fn test_python_symbols_and_calls() {
        let source = "class Cart:\n    def __init__(self, items):\n        self.items = items\n\n    @staticmethod\n    def empty():\n        return Cart([])\n\n    def total(self, tax: float = 0.0) -> float:\n        return self.subtotal() * (1 + tax)\n\n    def subtotal(self):\n        return sum(self.items)\n";
        let engine = engine();
        let found = extract_symbols(&engine, source, "cart.py", Language::Python).unwrap().symbols;

        let init = found.iter().find(|s| s.name == "__init__").unwrap();
        assert_eq!(init.kind, SymbolKind::Constructor);
        assert_eq!(init.parameters, vec![Parameter::new("items", "")]);

        let empty = found.iter().find(|s| s.name == "empty").unwrap();
        assert!(empty.is_static);
        assert_eq!(empty.start_line, 6);

        let total = found.iter().find(|s| s.name == "total").unwrap();
        assert_eq!(total.parameters, vec![Parameter::new("tax", "float")]);
        assert_eq!(total.return_type.as_deref(), Some("float"));

        let calls = extract_calls(&engine, source, "cart.py", Language::Python, &found).unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!((calls[0].caller.as_str(), calls[0].callee.as_str()), ("total", "subtotal"));
        assert_eq!(calls[0].line, 10);
    }

    #[test]
    fn test_go_symbols() {
        let source = "package store\n\ntype Cache struct {\n\titems map[string]int\n}\n\nfunc (c *Cache) Get(key string) (int, bool) {\n\treturn c.lookup(key)\n}\n\nfunc merge(a, b []int) []int {\n\treturn append(a, b...)\n}\n";
        let engine = engine();
        let found = extract_symbols(&engine, source, "cache.go", Language::Go).unwrap().symbols;

        let cache = &found[0];
        assert_eq!((cache.name.as_str(), cache.kind, cache.start_line), ("Cache", SymbolKind::Class, 3));
        assert_eq!(cache.signature, "type Cache struct");

        let get = found.iter().find(|s| s.name == "Get").unwrap();
        assert_eq!(get.kind, SymbolKind::Method);
        assert_eq!(get.visibility, Visibility::Public);
        assert_eq!(get.return_type.as_deref(), Some("(int, bool)"));

        let merge = found.iter().find(|s| s.name == "merge").unwrap();
        assert_eq!(merge.kind, SymbolKind::Function);
        assert_eq!(merge.visibility, Visibility::Package);
        assert_eq!(
            merge.parameters,
            vec![Parameter::new("a", "[]int"), Parameter::new("b", "[]int")]
        );
    }

    #[test]
    fn test_rust_symbols_and_calls() {
        let source = "pub struct Counter {\n    value: u64,\n}\n\nimpl Counter {\n    pub fn new() -> Self {\n        Self { value: 0 }\n    }\n\n    pub(crate) fn bump(&mut self, by: u64) -> u64 {\n        self.value += by;\n        helper(self.value)\n    }\n}\n\nfn helper(v: u64) -> u64 {\n    v\n}\n";
        let engine = engine();
        let found = extract_symbols(&engine, source, "counter.rs", Language::Rust).unwrap().symbols;

        let new = found.iter().find(|s| s.name == "new").unwrap();
        assert_eq!(new.kind, SymbolKind::Method);
        assert!(new.is_static);

        let bump = found.iter().find(|s| s.name == "bump").unwrap();
        assert!(!bump.is_static);
        assert_eq!(bump.visibility, Visibility::Package);
        assert_eq!(bump.parameters, vec![Parameter::new("by", "u64")]);

        let helper = found.iter().find(|s| s.name == "helper").unwrap();
        assert_eq!(helper.kind, SymbolKind::Function);
        assert_eq!(helper.visibility, Visibility::Private);

        let calls = extract_calls(&engine, source, "counter.rs", Language::Rust, &found).unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!((calls[0].caller.as_str(), calls[0].callee.as_str()), ("bump", "helper"));
    }

    #[test]
    fn test_self_calls_and_unknown_callees_are_dropped() {
        let source = "function walk(n) {\n  if (n > 0) walk(n - 1);\n  console.log(n);\n}\n";
        let engine = engine();
        let found = extract_symbols(&engine, source, "walk.js", Language::JavaScript).unwrap().symbols;
        let calls = extract_calls(&engine, source, "walk.js", Language::JavaScript, &found).unwrap();
        assert!(calls.is_empty());
    }

    #[test]
    fn test_malformed_input_reports_errors() {
        let result = extract_symbols(&engine(), "class {{{ void (", "Broken.java", Language::Java).unwrap();
        assert!(result.has_errors);
    }
}
