// Language-neutral view of syntax tree nodes

use tree_sitter::Node;

use crate::language::Language;

/// The node categories extraction cares about.
///
/// Each language maps its own node kinds onto these; everything else is
/// `Other` and only walked through.
#[derive(Debug, Clone, Copy)]
pub enum SyntaxNode<'t> {
    /// Class-like type declaration (class, interface, struct, enum, trait)
    Class(Node<'t>),
    /// Method or free function declaration
    Method(Node<'t>),
    Constructor(Node<'t>),
    /// Field declaration inside a class body
    Field(Node<'t>),
    /// A call site
    Invocation(Node<'t>),
    /// A container that scopes methods without being a symbol (Rust `impl`)
    Scope(Node<'t>),
    Other(Node<'t>),
}

impl<'t> SyntaxNode<'t> {
    pub fn classify(language: Language, node: Node<'t>, source: &str) -> Self {
        match language {
            Language::Java => classify_java(node),
            Language::JavaScript | Language::TypeScript => classify_javascript(node, source),
            Language::Python => classify_python(node, source),
            Language::Go => classify_go(node),
            Language::Rust => classify_rust(node),
            Language::CSharp | Language::Unknown => SyntaxNode::Other(node),
        }
    }

    pub fn node(&self) -> Node<'t> {
        match *self {
            SyntaxNode::Class(n)
            | SyntaxNode::Method(n)
            | SyntaxNode::Constructor(n)
            | SyntaxNode::Field(n)
            | SyntaxNode::Invocation(n)
            | SyntaxNode::Scope(n)
            | SyntaxNode::Other(n) => n,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, SyntaxNode::Method(_) | SyntaxNode::Constructor(_))
    }
}

fn classify_java(node: Node<'_>) -> SyntaxNode<'_> {
    match node.kind() {
        "class_declaration" | "interface_declaration" | "enum_declaration" | "record_declaration" => {
            SyntaxNode::Class(node)
        }
        "method_declaration" => SyntaxNode::Method(node),
        "constructor_declaration" | "compact_constructor_declaration" => SyntaxNode::Constructor(node),
        "field_declaration" => SyntaxNode::Field(node),
        "method_invocation" => SyntaxNode::Invocation(node),
        _ => SyntaxNode::Other(node),
    }
}

fn classify_javascript<'t>(node: Node<'t>, source: &str) -> SyntaxNode<'t> {
    match node.kind() {
        "class_declaration" | "abstract_class_declaration" | "interface_declaration" => {
            SyntaxNode::Class(node)
        }
        "method_definition" => match field_text(node, "name", source) {
            Some("constructor") => SyntaxNode::Constructor(node),
            _ => SyntaxNode::Method(node),
        },
        "function_declaration" | "generator_function_declaration" => SyntaxNode::Method(node),
        // `const f = (..) => ..` and `const f = function (..) {..}`
        "variable_declarator" => match node.child_by_field_name("value").map(|v| v.kind()) {
            Some("arrow_function" | "function_expression" | "function") => SyntaxNode::Method(node),
            _ => SyntaxNode::Other(node),
        },
        "call_expression" => SyntaxNode::Invocation(node),
        _ => SyntaxNode::Other(node),
    }
}

fn classify_python<'t>(node: Node<'t>, source: &str) -> SyntaxNode<'t> {
    match node.kind() {
        "class_definition" => SyntaxNode::Class(node),
        "function_definition" => match field_text(node, "name", source) {
            Some("__init__") => SyntaxNode::Constructor(node),
            _ => SyntaxNode::Method(node),
        },
        "call" => SyntaxNode::Invocation(node),
        _ => SyntaxNode::Other(node),
    }
}

fn classify_go(node: Node<'_>) -> SyntaxNode<'_> {
    match node.kind() {
        "type_spec" => match node.child_by_field_name("type").map(|t| t.kind()) {
            Some("struct_type" | "interface_type") => SyntaxNode::Class(node),
            _ => SyntaxNode::Other(node),
        },
        "function_declaration" | "method_declaration" => SyntaxNode::Method(node),
        "call_expression" => SyntaxNode::Invocation(node),
        _ => SyntaxNode::Other(node),
    }
}

fn classify_rust(node: Node<'_>) -> SyntaxNode<'_> {
    match node.kind() {
        "struct_item" | "enum_item" | "trait_item" | "union_item" => SyntaxNode::Class(node),
        "impl_item" => SyntaxNode::Scope(node),
        "function_item" => SyntaxNode::Method(node),
        "call_expression" => SyntaxNode::Invocation(node),
        _ => SyntaxNode::Other(node),
    }
}

/// Source text of a node
pub fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.byte_range()).unwrap_or("")
}

/// Source text of a named field of `node`
pub fn field_text<'s>(node: Node<'_>, field: &str, source: &'s str) -> Option<&'s str> {
    node.child_by_field_name(field).map(|n| text(n, source))
}

/// Hooks called while walking a tree depth-first
pub trait SyntaxVisitor<'t> {
    fn enter(&mut self, node: SyntaxNode<'t>);

    fn leave(&mut self, _node: SyntaxNode<'t>) {}
}

/// Walk the subtree under `root` depth-first with an explicit cursor, so
/// deeply nested input cannot exhaust the call stack.
pub fn walk<'t, V: SyntaxVisitor<'t>>(language: Language, root: Node<'t>, source: &str, visitor: &mut V) {
    let mut cursor = root.walk();
    let mut open: Vec<SyntaxNode<'t>> = Vec::new();

    loop {
        let node = SyntaxNode::classify(language, cursor.node(), source);
        visitor.enter(node);

        if cursor.goto_first_child() {
            open.push(node);
            continue;
        }
        visitor.leave(node);

        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
            if let Some(parent) = open.pop() {
                visitor.leave(parent);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::engine::ParserEngine;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        depth: i32,
        max_depth: i32,
    }

    impl<'t> SyntaxVisitor<'t> for Recorder {
        fn enter(&mut self, node: SyntaxNode<'t>) {
            self.depth += 1;
            self.max_depth = self.max_depth.max(self.depth);
            match node {
                SyntaxNode::Class(_) => self.events.push("class".to_string()),
                SyntaxNode::Method(_) => self.events.push("method".to_string()),
                SyntaxNode::Constructor(_) => self.events.push("ctor".to_string()),
                SyntaxNode::Field(_) => self.events.push("field".to_string()),
                SyntaxNode::Invocation(_) => self.events.push("call".to_string()),
                SyntaxNode::Scope(_) | SyntaxNode::Other(_) => {}
            }
        }

        fn leave(&mut self, node: SyntaxNode<'t>) {
            self.depth -= 1;
            if let SyntaxNode::Class(_) = node {
                self.events.push("/class".to_string());
            }
        }
    }

    #[test]
    fn test_walk_enter_and_leave_balance() {
        let source = "class A {\n  int n;\n  A() {}\n  void run() { go(); }\n}\nclass B {}\n";
        let engine = ParserEngine::initialize(&[Language::Java]).unwrap();
        let tree = engine.parse(source, Language::Java, "A.java").unwrap();

        let mut recorder = Recorder::default();
        walk(Language::Java, tree.root_node(), source, &mut recorder);

        assert_eq!(recorder.depth, 0);
        assert_eq!(
            recorder.events,
            vec!["class", "field", "ctor", "method", "call", "/class", "class", "/class"]
        );
    }

    #[test]
    fn test_python_init_is_constructor() {
        let source = "class A:\n    def __init__(self):\n        pass\n";
        let engine = ParserEngine::initialize(&[Language::Python]).unwrap();
        let tree = engine.parse(source, Language::Python, "a.py").unwrap();

        let mut recorder = Recorder::default();
        walk(Language::Python, tree.root_node(), source, &mut recorder);
        assert_eq!(recorder.events, vec!["class", "ctor", "/class"]);
    }
}
