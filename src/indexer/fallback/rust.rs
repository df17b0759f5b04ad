// Rust patterns

use once_cell::sync::Lazy;
use regex::Regex;

use super::{body_end, body_opener, line_end_offset, trim_start, Declaration, Quotes};
use crate::index::{SymbolKind, Visibility};
use crate::indexer::text::{line_at, parse_parameter, split_top_level};

static TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?P<vis>pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait|union)\s+(?P<name>[A-Za-z_]\w*)").unwrap()
});

static IMPL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:unsafe\s+)?impl(?:<[^{]*?>)?\s+(?:[\w:<>, ']+?\s+for\s+)?(?P<name>[A-Za-z_][\w:]*)").unwrap()
});

static FN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^[ \t]*(?P<vis>pub(?:\([^)]*\))?\s+)?(?:(?:const|async|unsafe|extern\s+"[^"]*")\s+)*fn\s+(?P<name>[A-Za-z_]\w*)\s*(?:<[^{(]*?>)?\s*\((?P<params>[^)]*)\)\s*(?:->\s*(?P<ret>[^{;]+?))?\s*(?:where\s[^{;]*)?\{"#).unwrap()
});

pub(super) fn scan(source: &str) -> Vec<Declaration> {
    let quotes = Quotes::CharLiterals;
    let mut declarations = Vec::new();

    for caps in TYPE_RE.captures_iter(source) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
            continue;
        };
        let start = trim_start(source, whole.start());
        // Unit and tuple structs end with `;` on the same line
        let (header_end, end) = match body_opener(source, name.end()) {
            Some(open) => (open, body_end(source, start, open, quotes)),
            None => (name.end(), line_end_offset(source, line_at(source, name.end()))),
        };

        declarations.push(Declaration {
            name: name.as_str().to_string(),
            kind: SymbolKind::Class,
            start,
            header_end,
            end,
            parameters: Vec::new(),
            return_type: None,
            visibility: visibility_of(caps.name("vis").map(|m| m.as_str())),
            is_static: false,
        });
    }

    // impl blocks only scope methods; they are not symbols themselves
    let impl_spans: Vec<(usize, usize)> = IMPL_RE
        .captures_iter(source)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let open = body_opener(source, whole.end())?;
            Some((open, body_end(source, whole.start(), open, quotes)))
        })
        .collect();

    let mut functions: Vec<Declaration> = Vec::new();

    for caps in FN_RE.captures_iter(source) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.name("name")) else {
            continue;
        };
        let start = trim_start(source, whole.start());
        let open = whole.end() - 1;

        let in_impl = impl_spans.iter().any(|(s, e)| start > *s && start < *e)
            || declarations
                .iter()
                .any(|d| d.kind == SymbolKind::Class && d.contains(start));
        let nested = functions.iter().any(|f| f.contains(start));

        let pieces = split_top_level(caps.name("params").map_or("", |m| m.as_str()));
        let has_self = pieces.first().is_some_and(|p| is_self_param(p));
        let parameters = pieces
            .into_iter()
            .skip(usize::from(has_self))
            .filter_map(parse_parameter)
            .collect();

        let method = in_impl && !nested;
        functions.push(Declaration {
            name: name.as_str().to_string(),
            kind: if method {
                SymbolKind::Method
            } else {
                SymbolKind::Function
            },
            start,
            header_end: open,
            end: body_end(source, start, open, quotes),
            parameters,
            return_type: caps.name("ret").map(|m| m.as_str().trim().to_string()),
            visibility: visibility_of(caps.name("vis").map(|m| m.as_str())),
            is_static: method && !has_self,
        });
    }

    declarations.extend(functions);
    declarations
}

/// `self`, `&self`, `&'a mut self`, `self: &Self`
fn is_self_param(piece: &str) -> bool {
    let head = piece.split(':').next().unwrap_or(piece);
    head.split(|c: char| c.is_whitespace() || c == '&')
        .filter(|t| !t.is_empty() && *t != "mut" && !t.starts_with('\''))
        .eq(["self"])
}

fn visibility_of(vis: Option<&str>) -> Visibility {
    match vis {
        Some(v) if v.trim() == "pub" => Visibility::Public,
        // pub(crate), pub(super), pub(in path)
        Some(_) => Visibility::Package,
        None => Visibility::Private,
    }
}
