// Pair exclusion rules, cheapest first

use crate::index::{Symbol, SymbolKind};

const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "spec", "testing"];

/// Why a pair is never compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    SameDeclaration,
    CrossLanguage,
    KindMismatch,
    TestAndProduction,
    DifferentContext,
    NotComparable,
}

/// The first rule that excludes `(a, b)`, or `None` when the pair should be
/// scored. Symmetric in its arguments.
pub fn exclusion(a: &Symbol, b: &Symbol) -> Option<Exclusion> {
    if !is_comparable(a) || !is_comparable(b) {
        return Some(Exclusion::NotComparable);
    }
    if a.file == b.file && a.name == b.name && a.signature == b.signature {
        return Some(Exclusion::SameDeclaration);
    }
    if a.language != b.language {
        return Some(Exclusion::CrossLanguage);
    }
    if a.kind != b.kind {
        return Some(Exclusion::KindMismatch);
    }

    let a_test = is_test_path(&a.file);
    let b_test = is_test_path(&b.file);
    if a_test != b_test {
        return Some(Exclusion::TestAndProduction);
    }
    if different_context(&a.file, a_test, &b.file, b_test) {
        return Some(Exclusion::DifferentContext);
    }
    None
}

/// Fields and variables are never duplicate candidates
pub fn is_comparable(symbol: &Symbol) -> bool {
    symbol.kind != SymbolKind::Variable
}

/// Whether `path` lives in a test directory or has a test file name
pub fn is_test_path(path: &str) -> bool {
    let path = path.replace('\\', "/");
    let mut segments: Vec<&str> = path.split('/').collect();
    let file_name = segments.pop().unwrap_or("");

    if segments
        .iter()
        .any(|s| TEST_DIRS.iter().any(|d| s.eq_ignore_ascii_case(d)))
    {
        return true;
    }

    let stem = file_name.split('.').next().unwrap_or(file_name);
    stem.ends_with("Test")
        || stem.ends_with("Tests")
        || stem.ends_with("_test")
        || stem.starts_with("test_")
        || file_name.contains(".test.")
        || file_name.contains(".spec.")
}

/// Production service or controller code against a path that merely
/// mentions tests, such as fixtures and helpers outside test directories
fn different_context(a: &str, a_test: bool, b: &str, b_test: bool) -> bool {
    let is_service = |p: &str| {
        let p = p.to_lowercase();
        p.contains("service") || p.contains("controller")
    };
    let mentions_test = |p: &str| p.to_lowercase().contains("test");

    (is_service(a) && !a_test && mentions_test(b)) || (is_service(b) && !b_test && mentions_test(a))
}
