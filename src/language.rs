// Language detection

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::index::Visibility;

/// Languages the extractor knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    CSharp,
    JavaScript,
    TypeScript,
    Python,
    Go,
    Rust,
    Unknown,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::Java,
        Language::CSharp,
        Language::JavaScript,
        Language::TypeScript,
        Language::Python,
        Language::Go,
        Language::Rust,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::CSharp => "csharp",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Unknown => "unknown",
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Java => &["java"],
            Language::CSharp => &["cs"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::TypeScript => &["ts", "tsx", "mts", "cts"],
            Language::Python => &["py", "pyi"],
            Language::Go => &["go"],
            Language::Rust => &["rs"],
            Language::Unknown => &[],
        }
    }

    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.extensions().contains(&ext.as_str()))
            .unwrap_or(Language::Unknown)
    }

    /// Visibility a declaration gets when it carries no modifier
    pub fn default_visibility(&self) -> Visibility {
        match self {
            Language::Java | Language::Go => Visibility::Package,
            Language::CSharp | Language::Rust => Visibility::Private,
            Language::JavaScript | Language::TypeScript | Language::Python | Language::Unknown => {
                Visibility::Public
            }
        }
    }

    pub fn is_indentation_based(&self) -> bool {
        matches!(self, Language::Python)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "java" => Ok(Language::Java),
            "csharp" | "c#" | "cs" => Ok(Language::CSharp),
            "javascript" | "js" => Ok(Language::JavaScript),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "python" | "py" => Ok(Language::Python),
            "go" => Ok(Language::Go),
            "rust" | "rs" => Ok(Language::Rust),
            "unknown" => Ok(Language::Unknown),
            _ => anyhow::bail!("Unknown language: {}", s),
        }
    }
}

/// Detect the language of a file from its path.
///
/// The content is accepted for future disambiguation (e.g. `.h` files) but
/// is not consulted; unknown extensions map to [`Language::Unknown`].
pub fn detect_language(file_path: &str, _content: Option<&str>) -> Language {
    Path::new(file_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(Language::from_extension)
        .unwrap_or(Language::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(detect_language("src/Main.java", None), Language::Java);
        assert_eq!(detect_language("app/Program.cs", None), Language::CSharp);
        assert_eq!(detect_language("web/index.jsx", None), Language::JavaScript);
        assert_eq!(detect_language("web/app.tsx", None), Language::TypeScript);
        assert_eq!(detect_language("tools/run.py", None), Language::Python);
        assert_eq!(detect_language("cmd/main.go", None), Language::Go);
        assert_eq!(detect_language("src/lib.rs", None), Language::Rust);
    }

    #[test]
    fn test_detect_is_case_insensitive() {
        assert_eq!(detect_language("LEGACY/OLD.JAVA", None), Language::Java);
    }

    #[test]
    fn test_unknown_extension_does_not_fail() {
        assert_eq!(detect_language("README.md", None), Language::Unknown);
        assert_eq!(detect_language("Makefile", None), Language::Unknown);
    }

    #[test]
    fn test_content_is_ignored() {
        let content = "#!/usr/bin/env python\nprint('hi')\n";
        assert_eq!(detect_language("script", Some(content)), Language::Unknown);
    }

    #[test]
    fn test_round_trip_names() {
        for lang in Language::ALL {
            assert_eq!(lang.as_str().parse::<Language>().unwrap(), lang);
        }
    }
}
