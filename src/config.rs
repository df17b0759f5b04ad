// Configuration management for reviewgraph

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::language::Language;

pub const CONFIG_FILE_NAME: &str = ".reviewgraph.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub languages: LanguagesConfig,
    pub indexing: IndexingConfig,
    pub embedding: EmbeddingConfig,
    pub detection: DetectionConfig,
    pub performance: PerformanceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub root: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguagesConfig {
    pub enabled: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    pub exclude: Vec<String>,
    pub include: Vec<String>,
    /// Use tree-sitter grammars; off forces regex extraction
    pub structural_parsing: bool,
    pub snapshot_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    Hash,
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    /// Vector length; unset means the provider's default
    pub dimension: Option<usize>,
    pub host: String,
    pub model: String,
}

impl EmbeddingConfig {
    /// Configured dimension, or the default of the selected provider
    pub fn dimension(&self) -> usize {
        self.dimension.unwrap_or(match self.provider {
            EmbeddingProviderKind::Hash => crate::embedding::hash::DEFAULT_DIMENSION,
            EmbeddingProviderKind::Ollama => crate::embedding::ollama::DEFAULT_DIMENSION,
        })
    }
}

/// Similarity thresholds for duplicate detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Within-change pairs must score strictly above this
    pub report_threshold: f32,
    /// Scores strictly above this are exact matches
    pub exact_threshold: f32,
    /// Ceiling for pairs whose logic diverges
    pub divergence_cap: f32,
    /// Body-token overlap below this counts as divergent logic
    pub token_overlap_floor: f32,
    /// Cross-repository matches must score at least this
    pub cross_repo_threshold: f32,
    pub cross_repo_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    pub threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "unnamed-project".to_string(),
            root: ".".to_string(),
        }
    }
}

impl Default for LanguagesConfig {
    fn default() -> Self {
        Self {
            enabled: Language::ALL.iter().map(|l| l.as_str().to_string()).collect(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            exclude: vec![
                "target/".to_string(),
                "node_modules/".to_string(),
                "dist/".to_string(),
                "build/".to_string(),
                ".git/".to_string(),
                "*.min.js".to_string(),
            ],
            include: vec![],
            structural_parsing: true,
            snapshot_path: ".reviewgraph.db".to_string(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Hash,
            dimension: None,
            host: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            report_threshold: 0.8,
            exact_threshold: 0.95,
            divergence_cap: 0.94,
            token_overlap_floor: 0.7,
            cross_repo_threshold: 0.75,
            cross_repo_limit: 10,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self { threads: 4 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            languages: LanguagesConfig::default(),
            indexing: IndexingConfig::default(),
            embedding: EmbeddingConfig::default(),
            detection: DetectionConfig::default(),
            performance: PerformanceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from project directory.
    /// Looks for .reviewgraph.toml in the project root
    pub fn from_project_dir<P: AsRef<Path>>(project_dir: P) -> Self {
        let config_path = project_dir.as_ref().join(CONFIG_FILE_NAME);

        match Self::from_file(&config_path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {}", config_path.display());
                config
            }
            Err(e) => {
                tracing::debug!("Could not load config from {}: {}", config_path.display(), e);
                tracing::info!("Using default configuration");
                Self::default()
            }
        }
    }

    /// Snapshot location, relative paths resolved against `project_dir`
    pub fn snapshot_path(&self, project_dir: &Path) -> PathBuf {
        let path = Path::new(&self.indexing.snapshot_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            project_dir.join(path)
        }
    }

    /// Check if a file path should be indexed based on include/exclude patterns
    pub fn should_index_file(&self, file_path: &str) -> bool {
        if self
            .indexing
            .exclude
            .iter()
            .any(|pattern| matches_pattern(file_path, pattern))
        {
            return false;
        }

        if self.indexing.include.is_empty() {
            return true;
        }

        self.indexing
            .include
            .iter()
            .any(|pattern| matches_pattern(file_path, pattern))
    }

    /// Enabled languages that parse as known language names
    pub fn enabled_languages(&self) -> Vec<Language> {
        self.languages
            .enabled
            .iter()
            .filter_map(|name| name.parse::<Language>().ok())
            .filter(|lang| *lang != Language::Unknown)
            .collect()
    }

    /// Validate configuration values
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.project.name.is_empty() {
            return Err(anyhow::anyhow!("Project name cannot be empty"));
        }

        for lang in &self.languages.enabled {
            match lang.parse::<Language>() {
                Ok(Language::Unknown) | Err(_) => {
                    return Err(anyhow::anyhow!("Unsupported language: {}", lang));
                }
                Ok(_) => {}
            }
        }

        if self.indexing.snapshot_path.is_empty() {
            return Err(anyhow::anyhow!("Snapshot path cannot be empty"));
        }

        if self.embedding.dimension() == 0 {
            return Err(anyhow::anyhow!("Embedding dimension must be greater than 0"));
        }
        if self.embedding.provider == EmbeddingProviderKind::Ollama && self.embedding.model.is_empty() {
            return Err(anyhow::anyhow!("Ollama provider needs a model name"));
        }

        let d = &self.detection;
        for (name, value) in [
            ("report_threshold", d.report_threshold),
            ("exact_threshold", d.exact_threshold),
            ("divergence_cap", d.divergence_cap),
            ("token_overlap_floor", d.token_overlap_floor),
            ("cross_repo_threshold", d.cross_repo_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow::anyhow!("{} must be within [0, 1], got {}", name, value));
            }
        }
        if d.divergence_cap > d.exact_threshold {
            return Err(anyhow::anyhow!(
                "divergence_cap ({}) must not exceed exact_threshold ({})",
                d.divergence_cap,
                d.exact_threshold
            ));
        }
        if d.cross_repo_limit == 0 {
            return Err(anyhow::anyhow!("cross_repo_limit must be greater than 0"));
        }

        if self.performance.threads == 0 {
            return Err(anyhow::anyhow!("Thread count must be greater than 0"));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!("Invalid log level: {}", self.logging.level));
        }
        let valid_formats = ["compact", "pretty", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!("Invalid log format: {}", self.logging.format));
        }

        Ok(())
    }
}

/// Glob-ish matching: `dir/` matches a path segment, `*.ext` a file suffix,
/// `**/name/**` a nested directory, anything else a substring.
fn matches_pattern(file_path: &str, pattern: &str) -> bool {
    let file_path = file_path.replace('\\', "/");

    if let Some(dir) = pattern.strip_suffix('/') {
        file_path.starts_with(pattern) || file_path.contains(&format!("/{}/", dir))
    } else if let Some(suffix) = pattern.strip_prefix('*') {
        if suffix.contains('*') {
            // `*.test.*`: the middle part must appear in the file name
            let middle = suffix.trim_matches('*');
            file_name(&file_path).contains(middle)
        } else {
            file_path.ends_with(suffix)
        }
    } else if pattern.starts_with("**/") {
        let dir = pattern.trim_start_matches("**/").trim_end_matches("/**");
        file_path.starts_with(&format!("{}/", dir)) || file_path.contains(&format!("/{}/", dir))
    } else {
        file_path.contains(pattern)
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.project.name, "unnamed-project");
        assert!(config.languages.enabled.contains(&"python".to_string()));
        assert!(config.indexing.exclude.contains(&"target/".to_string()));
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Hash);
        assert!((config.detection.report_threshold - 0.8).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_should_index_file() {
        let config = Config::default();

        assert!(config.should_index_file("src/main.rs"));
        assert!(config.should_index_file("lib/utils.py"));
        assert!(config.should_index_file("src/test/OrderServiceTest.java"));

        assert!(!config.should_index_file("target/debug/build.rs"));
        assert!(!config.should_index_file("web/node_modules/package/file.js"));
        assert!(!config.should_index_file("static/app.min.js"));
    }

    #[test]
    fn test_include_patterns_restrict() {
        let mut config = Config::default();
        config.indexing.include = vec!["src/".to_string()];

        assert!(config.should_index_file("src/lib.rs"));
        assert!(!config.should_index_file("scripts/gen.py"));
    }

    #[test]
    fn test_pattern_matching() {
        assert!(matches_pattern("target/debug/file", "target/"));
        assert!(matches_pattern("src/target/file", "target/"));
        assert!(!matches_pattern("src/targeting.rs", "target/"));

        assert!(matches_pattern("test.py", "*.py"));
        assert!(!matches_pattern("test.rs", "*.py"));
        assert!(matches_pattern("web/app.test.js", "*.test.*"));

        assert!(matches_pattern("src/__tests__/test.py", "**/__tests__/**"));
    }

    #[test]
    fn test_enabled_languages() {
        let mut config = Config::default();
        config.languages.enabled = vec!["java".to_string(), "python".to_string()];
        assert_eq!(config.enabled_languages(), vec![Language::Java, Language::Python]);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[detection]\nreport_threshold = 0.85\nexact_threshold = 0.95\ndivergence_cap = 0.94\ntoken_overlap_floor = 0.7\ncross_repo_threshold = 0.75\ncross_repo_limit = 5\n",
        )
        .unwrap();

        let config = Config::from_project_dir(dir.path());
        assert_eq!(config.detection.cross_repo_limit, 5);
        assert_eq!(config.performance.threads, 4);
    }

    #[test]
    fn test_embedding_dimension_follows_provider() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[embedding]\nprovider = \"ollama\"\n").unwrap();

        let config = Config::from_project_dir(dir.path());
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Ollama);
        assert_eq!(config.embedding.model, "nomic-embed-text");
        assert_eq!(config.embedding.dimension(), 768);

        let mut config = Config::default();
        assert_eq!(config.embedding.dimension(), 256);
        config.embedding.provider = EmbeddingProviderKind::Ollama;
        config.embedding.dimension = Some(1024);
        assert_eq!(config.embedding.dimension(), 1024);
    }

    #[test]
    fn test_snapshot_path_resolution() {
        let config = Config::default();
        let path = config.snapshot_path(Path::new("/repo"));
        assert_eq!(path, PathBuf::from("/repo/.reviewgraph.db"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.project.name = "".to_string();
        assert!(config.validate().is_err());
        config.project.name = "test".to_string();

        config.languages.enabled = vec!["cobol".to_string()];
        assert!(config.validate().is_err());
        config.languages.enabled = vec!["python".to_string()];

        config.detection.report_threshold = 1.5;
        assert!(config.validate().is_err());
        config.detection.report_threshold = 0.8;

        config.detection.divergence_cap = 0.99;
        assert!(config.validate().is_err());
        config.detection.divergence_cap = 0.94;

        config.embedding.dimension = Some(0);
        assert!(config.validate().is_err());
        config.embedding.dimension = None;

        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());
        config.logging.level = "info".to_string();

        config.performance.threads = 0;
        assert!(config.validate().is_err());
    }
}
